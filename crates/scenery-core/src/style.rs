//! Opaque cell style.
//!
//! A style is stored as the raw string the caller provided, for example
//! `"rounded;fillColor=#fff;strokeWidth=2"`. Entries are separated by `;`.
//! An entry without `=` names a stylesheet entry, an entry with `=` sets a
//! key. The model never interprets styles; resolution is the renderer's job.
//! The accessors below are convenience lookups only.

use std::fmt;

/// Raw `;`-separated style string of a cell.
///
/// # Examples
///
/// ```
/// use scenery_core::style::Style;
///
/// let style = Style::new("rounded;fillColor=#fff");
/// assert_eq!(style.value_of("fillColor"), Some("#fff"));
/// assert_eq!(style.names().collect::<Vec<_>>(), vec!["rounded"]);
///
/// let updated = style.with("fillColor", "red");
/// assert_eq!(updated.as_str(), "rounded;fillColor=red");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Style(String);

impl Style {
    pub fn new(style: impl Into<String>) -> Self {
        Self(style.into())
    }

    /// Returns the raw style string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value of the last `key=value` entry for `key`.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.entries()
            .filter_map(|entry| entry.split_once('='))
            .filter(|(k, _)| k.trim() == key)
            .map(|(_, v)| v.trim())
            .last()
    }

    /// Returns the named stylesheet entries, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries()
            .filter(|entry| !entry.contains('='))
            .map(str::trim)
    }

    /// Returns a copy with `key` set to `value`, replacing existing entries for `key`.
    pub fn with(&self, key: &str, value: &str) -> Self {
        let mut entries: Vec<String> = self
            .entries()
            .filter(|entry| {
                entry
                    .split_once('=')
                    .is_none_or(|(k, _)| k.trim() != key)
            })
            .map(str::to_string)
            .collect();
        entries.push(format!("{key}={value}"));
        Self(entries.join(";"))
    }

    /// Returns a copy without any `key=value` entry for `key`.
    pub fn without(&self, key: &str) -> Self {
        let entries: Vec<&str> = self
            .entries()
            .filter(|entry| {
                entry
                    .split_once('=')
                    .is_none_or(|(k, _)| k.trim() != key)
            })
            .collect();
        Self(entries.join(";"))
    }

    fn entries(&self) -> impl Iterator<Item = &str> {
        self.0.split(';').filter(|entry| !entry.trim().is_empty())
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Style {
    fn from(style: &str) -> Self {
        Self::new(style)
    }
}

impl From<String> for Style {
    fn from(style: String) -> Self {
        Self(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_of_missing_key() {
        let style = Style::new("rounded;strokeWidth=2");
        assert_eq!(style.value_of("fillColor"), None);
        assert_eq!(style.value_of("strokeWidth"), Some("2"));
    }

    #[test]
    fn test_value_of_last_entry_wins() {
        let style = Style::new("a=1;a=2");
        assert_eq!(style.value_of("a"), Some("2"));
    }

    #[test]
    fn test_empty_entries_are_ignored() {
        let style = Style::new(";;shadow;;");
        assert_eq!(style.names().collect::<Vec<_>>(), vec!["shadow"]);
    }

    #[test]
    fn test_with_replaces_existing() {
        let style = Style::new("rounded;a=1;b=2;a=3");
        assert_eq!(style.with("a", "9").as_str(), "rounded;b=2;a=9");
    }

    #[test]
    fn test_with_on_empty_style() {
        assert_eq!(Style::default().with("a", "1").as_str(), "a=1");
    }

    #[test]
    fn test_without() {
        let style = Style::new("rounded;a=1;b=2");
        assert_eq!(style.without("a").as_str(), "rounded;b=2");
        assert_eq!(style.without("rounded").as_str(), "rounded;a=1;b=2");
    }
}
