//! Error type for the Scenery CLI.

use std::{io, ops::Range};

use thiserror::Error;

use scenery::ModelError;

use crate::config::ConfigError;

/// Errors raised while loading or replaying an edit script.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The script is not valid TOML or does not describe a list of steps.
    #[error("Invalid edit script: {message}")]
    Script {
        message: String,
        span: Option<Range<usize>>,
        src: String,
    },

    #[error("Step {step}: unknown cell name `{name}`")]
    UnknownName { step: usize, name: String },

    #[error("Step {step}: cell name `{name}` is already in use")]
    DuplicateName { step: usize, name: String },

    #[error("Step {step}: {source}")]
    Model {
        step: usize,
        #[source]
        source: ModelError,
    },

    #[error("Script ended with {0} open transaction(s)")]
    OpenTransaction(usize),
}

impl CliError {
    /// Builds a [`CliError::Script`] from a TOML deserialization error.
    pub(crate) fn from_toml(err: toml::de::Error, src: &str) -> Self {
        CliError::Script {
            message: err.message().to_string(),
            span: err.span(),
            src: src.to_string(),
        }
    }

    /// Process exit code for this error.
    ///
    /// `2` when the input could not be read or understood (I/O, config,
    /// script syntax or names), `1` when a well-formed script failed while
    /// being replayed.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(_)
            | CliError::Config(_)
            | CliError::Script { .. }
            | CliError::UnknownName { .. }
            | CliError::DuplicateName { .. } => 2,
            CliError::Model { .. } | CliError::OpenTransaction(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = CliError::Config(ConfigError::MissingFile(PathBuf::from("absent.toml")));
        assert_eq!(missing.exit_code(), 2);

        let unknown = CliError::UnknownName {
            step: 1,
            name: "ghost".to_string(),
        };
        assert_eq!(unknown.exit_code(), 2);

        let model = CliError::Model {
            step: 4,
            source: ModelError::NothingToUndo,
        };
        assert_eq!(model.exit_code(), 1);
        assert_eq!(CliError::OpenTransaction(1).exit_code(), 1);
    }

    #[test]
    fn test_model_error_keeps_source() {
        use std::error::Error as _;

        let err = CliError::Model {
            step: 2,
            source: ModelError::UnbalancedUpdate,
        };
        assert_eq!(
            err.source().map(ToString::to_string),
            Some(ModelError::UnbalancedUpdate.to_string())
        );
    }
}
