use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{parser::ParserError, treewalk::RaisedException};

/// Everything that can go wrong between handing the loader a path and calling into the plugin.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("invalid plugin path: {reason}")]
    Input { reason: String },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("'{name}' not found in module '{module}'")]
    NameNotFound { name: String, module: String },

    #[error("not a file: {}", path.display())]
    NotAFile { path: PathBuf },

    #[error("file too large: {} is {size} bytes, the limit is {limit}", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("{} is not a .{expected} file", path.display())]
    InvalidExtension { path: PathBuf, expected: String },

    #[error("invalid Python code in {} at line {line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
        #[source]
        source: ParserError,
    },

    #[error("failed to execute module '{module}': {}", source.exception)]
    Load {
        module: String,
        #[source]
        source: RaisedException,
    },

    #[error("'{name}' is not callable (found {type_name})")]
    NotCallable { name: String, type_name: String },

    #[error(transparent)]
    ContractMismatch(#[from] ContractMismatch),

    #[error("calling '{name}' raised {}", source.exception)]
    Call {
        name: String,
        #[source]
        source: RaisedException,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid loader configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// The flat category of a [`LoaderError`], for callers that branch without inspecting payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Input,
    NotFound,
    NotAFile,
    TooLarge,
    InvalidExtension,
    Syntax,
    Load,
    NotCallable,
    ContractMismatch,
    Call,
    Io,
    Config,
}

impl LoaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input { .. } => ErrorKind::Input,
            Self::FileNotFound { .. } | Self::NameNotFound { .. } => ErrorKind::NotFound,
            Self::NotAFile { .. } => ErrorKind::NotAFile,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::InvalidExtension { .. } => ErrorKind::InvalidExtension,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Load { .. } => ErrorKind::Load,
            Self::NotCallable { .. } => ErrorKind::NotCallable,
            Self::ContractMismatch(_) => ErrorKind::ContractMismatch,
            Self::Call { .. } => ErrorKind::Call,
            Self::Io { .. } => ErrorKind::Io,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn input(reason: impl Into<String>) -> Self {
        Self::Input {
            reason: reason.into(),
        }
    }

    pub(crate) fn name_not_found(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self::NameNotFound {
            name: name.into(),
            module: module.into(),
        }
    }
}

/// A callable whose declared parameters do not satisfy an expected [`Contract`].
///
/// [`Contract`]: crate::plugin::Contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractMismatch {
    #[error("'{callable}' is missing expected parameter '{parameter}'")]
    MissingParameter { callable: String, parameter: String },

    #[error(
        "parameter '{parameter}' of '{callable}' has type {}, expected {expected}",
        actual.as_deref().unwrap_or("None")
    )]
    TypeMismatch {
        callable: String,
        parameter: String,
        expected: String,
        actual: Option<String>,
    },
}

impl ContractMismatch {
    /// The parameter the mismatch is about.
    pub fn parameter(&self) -> &str {
        match self {
            Self::MissingParameter { parameter, .. } | Self::TypeMismatch { parameter, .. } => {
                parameter
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_not_found() {
        let file = LoaderError::FileNotFound {
            path: PathBuf::from("/missing.py"),
        };
        let name = LoaderError::name_not_found("run", "tool");
        assert_eq!(file.kind(), ErrorKind::NotFound);
        assert_eq!(name.kind(), ErrorKind::NotFound);
        assert_eq!(name.to_string(), "'run' not found in module 'tool'");
    }

    #[test]
    fn mismatch_messages() {
        let missing = ContractMismatch::MissingParameter {
            callable: "execute".into(),
            parameter: "timeout".into(),
        };
        assert_eq!(
            missing.to_string(),
            "'execute' is missing expected parameter 'timeout'"
        );

        let wrong = ContractMismatch::TypeMismatch {
            callable: "execute".into(),
            parameter: "command".into(),
            expected: "int".into(),
            actual: Some("str".into()),
        };
        assert_eq!(wrong.parameter(), "command");
        let error: LoaderError = wrong.into();
        assert_eq!(error.kind(), ErrorKind::ContractMismatch);
        assert_eq!(
            error.to_string(),
            "parameter 'command' of 'execute' has type str, expected int"
        );
    }
}
