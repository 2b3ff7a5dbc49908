use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,
    ConfigAlreadyExists,

    ValidationInvalidArgument,

    RenameIllegalName,
    ArchiveInvalid,
    IgnoreInvalidPattern,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",
            ErrorCode::ConfigAlreadyExists => "config.already_exists",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::RenameIllegalName => "rename.illegal_name",
            ErrorCode::ArchiveInvalid => "archive.invalid",
            ErrorCode::IgnoreInvalidPattern => "ignore.invalid_pattern",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IllegalNameDetails {
    pub path: String,
    pub old_value: String,
    pub new_value: String,
    pub illegal: Vec<char>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedNameDetails {
    pub path: String,
    pub old_value: String,
    pub new_value: String,
    pub segment: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveInvalidDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidPatternDetails {
    pub gate: String,
    pub source: String,
    pub pattern: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let details = to_details(ConfigMissingKeyDetails {
            key: key.into(),
            path,
        });

        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details,
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn config_already_exists(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigAlreadyExists,
            format!("Configuration file already exists: {}", path),
            serde_json::json!({ "path": path }),
        )
        .with_hint("Pass --force to overwrite it with the defaults")
    }

    pub fn rename_illegal_name(
        path: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        illegal: Vec<char>,
    ) -> Self {
        let details = to_details(IllegalNameDetails {
            path: path.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            illegal,
        });

        Self::new(
            ErrorCode::RenameIllegalName,
            "Replacement value contains characters that are not allowed in file names",
            details,
        )
        .with_hint("Disable replace_name on this rule or remove the special characters")
    }

    /// A rename produced an empty, `.` or `..` path segment.
    pub fn rename_reserved_name(
        path: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        segment: impl Into<String>,
    ) -> Self {
        let details = to_details(ReservedNameDetails {
            path: path.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            segment: segment.into(),
        });

        Self::new(
            ErrorCode::RenameIllegalName,
            "Replacement would produce an empty, '.' or '..' path segment",
            details,
        )
        .with_hint("Choose a replacement value that is a real file name")
    }

    pub fn archive_invalid(error: impl Into<String>, record: Option<String>) -> Self {
        let details = to_details(ArchiveInvalidDetails {
            error: error.into(),
            record,
        });

        Self::new(
            ErrorCode::ArchiveInvalid,
            "Archive failed integrity check",
            details,
        )
    }

    pub fn ignore_invalid_pattern(
        gate: impl Into<String>,
        source: impl Into<String>,
        pattern: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let details = to_details(InvalidPatternDetails {
            gate: gate.into(),
            source: source.into(),
            pattern: pattern.into(),
            error: error.into(),
        });

        Self::new(
            ErrorCode::IgnoreInvalidPattern,
            "Invalid ignore pattern",
            details,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
