//! JSON envelope written to stdout for every command, and the exit code that
//! goes with it.

use std::io::{self, Write};

use project_rename::error::Hint;
use project_rename::{Error, ErrorCode, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    details: &'a Value,
    #[serde(skip_serializing_if = "no_hints")]
    hints: &'a [Hint],
}

fn no_hints(hints: &&[Hint]) -> bool {
    hints.is_empty()
}

impl<'a> Envelope<'a> {
    fn new(result: &'a Result<Value>) -> Self {
        match result {
            Ok(data) => Self { success: true, data: Some(data), error: None },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody {
                    code: err.code.as_str(),
                    message: &err.message,
                    details: &err.details,
                    hints: &err.hints,
                }),
            },
        }
    }
}

/// Serialize a command's data, or pick the exit code for its error.
pub fn to_json_result<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(e) => (Err(Error::internal_json(e.to_string(), Some("serialize response".into()))), 1),
        },
        Err(err) => {
            let exit_code = exit_code_for(err.code);
            (Err(err), exit_code)
        }
    }
}

/// Bad input exits 2; failures during a run exit 1.
fn exit_code_for(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigMissingKey
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ConfigAlreadyExists
        | ErrorCode::ValidationInvalidArgument => 2,
        _ => 1,
    }
}

pub fn print_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&Envelope::new(&result))
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize response".into())))?;
    match writeln!(io::stdout().lock(), "{}", payload) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(Error::internal_io(e.to_string(), Some("write stdout".into()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let (result, code) = to_json_result::<()>(Err(Error::config_missing_key("source_path", None)));
        assert!(result.is_err());
        assert_eq!(code, 2);
    }

    #[test]
    fn pipeline_errors_exit_with_one() {
        let err = Error::archive_invalid("bad crc", Some("a.txt".to_string()));
        assert_eq!(to_json_result::<()>(Err(err)).1, 1);
        let err = Error::rename_illegal_name("OldCo", "OldCo", "New:Co", vec![':']);
        assert_eq!(to_json_result::<()>(Err(err)).1, 1);
    }

    #[test]
    fn error_envelope_omits_empty_hints() {
        let result = Err(Error::internal_io("disk full", None));
        let json = serde_json::to_value(Envelope::new(&result)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "internal.io_error");
        assert!(json["error"].get("hints").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn success_envelope_carries_data_only() {
        let result = Ok(serde_json::json!({ "files": 3 }));
        let json = serde_json::to_value(Envelope::new(&result)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["files"], 3);
        assert!(json.get("error").is_none());
    }
}
