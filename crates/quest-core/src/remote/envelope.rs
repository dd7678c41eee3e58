//! The discriminated result every remote command resolves to on the wire.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorBody, QuestError, Result};

/// `{"status":"ok","data":...}` or `{"status":"error","error":{...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CommandResult<T> {
    Ok { data: T },
    Error { error: ErrorBody },
}

impl<T> CommandResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Ok { data } => Ok(data),
            Self::Error { error } => Err(QuestError::from(error)),
        }
    }
}

impl<T> From<Result<T>> for CommandResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::Ok { data },
            Err(err) => Self::Error { error: err.into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_ok_envelope_with_null_data() {
        let parsed: CommandResult<Option<String>> =
            serde_json::from_str(r#"{"status":"ok","data":null}"#).unwrap();
        assert_eq!(parsed.into_result().unwrap(), None);
    }

    #[test]
    fn test_error_envelope() {
        let parsed: CommandResult<u32> = serde_json::from_str(
            r#"{"status":"error","error":{"error_type":"NOT_FOUND","message":"gone"}}"#,
        )
        .unwrap();
        assert!(!parsed.is_ok());

        let err = parsed.into_result().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotFound));
    }

    #[test]
    fn test_from_result_uses_wire_codes() {
        let envelope: CommandResult<()> = Err(QuestError::validation("too long")).into();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["error_type"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "too long");
    }
}
