//! Parameter payloads for the dispatchable operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::CorrelationId;

/// Credentials for the authenticate command.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginParams {
    pub user: String,
    pub password: String,
}

// Credentials are cached client-side for relogin; keep the password out of
// log output.
impl fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginParams")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Answer submitted against a pending question's request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerParams {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub answer: Value,
}

/// Cancellation request targeting an outstanding job by correlation id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CancelParams {
    pub id: CorrelationId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_debug_redacts_password() {
        let params = LoginParams {
            user: "root".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{params:?}");
        assert!(debug.contains("root"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn answer_uses_wire_field_name() {
        let params = AnswerParams {
            request_id: "r9".into(),
            answer: serde_json::json!(1),
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["requestId"], "r9");
    }
}
