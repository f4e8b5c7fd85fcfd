//! Result codes and job identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of an SDK operation or a dispatched job.
///
/// This is a closed set. Every failure the SDK can surface — synchronously
/// from a call or asynchronously through a completed job — maps onto one of
/// these values; nothing crosses the API boundary as a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ResultCode {
    Success,
    InvalidArgument,
    /// The handle is unknown, already released, or refers to an object of
    /// another kind.
    InvalidHandle,
    OutOfMemory,
    NotConnected,
    /// The requested data is not available, e.g. reading the outcome of a
    /// job that is still pending.
    NoData,
    /// A caller-supplied buffer is too small; `required` is the size the
    /// dispatcher needs.
    BufferTooSmall { required: u32 },
    Unimplemented,
    /// Generic failure with no more specific code.
    Failure,
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Success => write!(f, "success"),
            ResultCode::InvalidArgument => write!(f, "invalid_argument"),
            ResultCode::InvalidHandle => write!(f, "invalid_handle"),
            ResultCode::OutOfMemory => write!(f, "out_of_memory"),
            ResultCode::NotConnected => write!(f, "not_connected"),
            ResultCode::NoData => write!(f, "no_data"),
            ResultCode::BufferTooSmall { required } => {
                write!(f, "buffer_too_small (required {required})")
            }
            ResultCode::Unimplemented => write!(f, "unimplemented"),
            ResultCode::Failure => write!(f, "failure"),
        }
    }
}

/// Category of a dispatched job: which operation it tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    ServerLogin,
    ServerRelogin,
    ServerLogoff,
    ServerAnswer,
    VmStart,
    VmStop,
    VmBeginEdit,
    VmCommit,
    JobCancel,
}

impl JobCategory {
    /// Wire method name the dispatcher routes on.
    pub fn method(self) -> &'static str {
        match self {
            JobCategory::ServerLogin => "srv.login",
            JobCategory::ServerRelogin => "srv.relogin",
            JobCategory::ServerLogoff => "srv.logoff",
            JobCategory::ServerAnswer => "srv.answer",
            JobCategory::VmStart => "vm.start",
            JobCategory::VmStop => "vm.stop",
            JobCategory::VmBeginEdit => "vm.beginEdit",
            JobCategory::VmCommit => "vm.commit",
            JobCategory::JobCancel => "job.cancel",
        }
    }
}

/// Correlation id matching an asynchronous response to the command that
/// caused it. Unique within a connection's lifetime; allocated by the
/// transport when the command is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_code_serializes_tagged() {
        let json = serde_json::to_value(ResultCode::NotConnected).unwrap();
        assert_eq!(json["code"], "not_connected");

        let json = serde_json::to_value(ResultCode::BufferTooSmall { required: 512 }).unwrap();
        assert_eq!(json["code"], "buffer_too_small");
        assert_eq!(json["required"], 512);
    }

    #[test]
    fn result_code_round_trips() {
        let code: ResultCode =
            serde_json::from_str(r#"{"code": "buffer_too_small", "required": 128}"#).unwrap();
        assert_eq!(code, ResultCode::BufferTooSmall { required: 128 });
        assert!(!code.is_success());
    }

    #[test]
    fn category_methods_are_distinct() {
        assert_eq!(JobCategory::ServerLogin.method(), "srv.login");
        assert_ne!(
            JobCategory::VmBeginEdit.method(),
            JobCategory::VmCommit.method()
        );
    }
}
