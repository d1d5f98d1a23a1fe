/// Errors from the remote instance or its provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstanceError {
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: std::time::Duration,
    },

    #[error("provisioning failed: {0}")]
    Provision(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("instance already released")]
    Released,
}

impl From<InstanceError> for vmpilot_common::PilotError {
    fn from(e: InstanceError) -> Self {
        vmpilot_common::PilotError::Instance(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let err = InstanceError::Timeout {
            operation: "computer",
            after: std::time::Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "computer timed out after 60s");
    }

    #[test]
    fn converts_into_umbrella_error() {
        let err: vmpilot_common::PilotError = InstanceError::Released.into();
        assert_eq!(err.to_string(), "instance error: instance already released");
    }
}
