use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PilotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("ai error: {0}")]
    Ai(String),

    #[error("instance error: {0}")]
    Instance(String),

    #[error("credit store error: {0}")]
    Credits(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("server.port = 0 is out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: server.port = 0 is out of range"
        );

        let err = ConfigError::MissingCredential("ANTHROPIC_API_KEY".into());
        assert_eq!(err.to_string(), "missing credential: ANTHROPIC_API_KEY");
    }

    #[test]
    fn pilot_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: PilotError = config_err.into();
        assert!(matches!(err, PilotError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn pilot_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: PilotError = io_err.into();
        assert!(matches!(err, PilotError::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn pilot_error_other_variants() {
        let err = PilotError::Network("connection reset".into());
        assert_eq!(err.to_string(), "network error: connection reset");

        let err = PilotError::Ai("model unavailable".into());
        assert_eq!(err.to_string(), "ai error: model unavailable");

        let err = PilotError::Instance("quota exceeded".into());
        assert_eq!(err.to_string(), "instance error: quota exceeded");

        let err = PilotError::Credits("supabase unreachable".into());
        assert_eq!(err.to_string(), "credit store error: supabase unreachable");

        let err = PilotError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
