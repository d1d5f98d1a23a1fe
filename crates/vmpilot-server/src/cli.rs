use clap::Parser;

/// vmpilot: WebSocket server that pairs each chat session with a remote VM
/// and a computer-use agent.
#[derive(Parser, Debug)]
#[command(name = "vmpilot", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Port to listen on (overrides config and VMPILOT_PORT).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = Args::parse_from(["vmpilot", "--port", "9000", "--log-level", "debug"]);
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }

    #[test]
    fn defaults_are_empty() {
        let args = Args::parse_from(["vmpilot"]);
        assert!(args.port.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.print_config);
    }

    #[test]
    fn print_config_flag() {
        let args = Args::parse_from(["vmpilot", "--print-config", "--port", "9001"]);
        assert!(args.print_config);
        assert_eq!(args.port, Some(9001));
    }
}
