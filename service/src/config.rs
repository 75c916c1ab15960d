use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use fanout::{ManagerOptions, UnsubscribeMatching};
use log::LevelFilter;
use std::ffi::OsString;

/// WebSocket route clients connect to for streamed notifications.
pub const DEFAULT_STREAM_PATH: &str = "/v1/stream";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// The route on which WebSocket clients connect to the notification stream
    #[arg(long, env, default_value = DEFAULT_STREAM_PATH)]
    stream_path: String,

    /// How an unsubscribe value selects subscriptions: `pattern` retracts every
    /// value the glob matches, `exact` only the identical value.
    #[arg(
        long,
        env,
        default_value_t = UnsubscribeMatching::Pattern,
        value_parser = clap::builder::PossibleValuesParser::new(["pattern", "exact", "PATTERN", "EXACT"])
            .map(|s| s.parse::<UnsubscribeMatching>().unwrap()),
    )]
    pub unsubscribe_matching: UnsubscribeMatching,

    /// Match inbound action names case-sensitively instead of ignoring case.
    #[arg(long, env)]
    pub case_sensitive_actions: bool,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Parses explicit arguments instead of the process's, still honoring the
    /// environment. The first item is the program name.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Config::try_parse_from(args)
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    /// The `interface:port` pair the server binds to.
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }

    pub fn stream_path(&self) -> &str {
        &self.stream_path
    }

    pub fn set_stream_path(mut self, stream_path: String) -> Self {
        self.stream_path = stream_path;
        self
    }

    /// Options for the fan-out manager derived from this configuration.
    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            unsubscribe_matching: self.unsubscribe_matching,
            case_sensitive_actions: self.case_sensitive_actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("stream_relay").chain(args.iter().copied());
        Config::from_args(argv).unwrap()
    }

    #[test]
    fn test_server_address_joins_interface_and_port() {
        let config = parse(&["--interface", "0.0.0.0", "--port", "8080"]);
        assert_eq!(config.server_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_allowed_origins_are_comma_delimited() {
        let config = parse(&["--allowed-origins", "https://a.example,https://b.example"]);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_manager_options_follow_flags() {
        let config = parse(&["--unsubscribe-matching", "EXACT", "--case-sensitive-actions"]);
        let options = config.manager_options();
        assert_eq!(options.unsubscribe_matching, UnsubscribeMatching::Exact);
        assert!(options.case_sensitive_actions);
    }

    #[test]
    fn test_rejects_unknown_unsubscribe_matching() {
        let result = Config::try_parse_from(["stream_relay", "--unsubscribe-matching", "regex"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_filter_parses() {
        let config = parse(&["--log-level-filter", "DEBUG"]);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
    }

    #[test]
    fn test_stream_path_override() {
        let config = parse(&["--stream-path", "/events"]);
        assert_eq!(config.stream_path(), "/events");
        let config = config.set_stream_path(DEFAULT_STREAM_PATH.to_string());
        assert_eq!(config.stream_path(), DEFAULT_STREAM_PATH);
    }
}
