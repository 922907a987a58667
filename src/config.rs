use clap::Parser;
use tracing::Level;

pub const DEFAULT_PORT: u16 = 6379;

/// Command line and environment configuration. Flags take precedence over the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "pipedis", version, about = "In-memory key-value store speaking RESP")]
pub struct Config {
    /// The address to bind to
    #[arg(long, env = "PIPEDIS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// The port to listen on
    #[arg(short, long, env = "PIPEDIS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Number of runtime worker threads
    #[arg(short, long, env = "PIPEDIS_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Maximum level of the emitted logs (trace, debug, info, warn, error)
    #[arg(long, env = "PIPEDIS_LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Config {
    pub fn address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
