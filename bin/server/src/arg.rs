//! Command line arguments for `wikiracer-server`.

use clap::Parser;

/// Default bind address when `--bind-all` is not given.
pub const DEFAULT_ADDR: &str = "127.0.0.1";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default deadline for a `find_path` call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
/// Port the tokio-console profiling endpoint listens on.
pub const DEFAULT_PROFILING_PORT: u16 = 6060;

#[derive(Debug, Clone, Parser)]
#[command(about = "Serves wikiracer path lookups over HTTP")]
pub struct Arg {
    /// The MediaWiki API endpoint, the full URL of `api.php`. Ignored if `--fixture` is set.
    #[arg(short, long, default_value_t = String::from("https://en.wikipedia.org/w/api.php"))]
    pub site: String,
    /// Serve the built-in in-memory fixture wiki instead of a live MediaWiki site.
    #[arg(long, default_value_t = false)]
    pub fixture: bool,
    /// Bind to all interfaces (`0.0.0.0`) instead of localhost only.
    #[arg(long, default_value_t = false)]
    pub bind_all: bool,
    /// HTTP port to serve on.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Maximum time allowed for a single path lookup, in seconds.
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
    /// Cap on concurrent outbound requests to the upstream MediaWiki site. Ignored if `--fixture` is set.
    #[arg(long)]
    pub concurrency_limit: Option<usize>,
    /// Enable the tokio-console profiling endpoint on this port. Pass 0 to disable.
    #[arg(long, default_value_t = DEFAULT_PROFILING_PORT)]
    pub profiling_port: u16,
}

impl Arg {
    pub fn bind_addr(&self) -> &'static str {
        if self.bind_all { "0.0.0.0" } else { DEFAULT_ADDR }
    }
}
