//! Command-line parsing and run configuration.
//!
//! The tool is driven entirely by its arguments:
//!
//! ```text
//! smtp-tls hostname port [--debug]
//! ```
//!
//! Arguments are read by position only. The first two are the hostname and
//! port whatever they look like, and debug mode is on exactly when the third
//! argument is `--debug`. Any other third value, and anything after it, is
//! accepted and ignored. There are no `--help` or `--version` flags.

use clap::Parser;

/// Usage line printed when the positional arguments are missing.
pub const USAGE: &str = "Usage: smtp-tls hostname port [--debug]";

const DEBUG_FLAG: &str = "--debug";

/// Raw command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "smtp-tls",
    about = "Reports the expiration of an SMTP server's STARTTLS certificate",
    override_usage = "smtp-tls hostname port [--debug]",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// SMTP server to connect to
    #[arg(allow_hyphen_values = true)]
    pub hostname: String,

    /// TCP port of the SMTP service
    #[arg(allow_hyphen_values = true)]
    pub port: String,

    /// `--debug` prints the certificate CN, SANs and expiration
    #[arg(num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

impl Cli {
    pub fn debug(&self) -> bool {
        self.rest.first().map(String::as_str) == Some(DEBUG_FLAG)
    }
}

/// Settings for a single certificate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub hostname: String,
    pub port: String,
    pub debug: bool,
    /// Name sent with EHLO
    pub client_name: String,
}

impl Config {
    /// The client always introduces itself under this name, not the real
    /// local hostname.
    pub const CLIENT_NAME: &'static str = "localhost";

    pub fn new(hostname: &str, port: &str, debug: bool) -> Self {
        Config {
            hostname: hostname.to_string(),
            port: port.to_string(),
            debug,
            client_name: Self::CLIENT_NAME.to_string(),
        }
    }

    pub fn from_cli(cli: Cli) -> Self {
        let debug = cli.debug();
        Config::new(&cli.hostname, &cli.port, debug)
    }

    /// The dial string, `hostname:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
