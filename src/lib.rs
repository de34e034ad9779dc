//! Reports the expiration of the certificate an SMTP server presents after
//! STARTTLS.
//!
//! The check is a straight pipeline: connect over TCP, greet with EHLO,
//! require the STARTTLS extension, upgrade without verifying the peer, then
//! read the leaf certificate of the negotiated session.
//!
//! ```no_run
//! use smtp_tls::config::Config;
//!
//! let config = Config::new("mx.example.com", "25", false);
//! smtp_tls::run(&config, &mut std::io::stdout())?;
//! # Ok::<(), smtp_tls::error::CheckError>(())
//! ```

pub mod certificate;
pub mod config;
pub mod error;
pub mod smtp;
pub mod tls;

use chrono::Utc;
use std::io::Write;

use crate::certificate::Certificate;
use crate::config::Config;
use crate::error::CheckError;
use crate::smtp::SmtpSession;

/// Runs one check and writes the report to `out`.
///
/// The TLS handshake sends the hostname as SNI (unless it is an IP literal)
/// and never verifies the certificate. The SMTP session, and with it the TCP
/// connection, is closed before this returns, whether the check succeeded
/// or not.
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<(), CheckError> {
    let mut session = SmtpSession::open(config)?;
    let result = inspect(&mut session);
    session.close();

    let certificate = result?;
    certificate
        .write_report(out, config.debug, Utc::now())
        .map_err(|source| CheckError::Output { source })
}

fn inspect(session: &mut SmtpSession) -> Result<Certificate, CheckError> {
    if !session.supports_starttls() {
        return Err(CheckError::StartTlsNotSupported);
    }
    session.starttls()?;

    let leaf = session.leaf_certificate()?;
    Certificate::from_x509(&leaf)
}
