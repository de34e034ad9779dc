//! Error types for the STARTTLS certificate check.
//!
//! Every failure is terminal: the binary prints the error's `Display` text on
//! standard output and exits with status 1, whatever the variant.

use lettre::transport::smtp::Error as SmtpError;
use std::fmt;
use std::io;

/// Terminal failure of a certificate check.
///
/// The `Display` text of each variant is the line printed to the user.
#[derive(Debug)]
pub enum CheckError {
    /// TCP connection (including name resolution) failed
    ConnectionFailed {
        /// The `host:port` that was dialed
        address: String,
        /// The underlying SMTP transport error
        source: SmtpError,
    },

    /// The server rejected or garbled the greeting or the EHLO exchange
    ClientFailed(SmtpError),

    /// The server did not advertise STARTTLS
    StartTlsNotSupported,

    /// The STARTTLS command, the TLS handshake or the follow-up EHLO failed
    StartTlsFailed(SmtpError),

    /// The SMTP session is not running over TLS
    TlsStateUnavailable,

    /// The TLS session exposes no peer certificate
    NoPeerCertificate(SmtpError),

    /// The leaf certificate could not be decoded
    CertificateError {
        /// Description of what went wrong
        reason: String,
    },

    /// Writing the report failed
    Output {
        /// The underlying I/O error
        source: io::Error,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { address, source } => {
                write!(f, "Failed to connect to {}: {}", address, source)
            }
            Self::ClientFailed(e) => write!(f, "Failed to create SMTP client: {}", e),
            Self::StartTlsNotSupported => write!(f, "STARTTLS is not supported"),
            Self::StartTlsFailed(e) => write!(f, "Failed to start TLS: {}", e),
            Self::TlsStateUnavailable => write!(f, "Failed to get TLS connection state"),
            Self::NoPeerCertificate(e) => write!(f, "No peer certificate presented: {}", e),
            Self::CertificateError { reason } => write!(f, "Certificate error: {}", reason),
            Self::Output { source } => write!(f, "Failed to write output: {}", source),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::ClientFailed(e) | Self::StartTlsFailed(e) | Self::NoPeerCertificate(e) => {
                Some(e)
            }
            Self::Output { source } => Some(source),
            _ => None,
        }
    }
}

impl From<openssl::error::ErrorStack> for CheckError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::CertificateError {
            reason: e.to_string(),
        }
    }
}
