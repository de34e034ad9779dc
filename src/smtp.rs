//! SMTP session: greeting, EHLO and STARTTLS on lettre's low-level
//! connection.

use crate::config::Config;
use crate::error::CheckError;
use crate::tls;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::Error as SmtpError;
use log::debug;
use openssl::x509::X509;

/// An SMTP session owning its connection.
///
/// The connection starts in plaintext and is encrypted in place by
/// [`SmtpSession::starttls`].
pub struct SmtpSession {
    conn: SmtpConnection,
    hostname: String,
    client_id: ClientId,
}

impl SmtpSession {
    /// Dials `hostname:port`, reads the greeting and sends EHLO.
    pub fn open(config: &Config) -> Result<SmtpSession, CheckError> {
        let address = config.address();
        let client_id = ClientId::Domain(config.client_name.clone());

        debug!("connecting to {}", address);
        let conn = SmtpConnection::connect(address.as_str(), None, &client_id, None, None)
            .map_err(|e| open_error(&address, e))?;
        debug!("{} advertises {}", address, conn.server_info());

        Ok(SmtpSession {
            conn,
            hostname: config.hostname.clone(),
            client_id,
        })
    }

    /// Whether the last EHLO reply advertised STARTTLS on a plaintext link.
    pub fn supports_starttls(&self) -> bool {
        self.conn.can_starttls()
    }

    /// Upgrades the connection without verifying the server certificate,
    /// then repeats EHLO over TLS.
    pub fn starttls(&mut self) -> Result<(), CheckError> {
        let parameters =
            tls::insecure_parameters(&self.hostname).map_err(CheckError::StartTlsFailed)?;
        self.conn
            .starttls(&parameters, &self.client_id)
            .map_err(CheckError::StartTlsFailed)?;
        debug!("connection to {} encrypted", self.hostname);
        Ok(())
    }

    /// The certificate the server presented during the handshake.
    pub fn leaf_certificate(&self) -> Result<X509, CheckError> {
        if !self.conn.is_encrypted() {
            return Err(CheckError::TlsStateUnavailable);
        }
        let der = self
            .conn
            .peer_certificate()
            .map_err(CheckError::NoPeerCertificate)?;
        Ok(X509::from_der(&der)?)
    }

    /// Sends QUIT and closes the connection. A failed QUIT aborts the
    /// connection instead.
    pub fn close(mut self) {
        if let Err(e) = self.conn.quit() {
            debug!("QUIT failed ({}), aborting", e);
            self.conn.abort();
        }
        debug!("closed connection to {}", self.hostname);
    }
}

/// Negative or malformed replies come from a live server; anything else
/// means the connection itself could not be made or kept.
fn open_error(address: &str, e: SmtpError) -> CheckError {
    if e.is_permanent() || e.is_transient() || e.is_response() || e.is_client() {
        CheckError::ClientFailed(e)
    } else {
        CheckError::ConnectionFailed {
            address: address.to_string(),
            source: e,
        }
    }
}
