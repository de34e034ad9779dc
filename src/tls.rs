//! TLS parameters for the STARTTLS upgrade.

use lettre::transport::smtp::client::TlsParameters;
use lettre::transport::smtp::Error;

/// Parameters that accept any server certificate.
///
/// Certificate and hostname verification are switched off on purpose: the
/// tool reports on whatever certificate the server presents, including
/// expired, self-signed or otherwise untrusted ones. Do not reuse these
/// parameters for anything that needs to authenticate the peer.
///
/// `hostname` is sent as SNI unless it is an IP literal, so a server hosting
/// several names may present a different certificate than it would to a
/// client sending no SNI.
pub fn insecure_parameters(hostname: &str) -> Result<TlsParameters, Error> {
    TlsParameters::builder(hostname.to_string())
        .dangerous_accept_invalid_certs(true)
        .dangerous_accept_invalid_hostnames(true)
        .build()
}
