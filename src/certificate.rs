//! Leaf certificate details and the expiry report.

use crate::error::CheckError;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::x509::X509Ref;
use std::io::Write;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// The certificate fields the report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Last Subject Common Name, empty when the subject has none
    pub common_name: String,
    /// DNS entries of the Subject Alternative Name extension
    pub dns_names: Vec<String>,
    pub not_after: DateTime<Utc>,
}

impl Certificate {
    pub fn from_x509(cert: &X509Ref) -> Result<Certificate, CheckError> {
        let common_name = cert
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .last()
            .map(|entry| entry.data().to_string())
            .unwrap_or_default();

        let dns_names = cert
            .subject_alt_names()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.dnsname().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Certificate {
            common_name,
            dns_names,
            not_after: asn1_to_utc(cert.not_after())?,
        })
    }

    /// Whole days left before `not_after`, counted from `now`.
    ///
    /// Partial days are dropped (47 hours left is 1 day). Once expired the
    /// count is negative, starting at -1.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        days_between(now, self.not_after)
    }

    /// Writes the report: the day count alone, or the CN, SANs and
    /// expiration lines in debug mode.
    pub fn write_report<W: Write>(
        &self,
        out: &mut W,
        debug: bool,
        now: DateTime<Utc>,
    ) -> std::io::Result<()> {
        if debug {
            writeln!(out, "CN: {}", self.common_name)?;
            writeln!(out, "SANs: {}", format_names(&self.dns_names))?;
            writeln!(
                out,
                "Expiration: {}",
                self.not_after.to_rfc3339_opts(SecondsFormat::Secs, true)
            )
        } else {
            writeln!(out, "{}", self.days_until_expiry(now))
        }
    }
}

fn days_between(now: DateTime<Utc>, not_after: DateTime<Utc>) -> i64 {
    (not_after - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Renders names as a bracketed, space separated list: `[a b c]`.
pub fn format_names(names: &[String]) -> String {
    format!("[{}]", names.join(" "))
}

fn asn1_to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>, CheckError> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let seconds = i64::from(diff.days) * SECONDS_PER_DAY + i64::from(diff.secs);
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| CheckError::CertificateError {
            reason: format!("expiration out of range: {}", time),
        })
}
