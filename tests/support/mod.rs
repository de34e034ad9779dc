//! Fake SMTP server for exercising the client end to end.

use chrono::Utc;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct Identity {
    pub cert: X509,
    pub key: PKey<Private>,
}

/// Issues a self-signed certificate expiring at `not_after` (Unix seconds).
pub fn self_signed(common_names: &[&str], dns_names: &[&str], not_after: i64) -> Identity {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Fake SMTP")
        .unwrap();
    for cn in common_names {
        name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    }
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();

    let not_before = not_after.min(Utc::now().timestamp()) - 30 * 86_400;
    builder
        .set_not_before(&Asn1Time::from_unix(not_before as _).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::from_unix(not_after as _).unwrap())
        .unwrap();

    if !dns_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in dns_names {
            san.dns(dns);
        }
        let san = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(san).unwrap();
    }

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    Identity {
        cert: builder.build(),
        key,
    }
}

/// Behavior of the fake server.
pub struct FakeServer {
    pub greeting: &'static str,
    pub advertise_starttls: bool,
    pub starttls_reply: &'static str,
    pub identity: Option<Identity>,
}

impl FakeServer {
    pub fn with_identity(identity: Identity) -> FakeServer {
        FakeServer {
            greeting: "220 fake.test ESMTP ready",
            advertise_starttls: true,
            starttls_reply: "220 2.0.0 Ready to start TLS",
            identity: Some(identity),
        }
    }

    pub fn plaintext_only() -> FakeServer {
        FakeServer {
            greeting: "220 fake.test ESMTP ready",
            advertise_starttls: false,
            starttls_reply: "502 5.5.1 not implemented",
            identity: None,
        }
    }

    /// Serves a single client on a loopback port.
    pub fn spawn(self) -> (u16, JoinHandle<Report>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || self.serve(listener));
        (port, handle)
    }

    fn serve(self, listener: TcpListener) -> Report {
        let mut report = Report::default();
        let (stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();

        let mut reader = BufReader::new(stream);
        reply(&mut reader, self.greeting);
        if !self.greeting.starts_with("220") {
            report.closed = wait_for_close(&mut reader);
            return report;
        }

        match self.dialogue(&mut reader, &mut report, self.advertise_starttls) {
            Step::Closed(closed) => {
                report.closed = closed;
                return report;
            }
            Step::UpgradeRequested => {}
        }

        let identity = self.identity.as_ref().unwrap();
        let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
        acceptor.set_private_key(&identity.key).unwrap();
        acceptor.set_certificate(&identity.cert).unwrap();
        let acceptor = acceptor.build();

        let tls = match acceptor.accept(reader.into_inner()) {
            Ok(tls) => tls,
            Err(_) => return report,
        };
        report.tls_established = true;

        let mut reader = BufReader::new(tls);
        if let Step::Closed(closed) = self.dialogue(&mut reader, &mut report, false) {
            report.closed = closed;
        }
        report
    }

    fn dialogue<S: Read + Write>(
        &self,
        reader: &mut BufReader<S>,
        report: &mut Report,
        offer_starttls: bool,
    ) -> Step {
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => return Step::Closed(true),
                Ok(_) => {}
                Err(e) => return Step::Closed(is_disconnect(e.kind())),
            }
            let command = line.trim_end().to_string();
            report.commands.push(command.clone());

            let verb = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            match verb.as_str() {
                "EHLO" if offer_starttls => {
                    reply(reader, "250-fake.test\r\n250-PIPELINING\r\n250 STARTTLS")
                }
                "EHLO" => reply(reader, "250-fake.test\r\n250 PIPELINING"),
                "HELO" => reply(reader, "250 fake.test"),
                "STARTTLS" if offer_starttls => {
                    reply(reader, self.starttls_reply);
                    if self.starttls_reply.starts_with("220") {
                        return Step::UpgradeRequested;
                    }
                }
                "QUIT" => reply(reader, "221 bye"),
                _ => reply(reader, "502 5.5.1 not implemented"),
            }
        }
    }
}

enum Step {
    Closed(bool),
    UpgradeRequested,
}

/// What the fake server observed.
#[derive(Debug, Default)]
pub struct Report {
    pub commands: Vec<String>,
    pub tls_established: bool,
    /// The client closed the connection (as opposed to the server timing out)
    pub closed: bool,
}

fn reply<S: Write>(reader: &mut BufReader<S>, text: &str) {
    let stream = reader.get_mut();
    stream.write_all(format!("{}\r\n", text).as_bytes()).unwrap();
    stream.flush().unwrap();
}

fn wait_for_close<S: Read>(reader: &mut BufReader<S>) -> bool {
    let mut rest = Vec::new();
    match reader.read_to_end(&mut rest) {
        Ok(_) => true,
        Err(e) => is_disconnect(e.kind()),
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    !matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
