// src/config/mod.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::listener::CertificateError;

/// Where and how the SMTP listener binds.
///
/// Loading this from files or the environment is left to the embedding
/// server; the type only derives `Deserialize` so it can sit inside a larger
/// configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListenerConfig {
    /// Hostname or IP literal. Empty binds every interface.
    #[serde(default)]
    pub address: String,

    /// TCP port, `0` lets the OS pick one.
    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub cert_file: Option<PathBuf>,

    #[serde(default)]
    pub key_file: Option<PathBuf>,
}

impl ListenerConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            cert_file: None,
            key_file: None,
        }
    }

    /// Secure the listener with a PEM certificate chain and private key.
    pub fn with_tls(mut self, cert_file: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        self.cert_file = Some(cert_file.into());
        self.key_file = Some(key_file.into());
        self
    }

    /// Host used for resolution. An empty address means all interfaces.
    pub fn host(&self) -> &str {
        let host = self.address.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            "0.0.0.0"
        } else {
            host
        }
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn endpoint(&self) -> String {
        let host = self.host();
        if host.contains(':') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// The certificate/key pair, if TLS is configured.
    ///
    /// Setting only one of the two paths is an error.
    pub fn tls_paths(&self) -> Result<Option<(&Path, &Path)>, CertificateError> {
        match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) => Ok(Some((cert.as_path(), key.as_path()))),
            (None, None) => Ok(None),
            _ => Err(CertificateError::IncompletePair),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_host_and_port() {
        assert_eq!(ListenerConfig::new("127.0.0.1", 2500).endpoint(), "127.0.0.1:2500");
        assert_eq!(ListenerConfig::new("localhost", 0).endpoint(), "localhost:0");
    }

    #[test]
    fn endpoint_brackets_ipv6_literals() {
        assert_eq!(ListenerConfig::new("::1", 25).endpoint(), "[::1]:25");
        assert_eq!(ListenerConfig::new("[::1]", 25).endpoint(), "[::1]:25");
    }

    #[test]
    fn empty_address_means_all_interfaces() {
        let config = ListenerConfig::new("", 2525);
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.endpoint(), "0.0.0.0:2525");
    }

    #[test]
    fn tls_paths_require_both_files() {
        let plain = ListenerConfig::new("127.0.0.1", 0);
        assert!(matches!(plain.tls_paths(), Ok(None)));

        let both = plain.clone().with_tls("cert.pem", "key.pem");
        let (cert, key) = both.tls_paths().unwrap().unwrap();
        assert_eq!(cert, Path::new("cert.pem"));
        assert_eq!(key, Path::new("key.pem"));

        let mut cert_only = plain;
        cert_only.cert_file = Some("cert.pem".into());
        assert!(matches!(
            cert_only.tls_paths(),
            Err(CertificateError::IncompletePair)
        ));
    }
}
