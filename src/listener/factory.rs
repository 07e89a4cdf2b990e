// src/listener/factory.rs
use super::error::{BindFailure, ListenerError};
use super::handle::{Bound, ListenerHandle};
use super::tcp::bind_tcp;
use super::tls::{load_server_config, TlsListener};
use crate::config::ListenerConfig;

/// Bind the SMTP listener described by `config`.
///
/// Makes exactly one bind attempt. When both a certificate and a key are
/// configured the bound socket is wrapped so every accepted connection is
/// TLS; the reported address and network are unchanged by the wrapping.
/// Blocks on name resolution and file reads, and must run inside a Tokio
/// runtime.
pub fn create(config: &ListenerConfig) -> Result<ListenerHandle, ListenerError> {
    tokio::runtime::Handle::try_current()?;
    let tls_paths = config.tls_paths()?;

    let listener = bind_tcp(config)?;

    let bound = match tls_paths {
        Some((cert_path, key_path)) => {
            let tls_config = load_server_config(cert_path, key_path)?;
            Bound::Tls(TlsListener::new(listener, tls_config))
        }
        None => Bound::Plain(listener),
    };

    let handle = ListenerHandle::new(bound).map_err(|source| ListenerError::AddressBindFailure {
        endpoint: config.endpoint(),
        reason: BindFailure::classify(&source),
        source,
    })?;

    tracing::info!(
        addr = %handle,
        secured = handle.is_secured(),
        "SMTP listener bound"
    );
    Ok(handle)
}

/// Release a handle obtained from [`create`]. Fails if it was already closed.
pub fn close(handle: &ListenerHandle) -> Result<(), ListenerError> {
    handle.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::CertificateError;

    #[test]
    fn requires_a_runtime() {
        let err = create(&ListenerConfig::new("127.0.0.1", 0)).unwrap_err();
        assert!(matches!(err, ListenerError::RuntimeUnavailable(_)));
    }

    #[tokio::test]
    async fn half_configured_tls_is_rejected() {
        let mut config = ListenerConfig::new("127.0.0.1", 0);
        config.key_file = Some("tests/fixtures/smtp-key.pem".into());

        let err = create(&config).unwrap_err();
        assert!(matches!(
            err,
            ListenerError::InvalidCertificateMaterial(CertificateError::IncompletePair)
        ));
    }

    #[tokio::test]
    async fn plain_listener_reports_tcp() {
        let handle = create(&ListenerConfig::new("127.0.0.1", 0)).unwrap();
        assert_eq!(handle.network(), "tcp");
        assert!(!handle.is_secured());
        assert!(close(&handle).is_ok());
        assert!(handle.is_closed());
    }
}
