// src/listener/error.rs
use std::fmt;
use std::io;
use std::path::PathBuf;

use tokio_rustls::rustls;

/// Errors surfaced by [`create`](super::create), [`close`](super::close) and accept.
///
/// None of these are logged or retried here; the caller owns remediation.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("listen tcp {endpoint}: {reason}: {source}")]
    AddressBindFailure {
        endpoint: String,
        reason: BindFailure,
        #[source]
        source: io::Error,
    },

    #[error("tls: {0}")]
    InvalidCertificateMaterial(#[from] CertificateError),

    #[error("use of closed network listener")]
    AlreadyClosed,

    #[error("listener must be created inside a Tokio runtime: {0}")]
    RuntimeUnavailable(#[from] tokio::runtime::TryCurrentError),

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
}

impl ListenerError {
    /// Structured classification of a bind failure, if this is one.
    pub fn bind_failure(&self) -> Option<BindFailure> {
        match self {
            ListenerError::AddressBindFailure { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn is_already_closed(&self) -> bool {
        matches!(self, ListenerError::AlreadyClosed)
    }
}

/// Why the single bind attempt failed.
///
/// `Display` renders the phrases downstream tooling greps for
/// (`no such host`, `can't assign requested address`), independent of the
/// platform's own wording in the wrapped OS error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindFailure {
    HostNotFound,
    AddressUnavailable,
    AddressInUse,
    PermissionDenied,
    Other,
}

impl BindFailure {
    /// Classify an error returned by the OS while binding a resolved address.
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::AddrNotAvailable => BindFailure::AddressUnavailable,
            io::ErrorKind::AddrInUse => BindFailure::AddressInUse,
            io::ErrorKind::PermissionDenied => BindFailure::PermissionDenied,
            _ => BindFailure::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BindFailure::HostNotFound => "no such host",
            BindFailure::AddressUnavailable => "can't assign requested address",
            BindFailure::AddressInUse => "address already in use",
            BindFailure::PermissionDenied => "permission denied",
            BindFailure::Other => "bind failed",
        }
    }
}

impl fmt::Display for BindFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of the certificate/key pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemKind {
    Certificate,
    Key,
}

impl fmt::Display for PemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PemKind::Certificate => f.write_str("certificate"),
            PemKind::Key => f.write_str("key"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate and private key files must be configured together")]
    IncompletePair,

    #[error("failed to read {kind} file {}: {source}", path.display())]
    Read {
        kind: PemKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to find any PEM data in {0} input")]
    NoPemData(PemKind),

    #[error("malformed PEM data in {kind} input: {source}")]
    MalformedPem {
        kind: PemKind,
        #[source]
        source: io::Error,
    },

    #[error("certificate/key pair rejected: {0}")]
    Rejected(#[from] rustls::Error),
}
