// src/listener/mod.rs
mod error;
mod factory;
mod handle;
mod tcp;
mod tls;
mod traits;

pub use error::{BindFailure, CertificateError, ListenerError, PemKind};
pub use factory::{close, create};
pub use handle::{Connection, ListenerHandle};
pub use tls::{load_server_config, server_config_from_pem, TlsConnection, TlsListener};
pub use traits::Listener;
