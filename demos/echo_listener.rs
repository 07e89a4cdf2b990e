//! demos/echo_listener.rs
//! Run: cargo run --example echo_listener -- <address> <port> [cert.pem key.pem]
//!
//! Greets each client like an SMTP server would, then echoes lines back.

use anyhow::{Context, Result};
use futures::StreamExt;
use smtp_listener::{close, create, Connection, ListenerConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smtp_listener=debug".parse()?)
                .add_directive("echo_listener=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let address = args.first().cloned().unwrap_or_else(|| "127.0.0.1".to_string());
    let port = match args.get(1) {
        Some(port) => port.parse().context("port must be a number")?,
        None => 2500,
    };

    let mut config = ListenerConfig::new(address, port);
    if let (Some(cert), Some(key)) = (args.get(2), args.get(3)) {
        config = config.with_tls(cert, key);
    }

    let handle = Arc::new(create(&config)?);
    info!("Accepting on {} ({})", handle, handle.network());

    let server = tokio::spawn({
        let handle = handle.clone();
        async move {
            let mut incoming = Box::pin(handle.incoming());
            while let Some(accepted) = incoming.next().await {
                match accepted {
                    Ok((conn, peer)) => {
                        tokio::spawn(async move {
                            if let Err(err) = echo(conn).await {
                                warn!(%peer, %err, "connection error");
                            }
                        });
                    }
                    Err(err) => warn!(%err, "accept failed"),
                }
            }
        }
    });

    shutdown_signal().await;
    close(&handle)?;
    server.await?;

    Ok(())
}

async fn echo(mut conn: Connection) -> Result<()> {
    conn.handshake().await?;
    let secured = conn.is_secured();
    let (reader, mut writer) = tokio::io::split(conn);
    let mut lines = BufReader::new(reader).lines();

    writer
        .write_all(format!("220 echo ready (tls: {secured})\r\n").as_bytes())
        .await?;

    while let Some(line) = lines.next_line().await? {
        if line.eq_ignore_ascii_case("QUIT") {
            writer.write_all(b"221 bye\r\n").await?;
            break;
        }
        writer.write_all(format!("250 {line}\r\n").as_bytes()).await?;
    }

    writer.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
