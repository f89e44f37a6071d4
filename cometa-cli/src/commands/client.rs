//! Client subcommand implementation.
//!
//! A Rust rendition of `cometa-client.c`'s `main`: subscribe, bind a
//! callback that echoes a fixed reply, then periodically send a timestamp
//! upstream with [`cometa::Session::send`].

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use cometa_common::config::TlsConfig;
use cometa_common::constants::PORT_TLS;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const REPLY: &[u8] = b"Pong!";

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Device id registered with Cometa.
    #[arg(long, env = "COMETA_DEVICE_ID")]
    device_id: String,

    /// Device key for application-server authentication.
    #[arg(long, env = "COMETA_DEVICE_KEY")]
    device_key: String,

    /// Optional platform description sent at init time.
    #[arg(long, env = "COMETA_PLATFORM")]
    platform: Option<String>,

    /// Cometa-registered application name.
    #[arg(long, env = "COMETA_APP_NAME")]
    app_name: String,

    /// Cometa-registered application key.
    #[arg(long, env = "COMETA_APP_KEY")]
    app_key: String,

    /// Application server hostname or IP, for two-way authentication. When
    /// omitted the device subscribes in one-way mode.
    #[arg(long, env = "COMETA_APP_SERVERNAME", requires_all = ["app_server_port", "app_server_endpoint"])]
    app_server_name: Option<String>,

    /// Application server port.
    #[arg(long, env = "COMETA_APP_SERVERPORT")]
    app_server_port: Option<u16>,

    /// Application server authentication endpoint, e.g. `authenticate`.
    #[arg(long, env = "COMETA_APP_ENDPOINT")]
    app_server_endpoint: Option<String>,

    /// Use TLS for the relay connection instead of plain TCP.
    #[arg(long, env = "COMETA_TLS")]
    tls: bool,

    /// CA bundle to trust, when `--tls` is set. Defaults to `rootcert.pem`.
    #[arg(long, env = "COMETA_CA_BUNDLE")]
    ca_bundle: Option<PathBuf>,

    /// Override the relay port (defaults to the transport's standard port).
    #[arg(long, env = "COMETA_RELAY_PORT")]
    relay_port: Option<u16>,

    /// Seconds between upstream timestamp sends.
    #[arg(long, default_value = "15", env = "COMETA_SEND_INTERVAL")]
    send_interval: u64,
}

pub async fn run(args: ClientArgs) -> Result<()> {
    if args.tls {
        rustls::crypto::ring::default_provider()
            .install_default()
            .map_err(|_| anyhow::anyhow!("failed to install the rustls crypto provider"))?;
    }

    cometa::init(
        args.device_id.clone(),
        args.device_key.clone(),
        args.platform.clone(),
    )
    .map_err(|code| anyhow::anyhow!("cometa::init failed: {code:?}"))?;

    let mut builder = cometa::Client::builder()
        .app_name(args.app_name.clone())
        .app_key(args.app_key.clone());

    if let (Some(name), Some(port), Some(endpoint)) = (
        args.app_server_name.clone(),
        args.app_server_port,
        args.app_server_endpoint.clone(),
    ) {
        builder = builder.app_server(name, port, endpoint);
    }

    if args.tls {
        builder = builder.transport(cometa::TransportConfig::Tls(TlsConfig {
            ca_bundle_path: args.ca_bundle.clone(),
        }));
        if args.relay_port.is_none() {
            info!("TLS enabled, defaulting relay port to {PORT_TLS}");
        }
    }
    if let Some(port) = args.relay_port {
        builder = builder.relay_port(port);
    }

    let session = builder
        .subscribe()
        .await
        .map_err(|code| anyhow::anyhow!("subscribe failed: {code:?}"))
        .context("could not subscribe to the Cometa relay")?;

    session
        .bind_callback(Some(Arc::new(|data: &[u8]| {
            info!(bytes = data.len(), "message_handler: received message");
            Some(REPLY.to_vec())
        })))
        .await;

    println!(
        "cometa-client: connection completed for device ID: {}",
        args.device_id
    );

    let interval = Duration::from_secs(args.send_interval);
    loop {
        tokio::time::sleep(interval).await;
        let payload = format!(
            "{{\"id\":\"{}\",\"time\":\"{}\"}}",
            args.device_id,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if let Err(code) = session.send(payload.as_bytes()).await {
            warn!(?code, "send_time_upstream: cometa_send failed");
        }
    }
}
