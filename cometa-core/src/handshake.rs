//! The three-step authentication handshake.

use crate::auth::{constant_time_eq, last_non_empty_line, last_quoted};
use crate::transport::{self, BoxedStream};
use bytes::Bytes;
use cometa_common::config::{DeviceIdentity, SubscribeConfig, TransportConfig};
use cometa_common::constants::{API_HOST, DEFAULT_HEARTBEAT_SECS};
use cometa_common::error::{CometaError, Result};
use cometa_protocol::http1::read_response;
use cometa_protocol::{ChunkCodec, OutgoingChunk};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio_util::codec::Framed;

const APP_KEY_MISMATCH: &str = "Application key mismatch.";

/// Everything the handshake produces: the live, framed relay connection and
/// the heartbeat period to run at.
pub struct HandshakeOutcome {
    pub framed: Framed<BoxedStream, ChunkCodec>,
    pub heartbeat_period: Duration,
}

/// Runs the full handshake against `relay_addr` and, if `subscribe` carries
/// an app-server triple, the two-way challenge exchange with it.
pub async fn run(
    identity: &DeviceIdentity,
    subscribe: &SubscribeConfig,
    transport_config: &TransportConfig,
    relay_addr: SocketAddr,
) -> Result<HandshakeOutcome> {
    let mut stream = transport::connect(transport_config, relay_addr).await?;

    let two_way = subscribe.is_two_way();
    let platform_part = identity
        .platform
        .as_ref()
        .map(|p| format!("&platform={p}"))
        .unwrap_or_default();
    let request = format!(
        "GET /subscribe?app_name={}&app_key={}&device_id={}{platform_part} HTTP/1.1\r\nHost: {API_HOST}\r\nCometa-Authentication: {}\r\n\r\n",
        subscribe.app_name,
        subscribe.app_key,
        identity.device_id,
        if two_way { "YES" } else { "NO" },
    );
    stream.write_all(request.as_bytes()).await?;

    let response = read_response(&mut stream).await?;
    let body = String::from_utf8_lossy(&response.body);
    let challenge = last_non_empty_line(&body)
        .ok_or_else(|| CometaError::Protocol("subscribe response carried no challenge".into()))?
        .to_string();

    let signature = if two_way {
        let app_server = subscribe
            .app_server
            .as_ref()
            .expect("is_two_way implies app_server is Some");
        Some(authenticate_with_app_server(identity, subscribe, app_server, &challenge).await?)
    } else {
        None
    };

    let mut framed = Framed::new(stream, ChunkCodec::new());

    if let Some(signature) = signature {
        framed
            .send(OutgoingChunk::Response(Bytes::from(signature)))
            .await?;
    }

    let final_chunk = framed
        .next()
        .await
        .ok_or_else(|| CometaError::Protocol("relay closed before the handshake result".into()))??;

    let heartbeat_period = parse_handshake_result(&final_chunk)?;

    Ok(HandshakeOutcome {
        framed,
        heartbeat_period,
    })
}

async fn authenticate_with_app_server(
    identity: &DeviceIdentity,
    subscribe: &SubscribeConfig,
    app_server: &cometa_common::config::AppServerConfig,
    challenge: &str,
) -> Result<String> {
    let app_addr = lookup_host((app_server.name.as_str(), app_server.port))
        .await
        .map_err(|e| CometaError::Connection(format!("app-server DNS lookup failed: {e}")))?
        .next()
        .ok_or_else(|| {
            CometaError::Connection(format!(
                "{}:{} resolved to no addresses",
                app_server.name, app_server.port
            ))
        })?;

    let mut app_stream = TcpStream::connect(app_addr).await?;
    let request = format!(
        "GET /{}?device_id={}&device_key={}&app_key={}&challenge={challenge} HTTP/1.1\r\nHost: {API_HOST}\r\n\r\n",
        app_server.auth_endpoint, identity.device_id, identity.device_key, subscribe.app_key,
    );
    app_stream.write_all(request.as_bytes()).await?;

    let response = read_response(&mut app_stream).await?;
    let body = String::from_utf8_lossy(&response.body);
    let signature = last_quoted(&body)
        .ok_or_else(|| CometaError::Protocol("app-server response carried no signature".into()))?
        .to_string();

    if constant_time_eq(signature.as_bytes(), APP_KEY_MISMATCH.as_bytes()) {
        return Err(CometaError::Authentication(signature));
    }

    Ok(signature)
}

fn parse_handshake_result(body: &[u8]) -> Result<Duration> {
    let text = String::from_utf8_lossy(body);
    if text.contains("403") {
        return Err(CometaError::Authentication(
            "relay rejected subscription (403)".into(),
        ));
    }

    let heartbeat_secs = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("heartbeat").cloned())
        .and_then(|v| match v {
            serde_json::Value::String(s) => s.parse::<u64>().ok(),
            serde_json::Value::Number(n) => n.as_u64(),
            _ => None,
        })
        .unwrap_or(DEFAULT_HEARTBEAT_SECS);

    Ok(Duration::from_secs(heartbeat_secs))
}
