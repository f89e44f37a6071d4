//! Owned session state.
//!
//! One structural change from the C source: there is no process-global
//! mutable "current session" pointer. `Session` is reached through an
//! owned `Arc<Session>`; the
//! heartbeat loop holds only a `Weak` back-reference plus the handshake
//! parameters needed to reconnect, and replaces just its own view of "the
//! current receive loop" through a `tokio::sync::Mutex<Option<JoinHandle>>`
//! slot on the session. Exactly one receive loop and one heartbeat loop
//! exist per session; reconnection replaces only the receive loop.

use crate::ensemble;
use crate::handshake;
use crate::{heartbeat, receive_loop};
use cometa_common::config::{DeviceIdentity, SubscribeConfig, TransportConfig};
use cometa_common::constants::ENSEMBLE_HOST;
use cometa_common::error::{ReplyCode, Result};
use cometa_protocol::{ChunkCodec, OutgoingChunk};
use futures::stream::SplitSink;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::transport::BoxedStream;

/// The user's message callback. Receives the raw downstream payload and may
/// return a response payload to frame and write back. Runs on the receive
/// loop task, so it MUST return promptly and MUST NOT call back into the
/// same session (re-entrancy would deadlock on the write mutex).
pub type Callback = Arc<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

type WriteHalf = SplitSink<Framed<BoxedStream, ChunkCodec>, OutgoingChunk>;

/// One subscribed device's connection and handshake state.
pub struct Session {
    pub(crate) identity: DeviceIdentity,
    pub(crate) subscribe: SubscribeConfig,
    pub(crate) transport_config: TransportConfig,
    pub(crate) relay_host: String,
    pub(crate) relay_port: u16,

    pub(crate) write_half: Mutex<WriteHalf>,
    pub(crate) callback: Mutex<Option<Callback>>,
    pub(crate) heartbeat_period_secs: AtomicU64,
    pub(crate) disconnected: AtomicBool,
    pub(crate) last_error: AtomicU8,

    pub(crate) receive_handle: Mutex<Option<JoinHandle<()>>>,
    heartbeat_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Runs the handshake against the fastest ensemble member and starts
    /// the session's receive loop and heartbeat loop.
    pub async fn subscribe(
        identity: DeviceIdentity,
        subscribe: SubscribeConfig,
        transport_config: TransportConfig,
        relay_port: u16,
    ) -> Result<Arc<Self>> {
        Self::subscribe_with_host(
            identity,
            subscribe,
            transport_config,
            ENSEMBLE_HOST.to_string(),
            relay_port,
        )
        .await
    }

    /// Builds a session against an explicit relay host instead of the
    /// ensemble DNS name. Not part of the public API: exists so integration
    /// tests can point a session at a loopback-bound mock relay while
    /// production code always goes through [`Self::subscribe`].
    #[cfg(feature = "test-util")]
    pub async fn subscribe_for_test(
        identity: DeviceIdentity,
        subscribe: SubscribeConfig,
        transport_config: TransportConfig,
        relay_host: String,
        relay_port: u16,
    ) -> Result<Arc<Self>> {
        Self::subscribe_with_host(identity, subscribe, transport_config, relay_host, relay_port)
            .await
    }

    async fn subscribe_with_host(
        identity: DeviceIdentity,
        subscribe: SubscribeConfig,
        transport_config: TransportConfig,
        relay_host: String,
        relay_port: u16,
    ) -> Result<Arc<Self>> {
        let relay_addr = ensemble::select_fastest(&relay_host, relay_port).await?;
        let outcome = handshake::run(&identity, &subscribe, &transport_config, relay_addr).await?;

        let (write_half, read_half) = futures::StreamExt::split(outcome.framed);

        let session = Arc::new(Self {
            identity,
            subscribe,
            transport_config,
            relay_host,
            relay_port,
            write_half: Mutex::new(write_half),
            callback: Mutex::new(None),
            heartbeat_period_secs: AtomicU64::new(outcome.heartbeat_period.as_secs()),
            disconnected: AtomicBool::new(false),
            last_error: AtomicU8::new(ReplyCode::Ok as u8),
            receive_handle: Mutex::new(None),
            heartbeat_handle: Mutex::new(None),
        });

        let receive_handle = tokio::spawn(receive_loop::run(Arc::clone(&session), read_half));
        *session.receive_handle.lock().await = Some(receive_handle);

        let heartbeat_handle = tokio::spawn(heartbeat::run(Arc::downgrade(&session)));
        *session.heartbeat_handle.lock().await = Some(heartbeat_handle);

        Ok(session)
    }

    /// Binds (or clears, with `None`) the user message callback.
    pub async fn bind_callback(&self, callback: Option<Callback>) {
        *self.callback.lock().await = callback;
    }

    /// Sends an upstream, non-response message.
    ///
    /// Returns the same [`ReplyCode`] that [`Self::last_error`] is left
    /// holding. Alongside `subscribe` and `init`, this is one of the only
    /// operations whose failure is surfaced directly to the caller instead
    /// of only through the session.
    pub async fn send(&self, payload: &[u8]) -> std::result::Result<(), ReplyCode> {
        if payload.len() > cometa_common::constants::MAX_SEND_LEN {
            self.set_last_error(ReplyCode::ParError);
            return Err(ReplyCode::ParError);
        }

        let mut write_half = self.write_half.lock().await;
        let result = futures::SinkExt::send(
            &mut *write_half,
            OutgoingChunk::Upstream(bytes::Bytes::copy_from_slice(payload)),
        )
        .await;
        drop(write_half);

        if let Err(e) = result {
            tracing::warn!(error = %e, "send failed, disconnecting");
            self.set_last_error(ReplyCode::NetError);
            self.disconnected.store(true, Ordering::Relaxed);
            return Err(ReplyCode::NetError);
        }
        Ok(())
    }

    /// The last error code set by any of the session's operations. Backed
    /// by an atomic so it never blocks on the write/session mutex.
    #[must_use]
    pub fn last_error(&self) -> ReplyCode {
        reply_code_from_u8(self.last_error.load(Ordering::Relaxed))
    }

    pub(crate) fn set_last_error(&self, code: ReplyCode) {
        self.last_error.store(code as u8, Ordering::Relaxed);
    }

    pub(crate) fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_period_secs.load(Ordering::Relaxed))
    }

    /// Cancels the receive loop and heartbeat loop and closes the
    /// transport. There is no counterpart in the original firmware — a
    /// library can't rely on process exit for cleanup.
    pub async fn shutdown(&self) {
        self.disconnected.store(true, Ordering::Relaxed);
        if let Some(handle) = self.receive_handle.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.heartbeat_handle.lock().await.take() {
            handle.abort();
        }
        let _ = futures::SinkExt::close(&mut *self.write_half.lock().await).await;
    }

    /// Builds a bare session around an already-framed write half, with no
    /// handshake and no loops spawned. Exists only so `heartbeat::run` can
    /// be exercised directly against an in-memory duplex stream, without
    /// a mock relay.
    #[cfg(test)]
    pub(crate) fn new_for_heartbeat_test(write_half: WriteHalf, period_secs: u64) -> Arc<Self> {
        Arc::new(Self {
            identity: DeviceIdentity::new("10001", "777", None).unwrap(),
            subscribe: SubscribeConfig {
                app_name: "cometatest".into(),
                app_key: "key".into(),
                app_server: None,
            },
            transport_config: TransportConfig::Tcp,
            relay_host: "127.0.0.1".into(),
            relay_port: 0,
            write_half: Mutex::new(write_half),
            callback: Mutex::new(None),
            heartbeat_period_secs: AtomicU64::new(period_secs),
            disconnected: AtomicBool::new(false),
            last_error: AtomicU8::new(ReplyCode::Ok as u8),
            receive_handle: Mutex::new(None),
            heartbeat_handle: Mutex::new(None),
        })
    }

    /// Reruns the handshake and replaces only the receive loop and the
    /// write half of the transport; the heartbeat loop keeps running.
    pub(crate) async fn reconnect(self: &Arc<Self>) -> Result<()> {
        let relay_addr = ensemble::select_fastest(&self.relay_host, self.relay_port).await?;
        let outcome =
            handshake::run(&self.identity, &self.subscribe, &self.transport_config, relay_addr)
                .await?;
        self.heartbeat_period_secs
            .store(outcome.heartbeat_period.as_secs(), Ordering::Relaxed);

        let (new_write_half, new_read_half) = futures::StreamExt::split(outcome.framed);

        *self.write_half.lock().await = new_write_half;
        self.disconnected.store(false, Ordering::Relaxed);

        let mut receive_handle = self.receive_handle.lock().await;
        if let Some(old) = receive_handle.take() {
            old.abort();
        }
        *receive_handle = Some(tokio::spawn(receive_loop::run(
            Arc::clone(self),
            new_read_half,
        )));

        Ok(())
    }
}

fn reply_code_from_u8(code: u8) -> ReplyCode {
    match code {
        0 => ReplyCode::Ok,
        1 => ReplyCode::Timeout,
        2 => ReplyCode::NetError,
        3 => ReplyCode::HttpError,
        4 => ReplyCode::AuthError,
        5 => ReplyCode::ParError,
        _ => ReplyCode::Error,
    }
}
