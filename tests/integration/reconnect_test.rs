//! Reconnection: when the relay goes silent, the heartbeat loop reruns
//! the handshake and replaces the receive loop exactly once, with no
//! duplicate dispatch afterward.

use cometa_common::config::{DeviceIdentity, SubscribeConfig, TransportConfig};
use cometa_core::Session;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_reconnect_runs_exactly_one_receive_loop() {
    let (relay, relay_addr) = super::bind_loopback().await;

    let relay_task = tokio::spawn(async move {
        // First connection: short heartbeat period, so the test doesn't
        // wait long for the heartbeat loop to notice the drop below.
        let mut stream = super::accept_after_probe(&relay).await;
        super::relay_subscribe_step(&mut stream, "chal-1").await;
        super::relay_finish_one_way(&mut stream, 1).await;
        drop(stream); // the relay goes silent; the device's next read sees EOF

        // Second connection: the reconnect the heartbeat loop drives once
        // it notices the session is disconnected.
        let mut stream = super::accept_after_probe(&relay).await;
        super::relay_subscribe_step(&mut stream, "chal-2").await;
        super::relay_finish_one_way(&mut stream, 60).await;

        // A single downstream frame after reconnecting must produce exactly
        // one response: proof that exactly one receive loop is listening.
        super::write_chunk_frame(&mut stream, b"ping").await;
        super::read_chunk_frame(&mut stream).await
    });

    let identity = DeviceIdentity::new("10001", "777", None).unwrap();
    let subscribe = SubscribeConfig {
        app_name: "cometatest".into(),
        app_key: "key".into(),
        app_server: None,
    };
    let session = Session::subscribe_for_test(
        identity,
        subscribe,
        TransportConfig::Tcp,
        "127.0.0.1".into(),
        relay_addr.port(),
    )
    .await
    .expect("initial subscribe succeeds");

    let reply_count = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&reply_count);
    session
        .bind_callback(Some(Arc::new(move |_data: &[u8]| {
            counted.fetch_add(1, Ordering::SeqCst);
            Some(b"pong".to_vec())
        })))
        .await;

    let response = tokio::time::timeout(Duration::from_secs(10), relay_task)
        .await
        .expect("reconnect completed within the timeout")
        .unwrap();

    assert_eq!(response, b"pong");
    assert_eq!(reply_count.load(Ordering::SeqCst), 1);
}
