//! Parameter-error edge cases at the `send` boundary: an oversized
//! payload must be rejected before it ever reaches the wire.
//! `DeviceIdentity`'s own length-cap rejections are covered at the unit
//! level in `cometa-common::config`; `cometa::client`'s missing-init
//! rejection is covered in `cometa`'s own unit tests, both against a
//! process-wide `OnceCell` that a shared integration binary can't safely
//! re-exercise per test.

use cometa_common::config::{DeviceIdentity, SubscribeConfig, TransportConfig};
use cometa_common::constants::MAX_SEND_LEN;
use cometa_common::error::ReplyCode;
use cometa_core::Session;
use std::time::Duration;

#[tokio::test]
async fn test_send_rejects_oversized_payload_without_touching_the_wire() {
    let (relay, relay_addr) = super::bind_loopback().await;

    let relay_task = tokio::spawn(async move {
        let mut stream = super::accept_after_probe(&relay).await;
        super::relay_subscribe_step(&mut stream, "chal").await;
        super::relay_finish_one_way(&mut stream, 60).await;
        // The boundary-sized send below is read back here; the oversized
        // one before it must never have reached the wire at all.
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
    .expect("subscribe succeeds");

    let oversized = vec![0u8; MAX_SEND_LEN + 1];
    let err = session
        .send(&oversized)
        .await
        .expect_err("a payload over MAX_SEND_LEN must be rejected");
    assert_eq!(err, ReplyCode::ParError);
    assert_eq!(session.last_error(), ReplyCode::ParError);

    let boundary = vec![0x41u8; MAX_SEND_LEN];
    session
        .send(&boundary)
        .await
        .expect("a payload at exactly MAX_SEND_LEN is accepted");

    let frame = tokio::time::timeout(Duration::from_secs(5), relay_task)
        .await
        .expect("the boundary-sized send reached the relay")
        .unwrap();
    assert_eq!(frame.len(), MAX_SEND_LEN + 1);
    assert_eq!(frame[0], cometa_common::constants::UPSTREAM_MARKER);
}
