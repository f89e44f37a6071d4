//! The three-step handshake, driven directly against
//! `cometa_core::handshake::run` with a mock relay (and, for two-way mode,
//! a mock app server). Bypasses ensemble selection, which resolves a DNS
//! name not reachable from a test sandbox; `super::session_test`
//! covers the full `Session::subscribe` path against a loopback ensemble.

use cometa_common::config::{AppServerConfig, DeviceIdentity, SubscribeConfig, TransportConfig};
use cometa_common::error::CometaError;
use cometa_core::handshake;

fn device() -> DeviceIdentity {
    DeviceIdentity::new("10001", "777", Some("linux_client".into())).unwrap()
}

#[tokio::test]
async fn test_one_way_subscribe_success() {
    let (relay, relay_addr) = super::bind_loopback().await;

    let relay_task = tokio::spawn(async move {
        let (mut stream, _) = relay.accept().await.unwrap();
        let head = super::relay_subscribe_step(&mut stream, "chal-123").await;
        assert!(head.contains("app_name=cometatest"));
        assert!(head.contains("Cometa-Authentication: NO"));
        super::relay_finish_one_way(&mut stream, 45).await;
    });

    let subscribe = SubscribeConfig {
        app_name: "cometatest".into(),
        app_key: "key".into(),
        app_server: None,
    };
    let outcome = handshake::run(&device(), &subscribe, &TransportConfig::Tcp, relay_addr)
        .await
        .expect("handshake succeeds");

    assert_eq!(outcome.heartbeat_period.as_secs(), 45);
    relay_task.await.unwrap();
}

#[tokio::test]
async fn test_two_way_subscribe_with_signature() {
    let (relay, relay_addr) = super::bind_loopback().await;
    let (app_server, app_server_addr) = super::bind_loopback().await;

    let relay_task = tokio::spawn(async move {
        let (mut stream, _) = relay.accept().await.unwrap();
        let head = super::relay_subscribe_step(&mut stream, "chal-abc").await;
        assert!(head.contains("Cometa-Authentication: YES"));
        super::relay_finish_two_way(&mut stream, 30).await
    });

    let app_server_task = tokio::spawn(async move {
        let (mut stream, _) = app_server.accept().await.unwrap();
        super::app_server_auth_step(&mut stream, "key", b"shared-secret", "chal-abc").await
    });

    let subscribe = SubscribeConfig {
        app_name: "cometatest".into(),
        app_key: "key".into(),
        app_server: Some(AppServerConfig {
            name: "127.0.0.1".into(),
            port: app_server_addr.port(),
            auth_endpoint: "authenticate".into(),
        }),
    };
    let outcome = handshake::run(&device(), &subscribe, &TransportConfig::Tcp, relay_addr)
        .await
        .expect("two-way handshake succeeds");

    assert_eq!(outcome.heartbeat_period.as_secs(), 30);
    let expected_signature = app_server_task.await.unwrap();
    let signature_on_wire = relay_task.await.unwrap();
    assert_eq!(signature_on_wire, expected_signature.as_bytes());
}

#[tokio::test]
async fn test_app_key_mismatch_is_auth_error() {
    let (relay, relay_addr) = super::bind_loopback().await;
    let (app_server, app_server_addr) = super::bind_loopback().await;

    tokio::spawn(async move {
        let (mut stream, _) = relay.accept().await.unwrap();
        super::relay_subscribe_step(&mut stream, "chal-xyz").await;
        // The app server rejects before the device ever writes to the relay
        // again, so the relay task has nothing further to do.
    });

    tokio::spawn(async move {
        let (mut stream, _) = app_server.accept().await.unwrap();
        super::app_server_key_mismatch_step(&mut stream).await;
    });

    let subscribe = SubscribeConfig {
        app_name: "cometatest".into(),
        app_key: "wrong-key".into(),
        app_server: Some(AppServerConfig {
            name: "127.0.0.1".into(),
            port: app_server_addr.port(),
            auth_endpoint: "authenticate".into(),
        }),
    };
    let err = handshake::run(&device(), &subscribe, &TransportConfig::Tcp, relay_addr)
        .await
        .expect_err("app key mismatch must fail the handshake");
    assert!(matches!(err, CometaError::Authentication(_)));
}

#[tokio::test]
async fn test_relay_403_is_auth_error() {
    let (relay, relay_addr) = super::bind_loopback().await;

    tokio::spawn(async move {
        let (mut stream, _) = relay.accept().await.unwrap();
        super::relay_subscribe_step(&mut stream, "chal-rejected").await;
        super::relay_finish_rejected(&mut stream).await;
    });

    let subscribe = SubscribeConfig {
        app_name: "cometatest".into(),
        app_key: "key".into(),
        app_server: None,
    };
    let err = handshake::run(&device(), &subscribe, &TransportConfig::Tcp, relay_addr)
        .await
        .expect_err("a 403 result must fail the handshake");
    assert!(matches!(err, CometaError::Authentication(_)));
}
