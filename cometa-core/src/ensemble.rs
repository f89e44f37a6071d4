//! Latency-based selection across the relay ensemble.
//!
//! `ensemble.cometa.io` resolves to every relay instance; the device probes
//! all of them in parallel and connects to whichever answers fastest.

use cometa_common::error::{CometaError, Result};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{lookup_host, TcpStream};

/// A candidate relay address and how long it took to connect to it.
/// Scoped to one selection round: nothing beyond the address is retained
/// once the winner is chosen, and the probe connection itself is not
/// reused for the live session (see DESIGN.md for why).
#[derive(Debug, Clone, Copy)]
struct EnsembleCandidate {
    addr: SocketAddr,
    latency: Duration,
}

/// Resolves `host:port` to every relay instance, probes them all
/// concurrently, and returns the address of the fastest responder.
pub async fn select_fastest(host: &str, port: u16) -> Result<SocketAddr> {
    let candidates: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|e| CometaError::Connection(format!("DNS lookup of {host}:{port} failed: {e}")))?
        .collect();

    if candidates.is_empty() {
        return Err(CometaError::Connection(format!(
            "{host}:{port} resolved to no addresses"
        )));
    }

    let probes = candidates.into_iter().enumerate().map(|(index, addr)| async move {
        let probed = probe(addr).await;
        (index, addr, probed)
    });

    let results = futures::future::join_all(probes).await;

    results
        .into_iter()
        .filter_map(|(index, addr, probed)| {
            probed.ok().map(|latency| (index, EnsembleCandidate { addr, latency }))
        })
        .min_by_key(|(index, c)| (c.latency, *index))
        .map(|(_, c)| c.addr)
        .ok_or_else(|| {
            CometaError::Connection(format!("no ensemble member at {host}:{port} is reachable"))
        })
}

async fn probe(addr: SocketAddr) -> std::io::Result<Duration> {
    let start = Instant::now();
    TcpStream::connect(addr).await?;
    Ok(start.elapsed())
}
