//! Connects to the local segment, logs peer discovery and every broadcast
//! packet, then polls the first master's track info, metrics, and mixer
//! state once a second until Ctrl-C.

use anyhow::{Context, Result};
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use tcnet_client::{ClientConfig, Event, TcNetClient};

fn setup_logger() -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_offset_to_local()
        .unwrap()
        .build();
    CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Info,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .context("failed to initialize logger")
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logger()?;

    let client = TcNetClient::builder()
        .config(ClientConfig::default())
        .connect()
        .await
        .context("failed to bind TCNet sockets")?;

    log::info!("tcnet_monitor listening");

    let mut events = client.events();
    let event_client = client.clone();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::PeerAdded(peer)) => {
                    log::info!("peer added: {} ({:?}) at {}", peer.node_name, peer.node_type, peer.unicast_addr);
                }
                Ok(Event::PeerRemoved(node_id)) => {
                    log::info!("peer removed: {node_id}");
                }
                Ok(Event::Broadcast(packet)) => {
                    log::debug!("broadcast: {packet:?}");
                }
                Ok(Event::UnicastPacket(packet)) => {
                    log::debug!("unmatched unicast reply: {packet:?}");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("event stream lagged, skipped {skipped} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        let _ = event_client;
    });

    let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                break;
            }
            _ = ticker.tick() => {
                if client.peers().is_empty() {
                    continue;
                }
                match client.track_info(1).await {
                    Ok(info) => log::info!("{} — {}", info.track_artist, info.track_title),
                    Err(e) => log::debug!("track_info(layer=1) failed: {e}"),
                }
                match client.layer_metrics(1).await {
                    Ok(m) => log::info!("bpm={:.2} position={}ms", m.bpm_x100 as f32 / 100.0, m.current_position_ms),
                    Err(e) => log::debug!("layer_metrics(layer=1) failed: {e}"),
                }
            }
        }
    }

    client.disconnect().await;
    Ok(())
}
