/*
 *  main.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use tokio::sync::watch;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use noisemon::aggregator::MonitorState;
use noisemon::client::SensorClient;
use noisemon::config;
use noisemon::poller::Poller;
use noisemon::render::render_panel;
use noisemon::scheduler::{IntervalTicker, StopSignal};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Redraws the panel whenever the poller publishes a new state.
async fn render_loop(mut state_rx: watch::Receiver<MonitorState>) {
    let mut last_alerts = 0;
    while state_rx.changed().await.is_ok() {
        let state = state_rx.borrow_and_update().clone();
        if state.alerts.len() > last_alerts {
            if let Some(entry) = state.alerts.last() {
                warn!(
                    "Alert #{}: {:.1} dB exceeded {:.1} dB at {}",
                    entry.seq, entry.value, entry.threshold, entry.started_at
                );
            }
            last_alerts = state.alerts.len();
        }
        println!("{}\n", render_panel(&state));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load().context("loading configuration")?;

    // Initialize the logger, RUST_LOG wins over the configured level
    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This {} keeps it down", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let client = SensorClient::new(cfg.base_url(), cfg.connect_timeout(), cfg.request_timeout())
        .context("building sensor client")?;
    info!("Sensor endpoint ..: {}", client.url());
    info!("Poll interval ....: {:?}", cfg.poll_interval());
    info!("History window ...: {} points", cfg.history_capacity());
    info!("Alert threshold ..: {:.1} dB", cfg.threshold_db());

    let board = cfg.device_board()?;
    if let Some(device) = board.selected() {
        info!("Live device ......: {} ({}) at ({:.4}, {:.4})", device.name, device.id, device.lat, device.lng);
    }

    let initial = MonitorState::new(cfg.history_capacity(), cfg.threshold_db(), board);
    let stop = StopSignal::new();
    let (poller, state_rx) = Poller::new(
        client,
        IntervalTicker::new(cfg.poll_interval()),
        stop.clone(),
        initial,
    );

    let poll_handle = tokio::spawn(poller.run());
    let render_handle = tokio::spawn(render_loop(state_rx));

    if let Err(e) = signal_handler().await {
        error!("Signal handling failed: {}", e);
    }

    stop.cancel();
    match poll_handle.await {
        Ok(last) => info!(
            "Polled {} times, {} alerts recorded. Bye.",
            last.polls,
            last.alerts.len()
        ),
        Err(e) => error!("Sensor polling task failed to join: {}", e),
    }
    // sender is gone once the poller is dropped, so this ends on its own
    render_handle.await.unwrap_or_else(|e| error!("Render task failed to join: {}", e));

    Ok(())
}
