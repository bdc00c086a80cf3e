/*
 *  render.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Text panel for the terminal
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

use chrono::Local;
use std::fmt::Write;

use crate::aggregator::{FeedStatus, MonitorState};
use crate::axis::AxisBounds;
use crate::history::HistoryWindow;

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar per history point, scaled into `bounds`.
pub fn sparkline(history: &HistoryWindow, bounds: &AxisBounds) -> String {
    history
        .iter()
        .map(|p| {
            let idx = (bounds.normalize(p.value) * (SPARK_BARS.len() - 1) as f64).round() as usize;
            SPARK_BARS[idx.min(SPARK_BARS.len() - 1)]
        })
        .collect()
}

fn status_line(status: &FeedStatus) -> String {
    match status {
        FeedStatus::Loading => "Loading data...".to_string(),
        FeedStatus::AwaitingData => "Awaiting first sample".to_string(),
        FeedStatus::Live => "Live".to_string(),
        FeedStatus::Error(msg) => format!("Error: {}", msg),
    }
}

/// Full panel, one section per line.
pub fn render_panel(state: &MonitorState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "NoiseMon ........: {}", status_line(&state.status));

    match (&state.current, state.current_level()) {
        (Some(reading), Some(level)) => {
            let _ = writeln!(
                out,
                "Current ........: {:.1} dB ({}) from {} samples",
                reading.value, level, reading.sample_count
            );
        }
        _ => {
            let _ = writeln!(out, "Current ........: --");
        }
    }

    if let Some(stats) = state.history.stats() {
        let _ = writeln!(
            out,
            "Window .........: avg {:.2} dB  peak {:.1} dB  min {:.1} dB  ({}/{})",
            stats.average, stats.peak, stats.minimum, stats.count, state.history.capacity()
        );
    }

    if state.history.is_empty() {
        let _ = writeln!(out, "History ........: waiting for data...");
    } else {
        let bounds = state.axis_bounds();
        let first = state.history.iter().next().map(|p| p.display_time.as_str()).unwrap_or("");
        let last = state.history.latest().map(|p| p.display_time.as_str()).unwrap_or("");
        let _ = writeln!(
            out,
            "History ........: [{:.0}..{:.0}] {} {}-{}",
            bounds.lower, bounds.upper, sparkline(&state.history, &bounds), first, last
        );
    }

    match state.alert.started_at() {
        Some(since) if state.alert.is_active() => {
            let _ = writeln!(
                out,
                "Alert ..........: ACTIVE > {:.1} dB since {}",
                state.alert.threshold(),
                since.with_timezone(&Local).format("%H:%M:%S")
            );
        }
        _ => {
            let _ = writeln!(out, "Alert ..........: normal (threshold {:.1} dB)", state.alert.threshold());
        }
    }
    let _ = writeln!(out, "Alert log ......: {} recorded", state.alerts.len());

    let summary = state.board.summary();
    let selected = state
        .board
        .selected()
        .map(|d| format!("{} [{}] {}", d.name, d.id, d.status))
        .unwrap_or_else(|| "none".to_string());
    let _ = write!(
        out,
        "Devices ........: {} total, {} active, {} critical, selected {}",
        summary.total, summary.active, summary.critical, selected
    );
    out
}
