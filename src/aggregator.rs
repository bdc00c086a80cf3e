/*
 *  aggregator.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Monitor state and the per-poll update that drives history, alerting
 *  and the device board
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

use chrono::{DateTime, Utc};
use log::debug;

use crate::alert::{AlertLog, AlertState, AlertTransition};
use crate::axis::{y_axis_bounds, AxisBounds};
use crate::devices::DeviceBoard;
use crate::history::HistoryWindow;
use crate::level::NoiseLevel;
use crate::reading::{HistoryPoint, Reading, SensorPayload};

/// Health of the sensor feed as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    /// Nothing polled yet.
    Loading,
    /// Endpoint answered 404, no sample produced yet.
    AwaitingData,
    Live,
    /// Transient, cleared by the next good reading.
    Error(String),
}

impl FeedStatus {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FeedStatus::Error(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}

/// Outcome of one poll, as handed to [`update`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Sample {
        payload: SensorPayload,
        polled_at: DateTime<Utc>,
    },
    NoData,
    Failed(String),
}

/// Everything the panel shows.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorState {
    pub current: Option<Reading>,
    pub history: HistoryWindow,
    pub alert: AlertState,
    pub alerts: AlertLog,
    pub board: DeviceBoard,
    pub status: FeedStatus,
    pub polls: u64,
}

impl MonitorState {
    pub fn new(history_capacity: usize, threshold: f64, board: DeviceBoard) -> Self {
        Self {
            current: None,
            history: HistoryWindow::new(history_capacity),
            alert: AlertState::new(threshold),
            alerts: AlertLog::new(),
            board,
            status: FeedStatus::Loading,
            polls: 0,
        }
    }

    pub fn current_level(&self) -> Option<NoiseLevel> {
        self.current.as_ref().map(|r| NoiseLevel::classify(r.value))
    }

    pub fn axis_bounds(&self) -> AxisBounds {
        y_axis_bounds(&self.history.values())
    }

    /// Folds a single reading into history, alert state and the board.
    pub fn ingest(&mut self, reading: Reading, polled_at: DateTime<Utc>) -> AlertTransition {
        let at = reading.observed_at(polled_at);
        self.history.push(HistoryPoint::from_reading(&reading, polled_at));

        let transition = self.alert.evaluate(reading.value, at);
        if transition == AlertTransition::Raised {
            self.alerts.record(at, reading.value, self.alert.threshold());
        }

        self.board.apply_reading(reading.value, at, self.alert.is_active());
        self.current = Some(reading);
        self.status = FeedStatus::Live;
        transition
    }

    pub fn apply(&mut self, event: PollEvent) {
        self.polls += 1;
        match event {
            PollEvent::Sample { payload, polled_at } => match Reading::from_payload(&payload) {
                Some(reading) => {
                    self.ingest(reading, polled_at);
                }
                None => debug!("Ignoring sensor payload without a value: {:?}", payload),
            },
            PollEvent::NoData => {
                self.status = if self.current.is_some() {
                    FeedStatus::Live
                } else {
                    FeedStatus::AwaitingData
                };
            }
            PollEvent::Failed(msg) => {
                self.status = FeedStatus::Error(msg);
            }
        }
    }
}

/// Pure form of [`MonitorState::apply`].
pub fn update(mut state: MonitorState, event: PollEvent) -> MonitorState {
    state.apply(event);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn sample(value: f64, secs: i64) -> PollEvent {
        PollEvent::Sample {
            payload: SensorPayload {
                value: Some(value),
                samples: Some(8),
                timestamp: Some(t(secs).to_rfc3339()),
            },
            polled_at: t(secs),
        }
    }

    fn state(threshold: f64) -> MonitorState {
        MonitorState::new(20, threshold, DeviceBoard::default())
    }

    #[test]
    fn test_single_alert_for_sustained_breach() {
        let mut s = state(150.0);
        let mut active = Vec::new();
        for (i, v) in [30.0, 45.0, 160.0, 170.0, 140.0].into_iter().enumerate() {
            s = update(s, sample(v, i as i64 * 2));
            active.push(s.alert.is_active());
        }
        assert_eq!(active, vec![false, false, true, true, false]);
        assert_eq!(s.alerts.len(), 1);
        let entry = &s.alerts.entries()[0];
        assert_eq!(entry.value, 160.0);
        assert_eq!(entry.started_at, t(4));
        assert_eq!(s.history.len(), 5);
    }

    #[test]
    fn test_start_time_kept_while_breached() {
        let mut s = state(150.0);
        s = update(s, sample(160.0, 0));
        s = update(s, sample(170.0, 2));
        assert_eq!(s.alert.started_at(), Some(t(0)));
    }

    #[test]
    fn test_reentry_records_second_alert() {
        let mut s = state(150.0);
        for (i, v) in [160.0, 140.0, 155.0].into_iter().enumerate() {
            s = update(s, sample(v, i as i64 * 2));
        }
        assert_eq!(s.alerts.len(), 2);
        let entries = s.alerts.entries();
        assert_ne!(entries[0].started_at, entries[1].started_at);
        assert_eq!(entries[1].started_at, t(4));
        assert_eq!(s.alert.started_at(), Some(t(4)));
    }

    #[test]
    fn test_not_found_leaves_state_untouched() {
        let mut s = state(150.0);
        s = update(s, sample(160.0, 0));
        let before = s.clone();
        s = update(s, PollEvent::NoData);
        assert_eq!(s.history, before.history);
        assert_eq!(s.alert, before.alert);
        assert_eq!(s.alerts, before.alerts);
        assert!(s.status.error_message().is_none());
    }

    #[test]
    fn test_not_found_before_first_sample() {
        let s = update(state(85.0), PollEvent::NoData);
        assert_eq!(s.status, FeedStatus::AwaitingData);
        assert!(s.history.is_empty());
    }

    #[test]
    fn test_malformed_payload_has_no_effect() {
        let mut s = state(85.0);
        s = update(s, sample(50.0, 0));
        let before = s.clone();
        s = update(s, PollEvent::Sample {
            payload: SensorPayload { value: None, samples: Some(2), timestamp: None },
            polled_at: t(2),
        });
        assert_eq!(s.history, before.history);
        assert_eq!(s.current, before.current);
        assert_eq!(s.status, before.status);
    }

    #[test]
    fn test_error_is_transient() {
        let mut s = state(85.0);
        s = update(s, sample(50.0, 0));
        s = update(s, PollEvent::Failed("HTTP status 500".into()));
        assert_eq!(s.status.error_message(), Some("HTTP status 500"));
        assert_eq!(s.history.len(), 1);
        s = update(s, sample(52.0, 2));
        assert_eq!(s.status, FeedStatus::Live);
    }

    #[test]
    fn test_history_bounded_by_capacity() {
        let mut s = MonitorState::new(5, 85.0, DeviceBoard::default());
        for i in 0..40 {
            s = update(s, sample(40.0 + i as f64, i));
            assert!(s.history.len() <= 5);
        }
        assert_eq!(s.history.values(), vec![75.0, 76.0, 77.0, 78.0, 79.0]);
    }

    #[test]
    fn test_board_follows_alert() {
        let mut s = state(85.0);
        s = update(s, sample(90.0, 0));
        assert_eq!(s.board.summary().critical, 1);
        assert_eq!(s.current_level(), Some(NoiseLevel::Loud));
        s = update(s, sample(30.0, 2));
        assert_eq!(s.board.summary().critical, 0);
        assert_eq!(s.current_level(), Some(NoiseLevel::Quiet));
    }
}
