/*
 *  alert.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Edge-triggered threshold alerting
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
use log::{info, warn};
use serde::Serialize;

pub const DEFAULT_THRESHOLD_DB: f64 = 85.0;

/// Alert state, only ever changed through [`AlertState::evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertState {
    active: bool,
    started_at: Option<DateTime<Utc>>,
    threshold: f64,
}

/// What a single evaluation did to the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    /// At or below threshold, nothing was active.
    Normal,
    /// Crossed above the threshold, a new log entry is due.
    Raised,
    /// Still above the threshold.
    Sustained,
    /// Dropped back to or below the threshold.
    Cleared,
}

/// One breach, recorded when it starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEntry {
    pub seq: u64,
    pub started_at: DateTime<Utc>,
    pub value: f64,
    pub threshold: f64,
}

/// Append-only record of breaches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertLog {
    entries: Vec<AlertEntry>,
}

impl AlertState {
    pub fn new(threshold: f64) -> Self {
        Self { active: false, started_at: None, threshold }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Feed one reading value observed at `at`.
    pub fn evaluate(&mut self, value: f64, at: DateTime<Utc>) -> AlertTransition {
        let breached = value > self.threshold;
        match (self.active, breached) {
            (false, true) => {
                self.active = true;
                self.started_at = Some(at);
                warn!("Noise alert raised: {:.1} dB > {:.1} dB", value, self.threshold);
                AlertTransition::Raised
            }
            (true, true) => AlertTransition::Sustained,
            (true, false) => {
                self.active = false;
                self.started_at = None;
                info!("Noise alert cleared: {:.1} dB <= {:.1} dB", value, self.threshold);
                AlertTransition::Cleared
            }
            (false, false) => AlertTransition::Normal,
        }
    }
}

impl Default for AlertState {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_DB)
    }
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns it, entries are never pruned.
    pub fn record(&mut self, started_at: DateTime<Utc>, value: f64, threshold: f64) -> &AlertEntry {
        let seq = self.entries.len() as u64 + 1;
        self.entries.push(AlertEntry { seq, started_at, value, threshold });
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AlertEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&AlertEntry> {
        self.entries.last()
    }
}
