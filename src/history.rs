/*
 *  history.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Rolling history window feeding the chart
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

use std::collections::VecDeque;

use crate::reading::HistoryPoint;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Most-recent-N history points, oldest evicted first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWindow {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

/// Summary over the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub average: f64,
    pub peak: f64,
    pub minimum: f64,
    pub count: usize,
}

impl HistoryWindow {
    /// A zero capacity is bumped to one so the latest point is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, point: HistoryPoint) {
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Average is rounded to two decimals, as the sensor backend reports it.
    pub fn stats(&self) -> Option<WindowStats> {
        if self.points.is_empty() {
            return None;
        }
        let (sum, peak, minimum) = self.points.iter().fold(
            (0.0, f64::NEG_INFINITY, f64::INFINITY),
            |(sum, peak, min), p| (sum + p.value, peak.max(p.value), min.min(p.value)),
        );
        let count = self.points.len();
        Some(WindowStats {
            average: ((sum / count as f64) * 100.0).round() / 100.0,
            peak,
            minimum,
            count,
        })
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
