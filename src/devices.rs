/*
 *  devices.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Device board - the GPS tagged sensor units and their live status
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
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error("Unknown device id: {0}")]
    UnknownDevice(String),
    #[error("Invalid coordinates for {id}: ({lat}, {lng})")]
    InvalidCoordinates { id: String, lat: f64, lng: f64 },
    #[error("Duplicate device id: {0}")]
    DuplicateId(String),
}

/// Device entry as it appears in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl DeviceConfig {
    pub fn new(id: &str, name: &str, lat: f64, lng: f64) -> Self {
        Self { id: id.to_string(), name: name.to_string(), lat, lng }
    }

    pub fn validate(&self) -> Result<(), DeviceError> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(DeviceError::InvalidCoordinates {
                id: self.id.clone(),
                lat: self.lat,
                lng: self.lng,
            });
        }
        Ok(())
    }
}

/// The stock five unit deployment used when nothing is configured.
pub fn default_devices() -> Vec<DeviceConfig> {
    vec![
        DeviceConfig::new("GPS-001", "North unit", 40.7128, -74.006),
        DeviceConfig::new("GPS-002", "South unit", 40.758, -73.9855),
        DeviceConfig::new("GPS-003", "East unit", 40.7489, -73.968),
        DeviceConfig::new("GPS-004", "West unit", 40.7282, -74.0776),
        DeviceConfig::new("GPS-005", "Central unit", 40.741, -73.9896),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Critical,
    Offline,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Active => write!(f, "active"),
            DeviceStatus::Critical => write!(f, "critical"),
            DeviceStatus::Offline => write!(f, "offline"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub noise_level: Option<f64>,
    pub status: DeviceStatus,
    pub last_update: Option<DateTime<Utc>>,
}

impl From<DeviceConfig> for Device {
    fn from(cfg: DeviceConfig) -> Self {
        Self {
            id: cfg.id,
            name: cfg.name,
            lat: cfg.lat,
            lng: cfg.lng,
            noise_level: None,
            status: DeviceStatus::Active,
            last_update: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardSummary {
    pub total: usize,
    pub active: usize,
    pub critical: usize,
}

/// Known devices plus which one the live sensor feed belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceBoard {
    devices: Vec<Device>,
    selected: Option<usize>,
}

impl DeviceBoard {
    /// Validates every entry, the first device starts selected.
    pub fn new(configs: Vec<DeviceConfig>) -> Result<Self, DeviceError> {
        let mut devices: Vec<Device> = Vec::with_capacity(configs.len());
        for cfg in configs {
            cfg.validate()?;
            if devices.iter().any(|d| d.id == cfg.id) {
                return Err(DeviceError::DuplicateId(cfg.id));
            }
            devices.push(cfg.into());
        }
        let selected = if devices.is_empty() { None } else { Some(0) };
        debug!("Device board loaded with {} devices", devices.len());
        Ok(Self { devices, selected })
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn selected(&self) -> Option<&Device> {
        self.selected.map(|i| &self.devices[i])
    }

    /// Unknown ids leave the current selection alone.
    pub fn select(&mut self, id: &str) -> Result<(), DeviceError> {
        let idx = self
            .devices
            .iter()
            .position(|d| d.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| DeviceError::UnknownDevice(id.to_string()))?;
        if self.selected != Some(idx) {
            info!("Selected device: {} ({})", self.devices[idx].name, self.devices[idx].id);
        }
        self.selected = Some(idx);
        Ok(())
    }

    /// Applies a live reading to the selected device.
    pub fn apply_reading(&mut self, value: f64, at: DateTime<Utc>, alert_active: bool) {
        if let Some(i) = self.selected {
            let device = &mut self.devices[i];
            device.noise_level = Some(value);
            device.last_update = Some(at);
            device.status = if alert_active { DeviceStatus::Critical } else { DeviceStatus::Active };
        }
    }

    pub fn summary(&self) -> BoardSummary {
        self.devices.iter().fold(
            BoardSummary { total: self.devices.len(), ..Default::default() },
            |mut s, d| {
                match d.status {
                    DeviceStatus::Active => s.active += 1,
                    DeviceStatus::Critical => s.critical += 1,
                    DeviceStatus::Offline => {}
                }
                s
            },
        )
    }
}

impl Default for DeviceBoard {
    fn default() -> Self {
        Self {
            devices: default_devices().into_iter().map(Device::from).collect(),
            selected: Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_board() {
        let board = DeviceBoard::default();
        assert_eq!(board.devices().len(), 5);
        assert_eq!(board.selected().unwrap().id, "GPS-001");
        assert_eq!(board.summary(), BoardSummary { total: 5, active: 5, critical: 0 });
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let result = DeviceBoard::new(vec![DeviceConfig::new("X", "bad", 100.0, 0.0)]);
        assert!(matches!(result, Err(DeviceError::InvalidCoordinates { .. })));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = DeviceBoard::new(vec![
            DeviceConfig::new("A", "one", 1.0, 1.0),
            DeviceConfig::new("A", "two", 2.0, 2.0),
        ]);
        assert_eq!(result.unwrap_err(), DeviceError::DuplicateId("A".into()));
    }

    #[test]
    fn test_select_unknown_keeps_selection() {
        let mut board = DeviceBoard::default();
        board.select("gps-003").unwrap();
        assert_eq!(board.selected().unwrap().id, "GPS-003");
        assert!(board.select("GPS-999").is_err());
        assert_eq!(board.selected().unwrap().id, "GPS-003");
    }

    #[test]
    fn test_reading_marks_selected_critical() {
        let mut board = DeviceBoard::default();
        let now = Utc::now();
        board.apply_reading(92.0, now, true);
        let selected = board.selected().unwrap();
        assert_eq!(selected.noise_level, Some(92.0));
        assert_eq!(selected.status, DeviceStatus::Critical);
        assert_eq!(board.summary().critical, 1);

        board.apply_reading(50.0, now, false);
        assert_eq!(board.summary().critical, 0);
    }

    #[test]
    fn test_empty_board_ignores_readings() {
        let mut board = DeviceBoard::new(Vec::new()).unwrap();
        board.apply_reading(70.0, Utc::now(), false);
        assert!(board.selected().is_none());
        assert_eq!(board.summary().total, 0);
    }
}
