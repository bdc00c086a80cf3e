/*
 *  config.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, CLI overrides
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

use clap::{Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::alert::DEFAULT_THRESHOLD_DB;
use crate::client::{data_url, DEFAULT_BASE_URL};
use crate::devices::{default_devices, DeviceBoard, DeviceConfig, DeviceError};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::scheduler::DEFAULT_POLL_INTERVAL;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 500;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1500;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub sensor: Option<SensorConfig>,
    pub monitor: Option<MonitorConfig>,
    pub devices: Option<Vec<DeviceConfig>>,
    pub selected_device: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SensorConfig {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonitorConfig {
    pub history_capacity: Option<usize>,
    pub threshold_db: Option<f64>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "noisemon", about = "NoiseMon noise level monitor", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Sensor base URL, `/data` is appended
    #[arg(long, value_hint = ValueHint::Url)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
    #[arg(long)]
    pub history_capacity: Option<usize>,
    #[arg(long)]
    pub threshold_db: Option<f64>,
    /// Device id the live sensor feed belongs to
    #[arg(long)]
    pub device: Option<String>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long)]
    pub dump_config: bool,
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn base_url(&self) -> &str {
        self.sensor.as_ref().and_then(|s| s.base_url.as_deref()).unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn poll_interval(&self) -> Duration {
        self.sensor
            .as_ref()
            .and_then(|s| s.poll_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(
            self.sensor.as_ref().and_then(|s| s.connect_timeout_ms).unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.sensor.as_ref().and_then(|s| s.request_timeout_ms).unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn history_capacity(&self) -> usize {
        self.monitor.as_ref().and_then(|m| m.history_capacity).unwrap_or(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn threshold_db(&self) -> f64 {
        self.monitor.as_ref().and_then(|m| m.threshold_db).unwrap_or(DEFAULT_THRESHOLD_DB)
    }

    /// Device board from config, stock devices when none are listed.
    pub fn device_board(&self) -> Result<DeviceBoard, ConfigError> {
        let devices = self.devices.clone().unwrap_or_else(default_devices);
        let mut board = DeviceBoard::new(devices)?;
        if let Some(id) = self.selected_device.as_deref() {
            board.select(id)?;
        }
        Ok(board)
    }
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = resolve(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Everything `load` does short of parsing argv.
pub fn resolve(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/noisemon/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/noisemon/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/noisemon.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["noisemon.yaml", "config/noisemon.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()       { dst.log_level = src.log_level; }
    if src.devices.is_some()         { dst.devices = src.devices; }
    if src.selected_device.is_some() { dst.selected_device = src.selected_device; }
    // sensor
    match (&mut dst.sensor, src.sensor) {
        (None, Some(s)) => dst.sensor = Some(s),
        (Some(d), Some(s)) => merge_sensor(d, s),
        _ => {}
    }
    // monitor
    match (&mut dst.monitor, src.monitor) {
        (None, Some(m)) => dst.monitor = Some(m),
        (Some(d), Some(m)) => merge_monitor(d, m),
        _ => {}
    }
}

fn merge_sensor(dst: &mut SensorConfig, src: SensorConfig) {
    if src.base_url.is_some()           { dst.base_url = src.base_url; }
    if src.poll_interval_ms.is_some()   { dst.poll_interval_ms = src.poll_interval_ms; }
    if src.connect_timeout_ms.is_some() { dst.connect_timeout_ms = src.connect_timeout_ms; }
    if src.request_timeout_ms.is_some() { dst.request_timeout_ms = src.request_timeout_ms; }
}

fn merge_monitor(dst: &mut MonitorConfig, src: MonitorConfig) {
    if src.history_capacity.is_some() { dst.history_capacity = src.history_capacity; }
    if src.threshold_db.is_some()     { dst.threshold_db = src.threshold_db; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.device.is_some()    { cfg.selected_device = cli.device.clone(); }

    if cli.base_url.is_some() || cli.poll_interval_ms.is_some() {
        let sensor = cfg.sensor.get_or_insert_with(SensorConfig::default);
        if cli.base_url.is_some()         { sensor.base_url = cli.base_url.clone(); }
        if cli.poll_interval_ms.is_some() { sensor.poll_interval_ms = cli.poll_interval_ms; }
    }
    if cli.history_capacity.is_some() || cli.threshold_db.is_some() {
        let monitor = cfg.monitor.get_or_insert_with(MonitorConfig::default);
        if cli.history_capacity.is_some() { monitor.history_capacity = cli.history_capacity; }
        if cli.threshold_db.is_some()     { monitor.threshold_db = cli.threshold_db; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    data_url(cfg.base_url())
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    if cfg.poll_interval().is_zero() {
        return Err(ConfigError::Validation("sensor poll_interval_ms must be > 0".into()));
    }
    if cfg.request_timeout().is_zero() || cfg.connect_timeout().is_zero() {
        return Err(ConfigError::Validation("sensor timeouts must be > 0".into()));
    }
    if cfg.history_capacity() == 0 {
        return Err(ConfigError::Validation("monitor history_capacity must be > 0".into()));
    }
    if !cfg.threshold_db().is_finite() {
        return Err(ConfigError::Validation("monitor threshold_db must be a number".into()));
    }
    // surfaces bad coordinates, duplicate ids and unknown selections
    cfg.device_board()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.base_url(), "http://localhost:5173");
        assert_eq!(cfg.poll_interval(), Duration::from_secs(2));
        assert_eq!(cfg.history_capacity(), 20);
        assert_eq!(cfg.threshold_db(), 85.0);
        assert_eq!(cfg.device_board().unwrap().devices().len(), 5);
    }

    #[test]
    fn test_yaml_then_cli_precedence() {
        let mut cfg = Config::default();
        let yaml = parse_yaml(
            "log_level: debug\nsensor:\n  base_url: http://sensor.local:5173\n  poll_interval_ms: 5000\nmonitor:\n  history_capacity: 30\n",
        ).unwrap();
        merge(&mut cfg, yaml);
        assert_eq!(cfg.history_capacity(), 30);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));

        let cli = Cli {
            poll_interval_ms: Some(1000),
            threshold_db: Some(70.0),
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.base_url(), "http://sensor.local:5173");
        assert_eq!(cfg.threshold_db(), 70.0);
        assert_eq!(cfg.history_capacity(), 30);
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn test_validation_failures() {
        let mut cfg = Config::default();
        cfg.monitor = Some(MonitorConfig { history_capacity: Some(0), threshold_db: None });
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        let mut cfg = Config::default();
        cfg.sensor = Some(SensorConfig { base_url: Some("::nope::".into()), ..Default::default() });
        assert!(validate(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.selected_device = Some("GPS-404".into());
        assert!(matches!(validate(&cfg), Err(ConfigError::Device(_))));
    }

    #[test]
    fn test_devices_from_yaml() {
        let cfg = parse_yaml(
            "devices:\n  - { id: A1, name: Plaza, lat: 41.38, lng: 2.17 }\n  - { id: B2, name: Port, lat: 41.37, lng: 2.18 }\nselected_device: B2\n",
        ).unwrap();
        let board = cfg.device_board().unwrap();
        assert_eq!(board.devices().len(), 2);
        assert_eq!(board.selected().unwrap().name, "Port");
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/noisemon.yaml")), ..Default::default() };
        assert!(matches!(resolve(&cli), Err(ConfigError::Validation(_))));
    }
}
