// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Configuration for the heartbeat scheduler.
///
/// The scheduler wakes on every tick and broadcasts a heartbeat to all live
/// connections every `ticks_per_beat` ticks.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HeartbeatConfig {
    /// The fixed period of the scheduler tick.
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,
    /// How many ticks elapse between heartbeat broadcasts.
    #[serde(default = "default_ticks_per_beat")]
    pub ticks_per_beat: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            ticks_per_beat: default_ticks_per_beat(),
        }
    }
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(50)
}
fn default_ticks_per_beat() -> u32 {
    100 // 50ms * 100 = one heartbeat every 5 seconds
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Depth of each connection's outbound send queue. Producers block when
    /// the queue is full; messages are never dropped.
    #[serde(default = "default_outbound_queue_depth")]
    pub outbound_queue_depth: usize,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    4000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    1024
}
fn default_outbound_queue_depth() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            outbound_queue_depth: default_outbound_queue_depth(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        if self.outbound_queue_depth == 0 {
            return Err(anyhow!("outbound_queue_depth cannot be 0"));
        }
        if self.heartbeat.tick_interval.is_zero() {
            return Err(anyhow!("heartbeat.tick_interval cannot be 0"));
        }
        if self.heartbeat.ticks_per_beat == 0 {
            return Err(anyhow!("heartbeat.ticks_per_beat cannot be 0"));
        }
        Ok(())
    }
}
