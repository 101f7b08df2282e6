//! Configuration for the launchpad binary
//!
//! Handles loading and saving of the YAML configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Device connection
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeviceConfig {
    /// Passed to the transport unmodified (port name pattern for midir)
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_true")]
    pub nonblocking: bool,
}

/// Reaction game settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DemoConfig {
    /// Game ticks per second
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// New pads per second at the start
    #[serde(default = "default_spawn_rate")]
    pub spawn_rate: f64,
    /// Added to the spawn rate on every hit
    #[serde(default = "default_spawn_rate_step")]
    pub spawn_rate_step: f64,
    #[serde(default = "default_seed")]
    pub seed: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            nonblocking: default_true(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            spawn_rate: default_spawn_rate(),
            spawn_rate_step: default_spawn_rate_step(),
            seed: default_seed(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            warn!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.device.address.trim().is_empty() {
            anyhow::bail!("device.address must not be empty");
        }
        let demo = &self.demo;
        if !demo.fps.is_finite() || demo.fps <= 0.0 {
            anyhow::bail!("demo.fps must be positive and finite (got {})", demo.fps);
        }
        // The game ticker needs a representable, non-zero period
        match Duration::try_from_secs_f64(1.0 / demo.fps) {
            Ok(period) if !period.is_zero() => {}
            _ => anyhow::bail!("demo.fps is out of range (got {})", demo.fps),
        }
        if !demo.spawn_rate.is_finite() || demo.spawn_rate <= 0.0 {
            anyhow::bail!(
                "demo.spawn_rate must be positive and finite (got {})",
                demo.spawn_rate
            );
        }
        if !demo.spawn_rate_step.is_finite() || demo.spawn_rate_step < 0.0 {
            anyhow::bail!(
                "demo.spawn_rate_step must be zero or more and finite (got {})",
                demo.spawn_rate_step
            );
        }
        Ok(())
    }
}

// Default value functions
fn default_address() -> String { "Launchpad S".to_string() }
fn default_true() -> bool { true }
fn default_fps() -> f64 { 30.0 }
fn default_spawn_rate() -> f64 { 0.5 }
fn default_spawn_rate_step() -> f64 { 0.1 }
fn default_seed() -> u32 { 1337 }
