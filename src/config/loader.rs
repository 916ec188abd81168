//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    cadence_secs = config.scheduler.cadence_secs,
    field_size = config.scheduler.field_size,
    pool = config.pool.participants.len(),
    seed_users = config.seed_users.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.engine.name.is_empty(), "Engine name must not be empty");

  // Scheduler validation
  anyhow::ensure!(
    config.scheduler.cadence_secs > 0,
    "Scheduler cadence must be positive"
  );
  anyhow::ensure!(
    config.scheduler.closure_delay_secs > 0,
    "Closure delay must be positive"
  );
  anyhow::ensure!(
    config.scheduler.closure_delay_secs <= config.scheduler.cadence_secs,
    "Closure delay ({} s) must not exceed the cadence ({} s)",
    config.scheduler.closure_delay_secs,
    config.scheduler.cadence_secs
  );
  anyhow::ensure!(
    config.scheduler.field_size >= 2,
    "Field size must be at least 2, got {}",
    config.scheduler.field_size
  );

  // Pool validation
  anyhow::ensure!(
    config.pool.participants.len() >= config.scheduler.field_size,
    "Participant pool ({}) is smaller than the field size ({})",
    config.pool.participants.len(),
    config.scheduler.field_size
  );
  let mut seen = HashSet::new();
  for participant in &config.pool.participants {
    anyhow::ensure!(!participant.is_empty(), "Participant IDs must not be empty");
    anyhow::ensure!(
      seen.insert(participant),
      "Duplicate participant in pool: {participant}"
    );
  }

  // Betting validation
  anyhow::ensure!(
    config.betting.max_retries <= 10,
    "max_retries must be at most 10, got {}",
    config.betting.max_retries
  );
  anyhow::ensure!(
    config.betting.retry_base_delay_ms > 0,
    "retry_base_delay_ms must be positive"
  );

  // Seed user validation
  let mut names = HashSet::new();
  for (i, user) in config.seed_users.iter().enumerate() {
    anyhow::ensure!(!user.name.is_empty(), "Seed user {i} has an empty name");
    anyhow::ensure!(
      user.balance >= Decimal::ZERO,
      "Seed user {} has a negative opening balance",
      user.name
    );
    anyhow::ensure!(
      names.insert(user.name.to_lowercase()),
      "Duplicate seed user name: {}",
      user.name
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_validate_rejects_oversized_field() {
    let config: AppConfig = toml::from_str(
      r#"
      [engine]
      name = "test"

      [scheduler]
      field_size = 6

      [betting]

      [pool]
      participants = ["h1", "h2", "h3"]
      "#,
    )
    .unwrap();
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_validate_accepts_defaults() {
    let config: AppConfig = toml::from_str(
      r#"
      [engine]
      name = "test"

      [scheduler]

      [betting]

      [pool]
      participants = ["h1", "h2", "h3", "h4", "h5", "h6"]

      [[seed_users]]
      name = "alice"
      balance = 100
      "#,
    )
    .unwrap();
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.scheduler.cadence_secs, 30);
    assert_eq!(config.scheduler.field_size, 5);
    assert_eq!(config.betting.max_retries, 3);
  }

  #[test]
  fn test_validate_rejects_duplicate_participants() {
    let config: AppConfig = toml::from_str(
      r#"
      [engine]
      name = "test"

      [scheduler]
      field_size = 2

      [betting]

      [pool]
      participants = ["h1", "h1"]
      "#,
    )
    .unwrap();
    assert!(validate_config(&config).is_err());
  }
}
