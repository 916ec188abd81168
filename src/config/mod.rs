//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml`. The participant
//! pool, race cadence, and retry parameters are externalized here -
//! nothing is hardcoded in the domain layer.

pub mod loader;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level engine configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the engine begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Engine identity and logging.
  pub engine: EngineConfig,
  /// Race lifecycle cadence and field sizing.
  pub scheduler: SchedulerConfig,
  /// Bet admission retry parameters.
  pub betting: BettingConfig,
  /// Participant reference pool.
  pub pool: PoolConfig,
  /// Users seeded into the ledger at startup with an opening balance.
  #[serde(default)]
  pub seed_users: Vec<SeedUserConfig>,
}

/// Engine identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Human-readable engine name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// What `open_race` does when a race is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
  /// Fail the open with `RaceAlreadyOpen`.
  Reject,
  /// Wait (bounded) for the outstanding race to finish, then open.
  Queue,
}

/// Race scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
  /// Period between race openings, in seconds.
  #[serde(default = "default_cadence_secs")]
  pub cadence_secs: u64,
  /// Betting window length, in seconds. Must not exceed the cadence.
  #[serde(default = "default_cadence_secs")]
  pub closure_delay_secs: u64,
  /// Participants sampled into each race.
  #[serde(default = "default_field_size")]
  pub field_size: usize,
  /// Overlap handling for `open_race`.
  #[serde(default = "default_overlap_policy")]
  pub overlap_policy: OverlapPolicy,
}

/// Bet admission configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BettingConfig {
  /// Maximum optimistic-concurrency retries per bet request.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries in milliseconds (exponential backoff).
  #[serde(default = "default_retry_base_delay_ms")]
  pub retry_base_delay_ms: u64,
}

/// Participant reference pool.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
  /// Opaque participant identifiers available for sampling.
  pub participants: Vec<String>,
}

/// A user registered at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUserConfig {
  /// Display name.
  pub name: String,
  /// Opening balance.
  pub balance: Decimal,
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_cadence_secs() -> u64 {
  30
}

fn default_field_size() -> usize {
  5
}

fn default_overlap_policy() -> OverlapPolicy {
  OverlapPolicy::Reject
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_base_delay_ms() -> u64 {
  200
}
