//! Error taxonomy for the betting core.
//!
//! Validation errors are terminal for the request and are reported to the
//! caller without retry. `Conflict` and `Store(Unavailable)` are produced
//! only after local bounded retries are exhausted. A repeated `settle` on an
//! already settled race is NOT an error; it reports as a successful no-op.

use thiserror::Error;

/// Failure modes of the ledger store collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
  /// The addressed record does not exist.
  #[error("record not found")]
  NotFound,
  /// Conditional update rejected: the record changed since it was read.
  #[error("version conflict")]
  VersionConflict,
  /// Transient infrastructure failure; safe to retry.
  #[error("store unavailable: {0}")]
  Unavailable(String),
}

/// Errors surfaced by the betting core to its caller.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The user does not exist.
  #[error("unknown user")]
  InvalidUser,
  /// The race does not exist.
  #[error("unknown race")]
  InvalidRace,
  /// The chosen participant is not in the race's field.
  #[error("participant not in race field")]
  InvalidParticipant,
  /// The race is no longer accepting bets.
  #[error("race is closed for betting")]
  RaceClosed,
  /// Stake exceeds the user's current balance.
  #[error("insufficient funds")]
  InsufficientFunds,
  /// Stake must be strictly positive.
  #[error("stake amount must be positive")]
  InvalidAmount,
  /// Optimistic-concurrency retries exhausted.
  #[error("concurrent update conflict, retries exhausted")]
  Conflict,
  /// Settlement requested before the race was closed.
  #[error("race has not been closed yet")]
  RaceStillOpen,
  /// A race is already open and the overlap policy rejects a second one.
  #[error("another race is already open")]
  RaceAlreadyOpen,
  /// Ledger store failure that could not be retried away.
  #[error("ledger store error: {0}")]
  Store(#[from] StoreError),
}
