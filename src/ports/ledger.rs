//! Ledger Store Port - Durable Record Storage Interface
//!
//! The external store holds User, Race, and Bet records and must offer
//! atomic conditional updates on a single record. Every read returns the
//! record together with an opaque version token; every write is
//! conditioned on that token and fails with `VersionConflict` when the
//! record changed in between. The use cases never lock; all mutual
//! exclusion flows through these conditional updates.
//!
//! Two methods intentionally touch a second record in one atomic step,
//! because per-record CAS alone cannot express them without a race:
//! - `insert_bet` is guarded by the Race record's version, closing the
//!   admitted-after-close window (a closure bumps the race version, so a
//!   guarded insert taken against the open race fails).
//! - `settle_bet` applies the bet's terminal status and the winner's
//!   credit together, so a crash mid-settlement never splits the two.
//! On document stores both collapse to a single conditional transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::error::StoreError;
use crate::domain::race::{Bet, BetId, BetStatus, ParticipantId, Race, RaceId, User, UserId};

/// Monotonic per-record version used as the optimistic-concurrency token.
pub type Version = u64;

/// A record paired with the version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
  /// Version token to condition the next write on.
  pub version: Version,
  /// The record itself.
  pub record: T,
}

/// Trait for the durable ledger collaborator.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
  // ── Users ───────────────────────────────────────────────

  /// Register a new user record (deposits/registrations are the only
  /// non-conserving ledger movements).
  async fn insert_user(&self, user: User) -> Result<(), StoreError>;

  /// Read a user with its version token.
  async fn get_user(&self, id: UserId) -> Result<Option<Versioned<User>>, StoreError>;

  /// Replace a user record iff its version still equals `expected`.
  async fn put_user(&self, expected: Version, user: User) -> Result<Version, StoreError>;

  /// Atomically increment a user's balance (payout credit or
  /// compensating refund). Increments need no token.
  async fn credit_user(&self, id: UserId, amount: Decimal) -> Result<(), StoreError>;

  // ── Races ───────────────────────────────────────────────

  /// Persist a freshly opened race. Fails with `VersionConflict` if
  /// another race is currently `Open` (single-open-race invariant).
  async fn insert_race(&self, race: Race) -> Result<(), StoreError>;

  /// Read a race with its version token.
  async fn get_race(&self, id: RaceId) -> Result<Option<Versioned<Race>>, StoreError>;

  /// Replace a race record iff its version still equals `expected`.
  async fn put_race(&self, expected: Version, race: Race) -> Result<Version, StoreError>;

  /// The currently open race, if any.
  async fn find_open_race(&self) -> Result<Option<Versioned<Race>>, StoreError>;

  // ── Bets ────────────────────────────────────────────────

  /// Insert a pending bet iff the referenced race record still carries
  /// `race_version`. Fails with `VersionConflict` when the race changed
  /// (i.e. closed) since the caller read it.
  async fn insert_bet(&self, bet: Bet, race_version: Version) -> Result<(), StoreError>;

  /// Read a bet with its version token.
  async fn get_bet(&self, id: BetId) -> Result<Option<Versioned<Bet>>, StoreError>;

  /// All bets placed on a race, any status.
  async fn bets_for_race(&self, race_id: RaceId) -> Result<Vec<Versioned<Bet>>, StoreError>;

  /// Move a bet out of `Pending` and, for `Paid`, credit the owner with
  /// `payout` in the same atomic step. Conditioned on the bet's version;
  /// a conflict means another settlement invocation already did it.
  async fn settle_bet(
    &self,
    bet_id: BetId,
    expected: Version,
    status: BetStatus,
    payout: Option<Decimal>,
  ) -> Result<(), StoreError>;

  // ── Participants ────────────────────────────────────────

  /// Sample `n` distinct participant identifiers uniformly at random
  /// from the reference pool.
  async fn sample_participants(&self, n: usize) -> Result<Vec<ParticipantId>, StoreError>;

  /// Check if the store is reachable and healthy.
  async fn is_healthy(&self) -> bool;
}
