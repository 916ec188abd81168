//! Bet Admission Use Case - Atomic Wager Acceptance
//!
//! Validates a wager and records it while reserving the stake exactly
//! once. A check-then-write sequence (read race, read
//! balance, then insert and debit separately) admits bets after closure
//! and lets balances go negative under concurrency; admission here runs
//! an optimistic-concurrency loop instead:
//!
//! 1. Read the race (version Vr) and the user (version Vu); validate.
//! 2. Debit the user conditioned on Vu — a concurrent debit bumps the
//!    version and forces a re-read, so the balance check and the debit
//!    can never disagree.
//! 3. Insert the bet guarded by Vr — a closure bumps the race version,
//!    so the insert fails, the debit is compensated, and the re-read
//!    observes `Closed`.
//!
//! Conflicts and transient store failures retry with bounded exponential
//! backoff; exhaustion surfaces `Conflict` for contention and
//! `Store(Unavailable)` for an outage.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::BettingConfig;
use crate::domain::error::{EngineError, StoreError};
use crate::domain::race::{Bet, BetId, ParticipantId, RaceId, UserId};
use crate::ports::ledger::LedgerStore;

/// Accepts wagers against the shared balance ledger.
pub struct BetAdmission<S: LedgerStore> {
  store: Arc<S>,
  /// Maximum optimistic-concurrency retries per request.
  max_retries: u32,
  /// Base delay between retries (exponential backoff).
  retry_base_delay: Duration,
}

impl<S: LedgerStore> BetAdmission<S> {
  /// Create a new admission gate over the ledger store.
  pub fn new(store: Arc<S>, config: &BettingConfig) -> Self {
    Self {
      store,
      max_retries: config.max_retries,
      retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
    }
  }

  /// Place a bet: validate, debit the stake, record the wager.
  ///
  /// # Errors
  /// `InvalidAmount`, `InvalidUser`, `InvalidRace`, `RaceClosed`,
  /// `InvalidParticipant`, `InsufficientFunds` are terminal validation
  /// failures. Exhausted retries return `Conflict` when the last attempt
  /// lost a version race and `Store(Unavailable)` when the store was the
  /// problem.
  pub async fn place_bet(
    &self,
    user_id: UserId,
    race_id: RaceId,
    participant: ParticipantId,
    amount: Decimal,
  ) -> Result<BetId, EngineError> {
    if amount <= Decimal::ZERO {
      return Err(EngineError::InvalidAmount);
    }

    // Cause of the most recent failed attempt; decides what exhaustion
    // surfaces as (contention vs. store outage).
    let mut last_unavailable: Option<String> = None;

    for attempt in 0..=self.max_retries {
      if attempt > 0 {
        let delay = self.retry_base_delay * 2_u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying bet admission");
        tokio::time::sleep(delay).await;
      }

      let race = match self.store.get_race(race_id).await {
        Ok(Some(race)) => race,
        Ok(None) => return Err(EngineError::InvalidRace),
        Err(StoreError::Unavailable(reason)) => {
          warn!(%reason, attempt, "Store unavailable reading race");
          last_unavailable = Some(reason);
          continue;
        }
        Err(e) => return Err(e.into()),
      };
      if !race.record.is_open() {
        return Err(EngineError::RaceClosed);
      }
      if !race.record.has_participant(&participant) {
        return Err(EngineError::InvalidParticipant);
      }

      let user = match self.store.get_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(EngineError::InvalidUser),
        Err(StoreError::Unavailable(reason)) => {
          warn!(%reason, attempt, "Store unavailable reading user");
          last_unavailable = Some(reason);
          continue;
        }
        Err(e) => return Err(e.into()),
      };
      if user.record.balance < amount {
        return Err(EngineError::InsufficientFunds);
      }

      // Conditional debit: commits the reservation or forces a re-read.
      let mut debited = user.record;
      debited.balance -= amount;
      match self.store.put_user(user.version, debited).await {
        Ok(_) => {}
        Err(StoreError::VersionConflict) => {
          debug!(%user_id, attempt, "Balance changed under us, re-reading");
          last_unavailable = None;
          continue;
        }
        Err(StoreError::Unavailable(reason)) => {
          warn!(%reason, attempt, "Store unavailable during debit");
          last_unavailable = Some(reason);
          continue;
        }
        Err(e) => return Err(e.into()),
      }

      let bet = Bet::pending(user_id, race_id, participant.clone(), amount);
      match self.store.insert_bet(bet.clone(), race.version).await {
        Ok(()) => {
          info!(
            bet_id = %bet.id,
            %user_id,
            %race_id,
            participant = %bet.participant,
            amount = %amount,
            "Bet admitted"
          );
          return Ok(bet.id);
        }
        Err(StoreError::VersionConflict) => {
          // Race record changed since the read; undo the reservation
          // and re-evaluate (the re-read will see Closed, or retry).
          self.refund(user_id, amount).await?;
          debug!(%race_id, attempt, "Race changed before bet insert, refunded stake");
          last_unavailable = None;
          continue;
        }
        Err(e) => {
          self.refund(user_id, amount).await?;
          return Err(e.into());
        }
      }
    }

    warn!(%user_id, %race_id, "Bet admission retries exhausted");
    match last_unavailable {
      Some(reason) => Err(EngineError::Store(StoreError::Unavailable(reason))),
      None => Err(EngineError::Conflict),
    }
  }

  /// Compensating credit for a debit whose bet insert did not land.
  async fn refund(&self, user_id: UserId, amount: Decimal) -> Result<(), EngineError> {
    self
      .store
      .credit_user(user_id, amount)
      .await
      .map_err(EngineError::from)
  }
}
