//! Settlement Use Case - Idempotent Pari-Mutuel Payout
//!
//! Distributes a closed race's pot to the bets that backed the winner.
//!
//! Settlement flow:
//! 1. Check preconditions (race Closed with a winner; Settled is a no-op)
//! 2. Build the payout sheet from ALL bets, so a resumed run recomputes
//!    the identical multiplier
//! 3. For each still-Pending bet: apply Paid+credit or Lost in one
//!    conditional store step; a version conflict means a concurrent
//!    invocation already took that bet — skip it
//! 4. Once no bet remains Pending, flip the race Closed→Settled with a
//!    final conditional update
//!
//! The final flag plus the per-bet conditional transitions make `settle`
//! safe to call repeatedly and concurrently (timer retry, manual
//! resettlement): side effects land at most once, and a crash mid-loop
//! resumes from the first remaining Pending bet.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::domain::error::{EngineError, StoreError};
use crate::domain::payout::PayoutSheet;
use crate::domain::race::{BetId, BetStatus, ParticipantId, RaceId, RaceStatus};
use crate::ports::ledger::{LedgerStore, Version};

/// Aggregated outcome of one `settle` invocation.
#[derive(Debug, Clone)]
pub struct SettlementReport {
  /// Race that was settled.
  pub race_id: RaceId,
  /// Winning participant (None only on an `already_settled` no-op
  /// report where the caller did not need it recomputed).
  pub winner: Option<ParticipantId>,
  /// Sum of every stake on the race.
  pub total_pot: Decimal,
  /// Sum of stakes on the winner.
  pub winning_pot: Decimal,
  /// Pot multiplier applied to winning stakes, None if unbacked winner.
  pub multiplier: Option<Decimal>,
  /// Bets this invocation transitioned to Paid.
  pub bets_paid: usize,
  /// Bets this invocation transitioned to Lost.
  pub bets_lost: usize,
  /// Pending bets another concurrent invocation settled first.
  pub bets_skipped: usize,
  /// Total credited to winners by this invocation.
  pub total_paid_out: Decimal,
  /// True when the race was already Settled on entry (no-op).
  pub already_settled: bool,
  /// Timestamp of the sweep.
  pub timestamp: DateTime<Utc>,
}

impl SettlementReport {
  fn noop(race_id: RaceId) -> Self {
    Self {
      race_id,
      winner: None,
      total_pot: Decimal::ZERO,
      winning_pot: Decimal::ZERO,
      multiplier: None,
      bets_paid: 0,
      bets_lost: 0,
      bets_skipped: 0,
      total_paid_out: Decimal::ZERO,
      already_settled: true,
      timestamp: Utc::now(),
    }
  }
}

/// Settlement engine crediting winners exactly once per race.
pub struct SettlementEngine<S: LedgerStore> {
  store: Arc<S>,
  /// Retries per store step on transient unavailability.
  max_retries: u32,
  /// Base delay between retries (exponential backoff).
  retry_base_delay: Duration,
}

impl<S: LedgerStore> SettlementEngine<S> {
  /// Create a settlement engine with default retry behavior.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
    }
  }

  /// Create with custom retry parameters.
  pub fn with_config(store: Arc<S>, max_retries: u32, retry_base_delay: Duration) -> Self {
    Self {
      store,
      max_retries,
      retry_base_delay,
    }
  }

  /// Settle a closed race: pay winners, mark losers, flip to Settled.
  ///
  /// # Errors
  /// `InvalidRace` if the race does not exist, `RaceStillOpen` if it has
  /// not been closed yet. Store failures that outlive local retries are
  /// surfaced; partial progress is never rolled back, only resumed.
  pub async fn settle(&self, race_id: RaceId) -> Result<SettlementReport, EngineError> {
    let race = self
      .store
      .get_race(race_id)
      .await?
      .ok_or(EngineError::InvalidRace)?;

    match race.record.status {
      RaceStatus::Open => return Err(EngineError::RaceStillOpen),
      RaceStatus::Settled => {
        debug!(%race_id, "Race already settled, nothing to do");
        return Ok(SettlementReport::noop(race_id));
      }
      RaceStatus::Closed => {}
    }

    let Some(winner) = race.record.winner.clone() else {
      // Closure assigns the winner in the same conditional update that
      // sets Closed, so this record is corrupt.
      error!(%race_id, "Closed race carries no winner");
      return Err(EngineError::InvalidRace);
    };

    let bets = self.store.bets_for_race(race_id).await?;
    let sheet = PayoutSheet::build(bets.iter().map(|v| &v.record), &winner);

    info!(
      %race_id,
      winner = %winner,
      total_pot = %sheet.total_pot,
      winning_pot = %sheet.winning_pot,
      multiplier = ?sheet.multiplier,
      bets = bets.len(),
      "Starting settlement"
    );
    if sheet.multiplier.is_none() {
      info!(%race_id, "Winner unbacked; all bets lose, no payouts");
    }

    let mut bets_paid = 0usize;
    let mut bets_lost = 0usize;
    let mut bets_skipped = 0usize;
    let mut total_paid_out = Decimal::ZERO;

    for vbet in bets.iter().filter(|v| v.record.is_pending()) {
      let payout = sheet.payout_for(vbet.record.id);
      let status = if payout.is_some() {
        BetStatus::Paid
      } else {
        BetStatus::Lost
      };

      match self
        .settle_bet_with_retry(vbet.record.id, vbet.version, status, payout)
        .await?
      {
        BetOutcome::Applied => {
          match status {
            BetStatus::Paid => {
              bets_paid += 1;
              total_paid_out += payout.unwrap_or_default();
              info!(
                bet_id = %vbet.record.id,
                user_id = %vbet.record.user_id,
                stake = %vbet.record.amount,
                payout = %payout.unwrap_or_default(),
                "Bet paid"
              );
            }
            _ => bets_lost += 1,
          }
        }
        BetOutcome::TakenByOther => {
          debug!(bet_id = %vbet.record.id, "Bet settled by a concurrent invocation");
          bets_skipped += 1;
        }
      }
    }

    // Every bet has left Pending (either by us or by a concurrent
    // settler); the final flag makes settlement at-most-once observable.
    self.mark_settled(race_id).await?;

    let report = SettlementReport {
      race_id,
      winner: Some(winner),
      total_pot: sheet.total_pot,
      winning_pot: sheet.winning_pot,
      multiplier: sheet.multiplier,
      bets_paid,
      bets_lost,
      bets_skipped,
      total_paid_out,
      already_settled: false,
      timestamp: Utc::now(),
    };

    info!(
      %race_id,
      paid = report.bets_paid,
      lost = report.bets_lost,
      skipped = report.bets_skipped,
      total_paid_out = %report.total_paid_out,
      "Settlement complete"
    );

    Ok(report)
  }

  /// Apply one bet's terminal transition with bounded retries on
  /// transient store failures.
  async fn settle_bet_with_retry(
    &self,
    bet_id: BetId,
    expected: Version,
    status: BetStatus,
    payout: Option<Decimal>,
  ) -> Result<BetOutcome, EngineError> {
    for attempt in 0..=self.max_retries {
      if attempt > 0 {
        tokio::time::sleep(self.retry_base_delay * 2_u32.pow(attempt - 1)).await;
      }
      match self.store.settle_bet(bet_id, expected, status, payout).await {
        Ok(()) => return Ok(BetOutcome::Applied),
        Err(StoreError::VersionConflict) => return Ok(BetOutcome::TakenByOther),
        Err(StoreError::Unavailable(reason)) => {
          warn!(%bet_id, %reason, attempt, "Store unavailable during bet settlement");
        }
        Err(e) => return Err(e.into()),
      }
    }
    Err(EngineError::Store(StoreError::Unavailable(
      "bet settlement retries exhausted".to_string(),
    )))
  }

  /// Flip the race Closed→Settled; losing the flip to a concurrent
  /// settler is success.
  async fn mark_settled(&self, race_id: RaceId) -> Result<(), EngineError> {
    let fresh = self
      .store
      .get_race(race_id)
      .await?
      .ok_or(EngineError::InvalidRace)?;
    if fresh.record.status != RaceStatus::Closed {
      return Ok(());
    }

    let mut settled = fresh.record;
    settled.status = RaceStatus::Settled;
    match self.store.put_race(fresh.version, settled).await {
      Ok(_) => Ok(()),
      Err(StoreError::VersionConflict) => {
        debug!(%race_id, "Lost the Settled flip to a concurrent invocation");
        Ok(())
      }
      Err(e) => Err(e.into()),
    }
  }
}

/// Outcome of one per-bet settlement step.
enum BetOutcome {
  /// This invocation applied the transition (and credit, for Paid).
  Applied,
  /// The bet's version moved: a concurrent invocation settled it.
  TakenByOther,
}
