//! Race Scheduler Use Case - Serialized Race Lifecycles
//!
//! Drives race creation and closure on a fixed cadence. Instead of a
//! fire-and-forget interval timer that opens a new race every period
//! regardless of outstanding state, the scheduler owns one outstanding
//! lifecycle at a time: open → betting window → close → settle → idle →
//! next. Overlapping opens are rejected or queued per
//! configuration, and the single-open-race invariant is enforced
//! atomically by the store's conditional race insert.
//!
//! Closure draws the winner uniformly (probability 1/N per participant)
//! and commits it in a single conditional update that only applies while
//! the race is still Open, so overlapping timers or manual retriggers
//! cannot re-draw a winner or re-invoke settlement.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{OverlapPolicy, SchedulerConfig};
use crate::domain::error::{EngineError, StoreError};
use crate::domain::race::{ParticipantId, Race, RaceId, RaceStatus};
use crate::ports::ledger::LedgerStore;
use crate::usecases::settlement::SettlementEngine;

/// Scheduler owning the race lifecycle state machine.
pub struct RaceScheduler<S: LedgerStore> {
  store: Arc<S>,
  settlement: Arc<SettlementEngine<S>>,
  /// Period between race openings.
  cadence: Duration,
  /// Betting window length; closure fires this long after opening.
  closure_delay: Duration,
  /// Number of participants sampled into each race.
  field_size: usize,
  /// What to do when a race is already open.
  overlap_policy: OverlapPolicy,
}

impl<S: LedgerStore> RaceScheduler<S> {
  /// Create a scheduler from config.
  pub fn new(
    store: Arc<S>,
    settlement: Arc<SettlementEngine<S>>,
    config: &SchedulerConfig,
  ) -> Self {
    Self {
      store,
      settlement,
      cadence: Duration::from_secs(config.cadence_secs),
      closure_delay: Duration::from_secs(config.closure_delay_secs),
      field_size: config.field_size,
      overlap_policy: config.overlap_policy,
    }
  }

  /// Open a new race over a freshly sampled field.
  ///
  /// # Errors
  /// `RaceAlreadyOpen` when another race is open and the overlap policy
  /// is `Reject` (or the `Queue` wait expired); store failures surface.
  pub async fn open_race(&self) -> Result<RaceId, EngineError> {
    match self.overlap_policy {
      OverlapPolicy::Reject => self.try_open().await,
      OverlapPolicy::Queue => {
        // Wait at most one full cycle for the outstanding race to end.
        let deadline = Instant::now() + self.closure_delay + self.cadence;
        loop {
          match self.try_open().await {
            Err(EngineError::RaceAlreadyOpen) if Instant::now() < deadline => {
              sleep(Duration::from_millis(500)).await;
            }
            other => return other,
          }
        }
      }
    }
  }

  async fn try_open(&self) -> Result<RaceId, EngineError> {
    let field = self.store.sample_participants(self.field_size).await?;
    let race = Race::open(field);
    match self.store.insert_race(race.clone()).await {
      Ok(()) => {
        info!(
          race_id = %race.id,
          field = ?race.participants,
          "Race opened"
        );
        Ok(race.id)
      }
      Err(StoreError::VersionConflict) => Err(EngineError::RaceAlreadyOpen),
      Err(e) => Err(e.into()),
    }
  }

  /// Close a race: draw the winner and commit it, then settle.
  ///
  /// Returns the winner, or `None` when the race was already closed by
  /// someone else (the double-closure guard: no re-draw, no re-settle).
  pub async fn close_race(
    &self,
    race_id: RaceId,
  ) -> Result<Option<ParticipantId>, EngineError> {
    let race = self
      .store
      .get_race(race_id)
      .await?
      .ok_or(EngineError::InvalidRace)?;

    if race.record.status != RaceStatus::Open {
      debug!(%race_id, status = %race.record.status, "Race already closed, leaving winner untouched");
      return Ok(None);
    }
    if race.record.participants.is_empty() {
      error!(%race_id, "Open race has an empty field");
      return Err(EngineError::InvalidRace);
    }

    // Uniform draw: each participant wins with probability 1/N.
    let idx = rand::thread_rng().gen_range(0..race.record.participants.len());
    let winner = race.record.participants[idx].clone();

    let mut closed = race.record;
    closed.status = RaceStatus::Closed;
    closed.winner = Some(winner.clone());
    match self.store.put_race(race.version, closed).await {
      Ok(_) => {}
      Err(StoreError::VersionConflict) => {
        info!(%race_id, "Lost the closure update to a concurrent closer");
        return Ok(None);
      }
      Err(e) => return Err(e.into()),
    }

    info!(%race_id, winner = %winner, "Race closed");

    self.settlement.settle(race_id).await?;
    Ok(Some(winner))
  }

  /// Run serialized race lifecycles until shutdown.
  pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), EngineError> {
    info!(
      cadence_secs = self.cadence.as_secs(),
      closure_delay_secs = self.closure_delay.as_secs(),
      field_size = self.field_size,
      "Race scheduler started"
    );

    loop {
      let race_id = match self.open_race().await {
        Ok(id) => Some(id),
        Err(EngineError::RaceAlreadyOpen) => self.adopt_stray_race().await,
        Err(e) => {
          error!(error = %e, "Failed to open race, skipping cycle");
          None
        }
      };

      // Betting window.
      tokio::select! {
        biased;
        _ = shutdown.recv() => {
          info!("Scheduler received shutdown during betting window");
          break;
        }
        _ = sleep(self.closure_delay) => {}
      }

      if let Some(race_id) = race_id {
        if let Err(e) = self.close_race(race_id).await {
          error!(%race_id, error = %e, "Race closure failed");
        }
      }

      // Idle out the remainder of the cadence.
      if self.cadence > self.closure_delay {
        tokio::select! {
          biased;
          _ = shutdown.recv() => {
            info!("Scheduler received shutdown while idle");
            break;
          }
          _ = sleep(self.cadence - self.closure_delay) => {}
        }
      }
    }

    info!("Race scheduler stopped");
    Ok(())
  }

  /// A race was open when we tried to open ours (previous process run,
  /// or a manual open): take over its closure instead of stacking a
  /// second lifecycle on top.
  async fn adopt_stray_race(&self) -> Option<RaceId> {
    match self.store.find_open_race().await {
      Ok(Some(stray)) => {
        warn!(race_id = %stray.record.id, "Adopting already-open race");
        Some(stray.record.id)
      }
      Ok(None) => None,
      Err(e) => {
        error!(error = %e, "Failed to look up the open race");
        None
      }
    }
  }
}
