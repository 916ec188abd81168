//! In-Memory Ledger - Concrete Adapter for the LedgerStore Port
//!
//! HashMap tables with a monotonic version counter per record, all
//! guarded by a single async mutex so every port method is one atomic
//! step — exactly the compare-and-update contract a durable document
//! store would provide. Used by the binary, the integration tests, and
//! the benchmarks.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::domain::error::StoreError;
use crate::domain::race::{
    Bet, BetId, BetStatus, ParticipantId, Race, RaceId, RaceStatus, User, UserId,
};
use crate::ports::ledger::{LedgerStore, Version, Versioned};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, Versioned<User>>,
    races: HashMap<RaceId, Versioned<Race>>,
    bets: HashMap<BetId, Versioned<Bet>>,
    pool: Vec<ParticipantId>,
}

/// In-process ledger store with per-record optimistic concurrency.
pub struct MemoryLedger {
    tables: Mutex<Tables>,
}

impl MemoryLedger {
    /// Create a ledger seeded with the participant reference pool.
    pub fn new(pool: Vec<ParticipantId>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                pool,
                ..Tables::default()
            }),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::VersionConflict);
        }
        tables.users.insert(
            user.id,
            Versioned {
                version: 1,
                record: user,
            },
        );
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<Versioned<User>>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn put_user(&self, expected: Version, user: User) -> Result<Version, StoreError> {
        let mut tables = self.tables.lock().await;
        let entry = tables.users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        if entry.version != expected {
            return Err(StoreError::VersionConflict);
        }
        entry.version += 1;
        entry.record = user;
        Ok(entry.version)
    }

    async fn credit_user(&self, id: UserId, amount: Decimal) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let entry = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        entry.record.balance += amount;
        entry.version += 1;
        Ok(())
    }

    async fn insert_race(&self, race: Race) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .races
            .values()
            .any(|r| r.record.status == RaceStatus::Open)
        {
            return Err(StoreError::VersionConflict);
        }
        tables.races.insert(
            race.id,
            Versioned {
                version: 1,
                record: race,
            },
        );
        Ok(())
    }

    async fn get_race(&self, id: RaceId) -> Result<Option<Versioned<Race>>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.races.get(&id).cloned())
    }

    async fn put_race(&self, expected: Version, race: Race) -> Result<Version, StoreError> {
        let mut tables = self.tables.lock().await;
        let entry = tables.races.get_mut(&race.id).ok_or(StoreError::NotFound)?;
        if entry.version != expected {
            return Err(StoreError::VersionConflict);
        }
        entry.version += 1;
        entry.record = race;
        Ok(entry.version)
    }

    async fn find_open_race(&self) -> Result<Option<Versioned<Race>>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .races
            .values()
            .find(|r| r.record.status == RaceStatus::Open)
            .cloned())
    }

    async fn insert_bet(&self, bet: Bet, race_version: Version) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let race = tables.races.get(&bet.race_id).ok_or(StoreError::NotFound)?;
        // The guard, not a bump: concurrent bets against the same open
        // race all pass; only a closure invalidates the token.
        if race.version != race_version {
            return Err(StoreError::VersionConflict);
        }
        tables.bets.insert(
            bet.id,
            Versioned {
                version: 1,
                record: bet,
            },
        );
        Ok(())
    }

    async fn get_bet(&self, id: BetId) -> Result<Option<Versioned<Bet>>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.bets.get(&id).cloned())
    }

    async fn bets_for_race(&self, race_id: RaceId) -> Result<Vec<Versioned<Bet>>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bets
            .values()
            .filter(|b| b.record.race_id == race_id)
            .cloned()
            .collect())
    }

    async fn settle_bet(
        &self,
        bet_id: BetId,
        expected: Version,
        status: BetStatus,
        payout: Option<Decimal>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let user_id = {
            let entry = tables.bets.get_mut(&bet_id).ok_or(StoreError::NotFound)?;
            if entry.version != expected {
                return Err(StoreError::VersionConflict);
            }
            entry.version += 1;
            entry.record.status = status;
            entry.record.payout = payout;
            entry.record.user_id
        };
        if let Some(amount) = payout {
            let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
            user.record.balance += amount;
            user.version += 1;
        }
        Ok(())
    }

    async fn sample_participants(&self, n: usize) -> Result<Vec<ParticipantId>, StoreError> {
        let tables = self.tables.lock().await;
        if tables.pool.len() < n {
            return Err(StoreError::Unavailable(format!(
                "participant pool holds {} entries, need {n}",
                tables.pool.len()
            )));
        }
        let mut rng = rand::thread_rng();
        Ok(tables
            .pool
            .choose_multiple(&mut rng, n)
            .cloned()
            .collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
