//! Core race betting domain types.
//!
//! Defines all business entities: users, races, and bets, together with
//! their lifecycle state machines. These types are the foundation of the
//! hexagonal architecture's inner ring.
//!
//! State machines enforced here and by the use cases:
//! - Race: `Open → Closed → Settled`, no transition leaves `Settled`
//! - Bet: `Pending → Paid | Lost`, both terminal

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// User identifier.
pub type UserId = Uuid;

/// Race identifier.
pub type RaceId = Uuid;

/// Bet identifier.
pub type BetId = Uuid;

/// Opaque participant (horse) identifier. Participants are reference
/// data; nothing beyond the identifier is modeled.
pub type ParticipantId = String;

// ────────────────────────────────────────────
// Entities
// ────────────────────────────────────────────

/// A betting account with a non-negative balance.
///
/// The balance is only mutated through the ledger port: a conditional
/// debit on bet admission and an atomic credit on payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name (lowercased at registration).
    pub name: String,
    /// Current balance. Invariant: never negative.
    pub balance: Decimal,
}

impl User {
    /// Create a new user with an opening balance.
    pub fn with_balance(name: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().to_lowercase(),
            balance,
        }
    }
}

/// Lifecycle status of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    /// Accepting bets.
    Open,
    /// Winner drawn, payouts not yet fully distributed.
    Closed,
    /// Every bet has left `Pending`; the race is immutable.
    Settled,
}

impl std::fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// A single race over a fixed-size field of participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    /// Unique race ID.
    pub id: RaceId,
    /// The field: exactly `field_size` distinct participant IDs.
    pub participants: Vec<ParticipantId>,
    /// When the race was opened for betting.
    pub opened_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: RaceStatus,
    /// Winning participant. `None` iff the race is still `Open`.
    pub winner: Option<ParticipantId>,
}

impl Race {
    /// Create a freshly opened race with no winner.
    pub fn open(participants: Vec<ParticipantId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participants,
            opened_at: Utc::now(),
            status: RaceStatus::Open,
            winner: None,
        }
    }

    /// Whether the race is still accepting bets.
    pub fn is_open(&self) -> bool {
        self.status == RaceStatus::Open
    }

    /// Whether the given participant runs in this race.
    pub fn has_participant(&self, participant: &ParticipantId) -> bool {
        self.participants.iter().any(|p| p == participant)
    }
}

/// Payout status of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    /// Stake reserved, race not yet settled for this bet.
    Pending,
    /// Winning bet, payout credited.
    Paid,
    /// Losing bet, stake forfeited to the pot.
    Lost,
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Lost => write!(f, "LOST"),
        }
    }
}

/// A wager: user, race, backed participant, and the reserved stake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    /// Unique bet ID.
    pub id: BetId,
    /// Owning user.
    pub user_id: UserId,
    /// Race the bet was placed on.
    pub race_id: RaceId,
    /// Backed participant.
    pub participant: ParticipantId,
    /// Stake amount. Invariant: strictly positive.
    pub amount: Decimal,
    /// Placement timestamp.
    pub placed_at: DateTime<Utc>,
    /// Payout status. Transitions exactly once, by the settlement engine.
    pub status: BetStatus,
    /// Credited payout, set when the bet transitions to `Paid`.
    pub payout: Option<Decimal>,
}

impl Bet {
    /// Create a new pending bet with the stake already validated.
    pub fn pending(
        user_id: UserId,
        race_id: RaceId,
        participant: ParticipantId,
        amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            race_id,
            participant,
            amount,
            placed_at: Utc::now(),
            status: BetStatus::Pending,
            payout: None,
        }
    }

    /// Whether this bet still awaits settlement.
    pub fn is_pending(&self) -> bool {
        self.status == BetStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_race_open_defaults() {
        let race = Race::open(vec!["h1".into(), "h2".into(), "h3".into()]);
        assert_eq!(race.status, RaceStatus::Open);
        assert!(race.is_open());
        assert!(race.winner.is_none());
        assert_eq!(race.participants.len(), 3);
    }

    #[test]
    fn test_race_has_participant() {
        let race = Race::open(vec!["h1".into(), "h2".into()]);
        assert!(race.has_participant(&"h1".to_string()));
        assert!(!race.has_participant(&"h9".to_string()));
    }

    #[test]
    fn test_bet_pending_defaults() {
        let bet = Bet::pending(Uuid::new_v4(), Uuid::new_v4(), "h1".into(), dec!(25));
        assert_eq!(bet.status, BetStatus::Pending);
        assert!(bet.is_pending());
        assert!(bet.payout.is_none());
        assert_eq!(bet.amount, dec!(25));
    }

    #[test]
    fn test_user_name_lowercased() {
        let user = User::with_balance("Alice", dec!(100));
        assert_eq!(user.name, "alice");
        assert_eq!(user.balance, dec!(100));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", RaceStatus::Open), "OPEN");
        assert_eq!(format!("{}", BetStatus::Paid), "PAID");
    }
}
