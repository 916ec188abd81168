//! Domain layer - Core entities and pari-mutuel math.
//!
//! This module contains the pure domain logic for the race betting engine.
//! No external dependencies allowed here (hexagonal architecture inner ring).
//! All types are serializable and testable in isolation.

pub mod error;
pub mod payout;
pub mod race;

// Re-export core types for convenience
pub use error::{EngineError, StoreError};
pub use payout::PayoutSheet;
pub use race::{
    Bet, BetId, BetStatus, ParticipantId, Race, RaceId, RaceStatus, User, UserId,
};
