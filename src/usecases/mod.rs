//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with the ledger port to implement the
//! engine's core workflows. Each use case is a self-contained business
//! operation.
//!
//! Use cases:
//! - `BetAdmission`: validate a wager and reserve the stake atomically
//! - `RaceScheduler`: open/close races on a fixed cadence, one at a time
//! - `SettlementEngine`: idempotent, resumable pari-mutuel payout

pub mod admission;
pub mod scheduler;
pub mod settlement;
