//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `LedgerStore`: durable User/Race/Bet records with per-record
//!   optimistic-concurrency tokens and conditional updates

pub mod ledger;
