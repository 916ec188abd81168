//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure. The ledger collaborator is an external durable store
//! in production; the in-process adapter here carries the same atomicity
//! contract for the binary, the tests, and the benchmarks.
//!
//! Adapter categories:
//! - `persistence`: ledger store implementations

pub mod persistence;
