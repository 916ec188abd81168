//! Persistence Adapters - Ledger Store Implementations

pub mod memory;

pub use memory::MemoryLedger;
