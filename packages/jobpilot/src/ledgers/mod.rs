//! Title ledger implementations.

pub mod file;
pub mod memory;

pub use file::FileLedger;
pub use memory::MemoryLedger;
