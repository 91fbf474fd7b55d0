//! Database layer (in-memory document store).

pub mod memory;

pub use memory::MemoryDb;
