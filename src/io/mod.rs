//! I/O modules for store access and the Level-1 file handler

pub mod l1_reader;
pub mod store;

pub use l1_reader::GhiL1Reader;
pub use store::{ArrayStore, MemoryStore};
