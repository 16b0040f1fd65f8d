//! Infrastructure layer - Card Access Service adapters.
//!
//! This layer holds the backends that satisfy the `CardService` port:
//! the production PC/SC adapter and the in-memory simulator.

pub mod apdu;
pub mod memory_service;
pub mod pcsc_service;

pub use memory_service::{CardSlot, MemoryCardService};
pub use pcsc_service::PcscCardService;
