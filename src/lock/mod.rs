//! Lock platform
//!
//! - `entity`: per-device lock adapter and the host-facing capability trait
//! - `registry`: registered entities, looked up by unique id
//! - `setup`: credential check and entity creation
//! - `poller`: background refresh loop

pub mod entity;
pub mod poller;
pub mod registry;
pub mod setup;

pub use entity::{CuboLock, LockEntity, LockSnapshot};
pub use poller::LockPoller;
pub use registry::LockRegistry;
pub use setup::{setup_entry, test_credentials};
