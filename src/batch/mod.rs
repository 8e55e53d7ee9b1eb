//! Batching core.
//!
//! Provides:
//! - Primary/overflow buffer store
//! - Cancellable deadline timer
//! - FirstItem/LastItem deadline policies
//! - The coordinator actor and its public handle

pub mod buffer;
pub mod config;
pub mod coordinator;
pub mod policy;
pub mod timer;

pub use config::BatchConfig;
pub use coordinator::{Coordinator, CoordinatorState};
pub use policy::{FlushTrigger, Policy};
