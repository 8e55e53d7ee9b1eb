//! Weir: a batch-and-timeout buffering coordinator.
//!
//! Callers push individual items (or lists of items) into a [`Coordinator`];
//! it accumulates them and hands each batch to a [`BatchHandler`] when either
//! the configured size threshold is reached or the configured deadline
//! elapses, whichever comes first.
//!
//! # Architecture
//!
//! - **Actor-owned state**: a single tokio task owns both buffers and the
//!   deadline timer; handles talk to it over a command channel
//! - **Two deadline policies**: [`Policy::FirstItem`] and [`Policy::LastItem`]
//! - **Non-overlapping flushes**: appends arriving during a flush land in an
//!   overflow buffer that is replayed once the flush completes
//! - **Observable**: tracing spans/events and OpenTelemetry metrics
//!
//! # Modules
//!
//! - [`batch`]: buffers, deadline timer, policy and the coordinator actor
//! - [`config`]: CLI and environment configuration for the demo binary
//! - [`demo`]: demo event producer and handler
//! - [`error`]: coordinator error type
//! - [`handler`]: the caller-supplied validate/process capability
//! - [`observability`]: metrics and tracing setup

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // batch::BatchConfig is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod batch;
pub mod config;
pub mod demo;
pub mod error;
pub mod handler;
pub mod observability;

pub use batch::{BatchConfig, Coordinator, CoordinatorState, FlushTrigger, Policy};
pub use error::CoordinatorError;
pub use handler::BatchHandler;
