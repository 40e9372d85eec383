//! # QueueCTL CLI
//!
//! Interactive front end for the QueueCTL job queue: parses operator
//! commands, dispatches them against a [`queuectl_jobs::JobStore`] and its
//! worker pool, and shuts the workers down in order on exit.

pub mod command;
pub mod controller;
pub mod logging;
pub mod prompt;
pub mod startup;

pub use command::{Command, EnqueueRequest, ParseError, StateFilter};
pub use controller::{Controller, Reply};
pub use prompt::ExitReason;
