//! Stitchline core
//!
//! Batch tracking for garment production lines. Workers talk to a chat bot,
//! pick a batch and a color line, and record how many pieces their station
//! processed. The cutter creates batches and color lines and administers
//! users.
//!
//! This crate is transport agnostic: a chat adapter turns its own events into
//! [`workflow::Event`]s and renders the returned [`reply::Reply`]s.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod reply;
pub mod report;
pub mod role;
pub mod routing;
pub mod session;
pub mod station;
pub mod workflow;

pub use config::StitchlineConfig;
pub use error::{CoreError, Result};
pub use model::{Batch, ChatId, MaterialLine, Slot, User};
pub use reply::{Button, Keyboard, Reply};
pub use role::Role;
pub use routing::{Command, Incoming};
pub use station::Station;
pub use workflow::{Event, Workshop};
