//! Update Pipeline
//!
//! Connects model changes to update passes on a single-threaded executor.
//!
//! # Pipeline Architecture
//!
//! ```text
//! set_children() -> children signal -> effect -> UpdateGate -> LocalPool task -> update_children()
//! ```
//!
//! ## Key Design Principles
//!
//! - **Synchronous notification**: signal effects only schedule; no pass runs
//!   inside an effect
//! - **Single flight**: with the default policy, one pass per element is in
//!   flight and later requests collapse into one follow-up
//! - **Explicit driving**: passes progress only while the runtime is ticked

pub mod mount;
pub mod scheduler;

pub use mount::{MountHandle, Runtime};
pub use scheduler::UpdateGate;
