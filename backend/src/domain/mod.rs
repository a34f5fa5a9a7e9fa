//! # Domain Layer
//!
//! Business rules of Chore Quest:
//!
//! - [`rules`]: pure transitions over a child's progress (task completion,
//!   redemption, hatching)
//! - [`spirits`]: the spirit pool and the random picker
//! - [`validation`]: settings form checks
//! - [`errors`]: rule violations and the action error taxonomy
//! - [`seed`]: default tasks and rewards for a fresh namespace
//! - [`export_service`]: daily points as CSV
//! - [`pages`]: the screen controllers that tie everything to the session

pub mod errors;
pub mod export_service;
pub mod pages;
pub mod rules;
pub mod seed;
pub mod spirits;
pub mod validation;

pub use errors::{ActionError, RuleViolation};
pub use spirits::{RandomSpiritPicker, SpiritPicker};
pub use validation::ValidationError;
