//! Shared domain types for the moasnap project.

pub mod camera;
pub mod config;
pub mod frame;
pub mod mission;
pub mod participant;
pub mod snap;

mod errors;

pub use errors::{Result, SnapError, ValidationError};
