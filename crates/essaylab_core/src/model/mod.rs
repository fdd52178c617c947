//! Domain models shared across repository and service layers.
//!
//! # Responsibility
//! - Define canonical persisted record shapes.
//! - Keep validation rules next to the data they protect.

pub mod essay;
