//! Use-case services over the repository layer.
//!
//! # Responsibility
//! - Orchestrate polish-then-persist flows and batch synchronization.
//! - Keep transport concerns (HTTP, SSE, model API calls) outside the core;
//!   only the pure text transforms and prompt assembly live here.

pub mod essay_service;
pub mod polish;
