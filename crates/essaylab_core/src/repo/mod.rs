//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the public save/list/delete contract for essay persistence.
//! - Compose store client, identity allocation and table self-healing.
//!
//! # Invariants
//! - Write paths validate the record before any store call.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to store transport errors.

pub mod essay_repo;
pub mod id_alloc;
