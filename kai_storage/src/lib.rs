#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod convert;
mod ephemeral;
mod manager;

// Re-export the storage traits so callers only need this crate
pub use kai_core::{MistakeLog, StateStore};

pub use ephemeral::EphemeralStore;
pub use manager::StateManager;
