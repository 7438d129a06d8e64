#![deny(
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

pub mod clarity;
pub mod engine;
pub mod intake;
pub mod mentor;
pub mod menu;
pub mod mercedes;
pub mod patterns;
mod reply;
pub mod templates;

#[cfg(test)]
mod testing;

pub use engine::{CoachEngine, TurnOutcome};
pub use mentor::Mentor;
pub use menu::{Action, MenuChoice};
pub use patterns::TradingPattern;
pub use reply::{Markup, Outgoing};
