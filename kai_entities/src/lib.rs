//! Database entities for persisted bot state.

pub mod mistakes;
pub mod user_states;
