//! # Game Rules
//!
//! The "World Bible" crate - quest, dialog, faction and location content, the
//! requirement rules that gate them, and the world state they act on.
//! This crate holds no progression logic; `narrative_core` drives it.

pub mod config;
pub mod entities;
pub mod mechanics;
pub mod world_state;

pub use config::*;
pub use entities::*;
pub use mechanics::*;
pub use world_state::*;
