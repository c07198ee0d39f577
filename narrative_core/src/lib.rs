//! # Narrative Core (The Cortex)
//!
//! The progression "brain" of the narrative system. This crate sits on top of
//! `game_rules`, drives quests through their lifecycle, walks players through
//! dialog trees and keeps the party in sync with what the world knows.
//!
//! ## Core Components
//!
//! - **registry**: Content loading, cross-reference validation and the quest graph
//! - **quests**: Quest state machine, outcome application and auto-resolve
//! - **dialog**: Per-player dialog sessions over condition-gated trees
//! - **party**: Invites, join requests, kicks and leadership
//! - **events**: Inbound commands and outbound pushes at the host boundary
//! - **engine**: Owns the world and applies queued commands on each tick
//!
//! ## Design Philosophy
//!
//! - **Single Writer**: All mutations run sequentially on the tick; hosts only enqueue
//! - **Never Throws**: Illegal transitions are logged and ignored, content problems become warnings
//! - **Explicit Context**: Registry, world state and outbox are passed in, never global

pub mod dialog;
pub mod engine;
pub mod events;
pub mod party;
pub mod quests;
pub mod registry;

pub use dialog::*;
pub use engine::*;
pub use events::*;
pub use party::*;
pub use quests::*;
pub use registry::*;
