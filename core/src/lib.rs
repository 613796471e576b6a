//! sugarspin-core — the persistent-state synchronization and migration
//! engine behind the Sugarspin idle game.
//!
//! The presentation layer (reels, tabs, modals) lives elsewhere and is
//! treated as an opaque producer/consumer of [`state::GameState`].
//! This crate owns the parts where a bug destroys a player's progress:
//! versioned, integrity-checked serialization; cross-version load and
//! migration; mode isolation; local persistence; and cross-device sync.

pub mod codec;
pub mod compat;
pub mod config;
pub mod error;
pub mod event;
pub mod merge;
pub mod migrate;
pub mod mode;
pub mod persistence;
pub mod schema;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;
