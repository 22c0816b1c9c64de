//! Pure controller-settings logic for Oreflow.
//!
//! This crate contains all controller logic that is independent of the
//! host game engine. Functions take plain data and return results, making
//! them unit-testable and portable across the in-game mod runtime, native
//! CLI tools, and any future host.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`items`] | Item identifiers and the refinable-ore catalog derivation |
//! | [`priority`] | Ordered, duplicate-free ore/item priority lists |
//! | [`settings`] | Per-controller settings with default/override/ignore resolution |
//! | [`sync`] | String-keyed client/server settings-sync protocol |
//! | [`triggers`] | Trigger rules and stock targets for production queueing |

pub mod items;
pub mod priority;
pub mod settings;
pub mod sync;
pub mod triggers;
