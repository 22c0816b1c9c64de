//! Oreflow host glue.
//!
//! Everything the controllers need from the game engine — transport, the
//! terminal toolkit, the world — is reached through the traits in
//! [`bridge`]. [`registry`] owns controller lifecycle and settings-sync
//! dispatch on both sides of the connection; [`terminal`] builds the
//! terminal-control descriptors the host turns into real widgets.

pub mod bridge;
pub mod registry;
pub mod terminal;

pub use registry::{Controller, ControllerKind, ControllerRegistry};
pub use terminal::TerminalController;
