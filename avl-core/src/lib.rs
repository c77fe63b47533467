//! Core of an animated AVL tree visualizer.
//!
//! Main components:
//! - [`tree`] — arena-backed AVL tree: heights, balance, rotations, plain insert.
//! - [`traversal`] — restartable level-order traversal with slot indices.
//! - [`layout`] — target positions from level and slot index.
//! - [`motion`] — per-frame velocities that land exactly on a destination.
//! - [`phases`] — the frame-by-frame insertion state machine.
//! - [`input`] — semantic signals from a button snapshot.
//! - [`visualizer`] — host API tying the pieces together.
//! - [`config`] — tunable constants, loadable from TOML.
//! - [`error`] — crate error type.
//! - [`types`] — shared type aliases and IDs.

pub mod config;
pub mod error;
pub mod input;
pub mod layout;
pub mod motion;
pub mod phases;
pub mod traversal;
pub mod tree;
pub mod types;
pub mod visualizer;
