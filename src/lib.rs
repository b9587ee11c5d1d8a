//! Versioned, self-documenting settings tree for the Archers of Decay
//! plugin.
//!
//! The configuration lives in a human-editable YAML file. This crate
//! declares the typed settings tree over it, keeps every entry's
//! documentation comments alive, and migrates older files forward across
//! schema versions without losing user customizations.

pub mod document;
pub mod error;
pub mod settings;
pub mod tree;
