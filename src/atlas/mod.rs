//! Texture atlas packing.
//!
//! This module combines all registered sprites into a single fixed-size
//! texture and records the normalized UV rectangle of each.

pub mod packer;

pub use packer::{pack, shelf_layout, Atlas, AtlasEntry, OverflowPolicy, Placement};
