//! Stew: snapshot a Homebrew prefix into an installer package.
//!
//! - [`inventory`] - desired formula list and the installed-state snapshot
//! - [`assemble`] - subtractive and additive package builds
//! - [`symlinks`] - symlink discovery used by additive builds
//! - [`report`] - provenance report (brew metadata + binary forensics)
//!
//! Everything runs synchronously; each external tool invocation blocks until
//! it finishes.

pub mod assemble;
pub mod brew;
pub mod common;
pub mod config;
pub mod error;
pub mod inventory;
pub mod preflight;
pub mod process;
pub mod report;
pub mod symlinks;
pub mod timing;

pub use error::{Result, StewError};
