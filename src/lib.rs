//! Automated dependency updates for a Nix flake package repository.
//!
//! The engine discovers configured packages and flake inputs, asks
//! upstream (GitHub releases, the npm registry) for newer versions,
//! rewrites the pinned hash records (running verification builds to
//! converge fixed-output hashes where the hashes cannot be computed
//! directly), and publishes each change as a pull request. The `autobump`
//! binary exposes the four workflow stages; everything underneath lives in
//! this library so the stages can be exercised directly in tests.

pub mod cargo_lock;
pub mod config;
pub mod error;
pub mod flake;
pub mod forge;
pub mod git;
pub mod hash;
pub mod nix;
pub mod npm;
pub mod outputs;
pub mod pr;
pub mod process;
pub mod record;
pub mod types;
pub mod update;
pub mod version;
pub mod workflow;

pub use error::{Error, Result};
