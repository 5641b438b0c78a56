// src/lib.rs

//! Addon repository sync and index builder
//!
//! Maintains per-platform package lists (`packages-<platform>.yml`) in one
//! repository and publishes the repository index (`addons.xml` plus its MD5
//! digest) for every platform to another branch. Every change is proposed
//! as a pull request, and a run whose output is byte-identical to what is
//! already published proposes nothing.
//!
//! # Layout
//!
//! - [`package`]: addon identity, provenance, and content fingerprints
//! - [`repository`]: package lists, artifact fetching, and index building
//! - [`vcs`]: git working copies and pull requests
//! - [`publish`]: the update and build workflows
//! - [`config`]: credentials, identity, and endpoints from the environment

pub mod archive;
pub mod config;
mod error;
pub mod fsutil;
pub mod hash;
pub mod lock;
pub mod package;
pub mod publish;
pub mod repository;
pub mod vcs;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm, Hasher};
