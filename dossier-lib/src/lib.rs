//! Core library for Dossier, a local directory of user profiles.
//!
//! Everything persistent goes through the [`Repository`], which wraps the
//! profile store, its synchronization layer, and the configuration file.
//! Front ends (the CLI, or anything else) hold a `Repository` and render
//! from the snapshots it hands out.

pub mod fs;
pub mod repository;

pub use repository::{
    Repository,
    entities::{Error, Profile},
};

pub type Result<T> = std::result::Result<T, Error>;
