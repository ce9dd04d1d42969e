#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem and path helpers shared by the modlens crates.
//!
//! Plain functions over paths and strings, with no logging and no URL
//! handling.

pub mod fs;
pub mod path;
