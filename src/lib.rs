//! Cuttly Stats Library
//!
//! Fetches click statistics for a fixed list of Cutt.ly short links, paced
//! for the free-plan rate limit and cached on disk. This module exposes the
//! refresh machinery for the binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod refresh;
pub mod report;
