//! Shared infrastructure utilities for mapscout.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)

pub mod atomic_write;

pub use atomic_write::{SyncPolicy, atomic_write, atomic_write_with_policy};
