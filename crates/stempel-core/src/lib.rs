// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Stempelwerk — Core types, error definitions, and configuration shared
// across all crates.

pub mod config;
pub mod error;
pub mod lookup;
pub mod types;

pub use config::{ConfigOverride, StampConfig};
pub use error::StempelError;
pub use types::*;
