//! # SkillMint Common
//!
//! Common types shared across SkillMint crates:
//! - ID types for challenges, skill tracks, career paths, rewards and users
//! - The signed-in user identity
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod user;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::user::*;
}

pub use prelude::*;
