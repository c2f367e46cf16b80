//! Shared fmtgate data models consumed by the engine and formatter crates.

pub mod commits;
pub mod files;
pub mod outcome;
pub mod selection;

pub use commits::*;
pub use files::*;
pub use outcome::*;
pub use selection::*;
