//! Add packages to a NixOS configuration at a marker line, install the edit
//! with a rename-based swap, and rebuild, reverting the edit if the rebuild
//! fails.

pub mod cli;
pub mod config;
pub mod edit;
pub mod error;
pub mod rebuild;

pub use edit::TargetFile;
pub use error::DnaError;
