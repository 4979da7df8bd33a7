//! Command implementations for the hotbox CLI.
//!
//! hotbox has a single command, [`serve`], which runs the development server
//! until interrupted.

pub mod serve;

pub use serve::execute as serve_execute;
