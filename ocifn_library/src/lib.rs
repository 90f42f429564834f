//! ocifn Library
//!
//! Shared code and utilities that are not specific to any executable in the ocifn stack.

pub mod transaction;
pub mod utils;
#[macro_use]
pub mod macros;
pub mod config;
pub mod logging;
