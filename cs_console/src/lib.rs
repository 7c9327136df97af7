//! Internal modules for the operator console.
//!
//! This library provides the command parser used by the cs_console
//! binary.

pub mod commands;
