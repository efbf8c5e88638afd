//! Library side of the `tdd2rm` command-line tool.

pub mod commands;
pub mod logging;
