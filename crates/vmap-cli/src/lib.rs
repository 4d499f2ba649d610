//! Library side of the `vmap` command-line tool.

pub mod inputs;
pub mod logging;
pub mod render;
pub mod settings;
