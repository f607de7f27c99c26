mod commands;
mod terminal;

pub use commands::{run, Cli};
