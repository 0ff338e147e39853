pub mod blueprint;
pub mod cli;
pub mod load_config;
pub mod resolve;

pub use cli::{run, Cli, Commands};
