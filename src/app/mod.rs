//! Application glue module
//!
//! Configuration shared by the library and the demo.

mod config;

pub use config::{default_path, Config, ConfigError, ConsoleConfig, DemoConfig};
