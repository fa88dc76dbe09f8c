pub mod config;
pub mod error;
pub mod types;
pub mod units;

pub use config::{CommandTemplates, WarchestConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
