//! Environment variables and fixed names read by the configuration layer

pub const APP_DIR: &str = "tap";
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_BIN_DIR: &str = "TAP_BIN_DIR";
pub const ENV_TEMP_DIR: &str = "TAP_TEMP_DIR";
pub const ENV_TABLE: &str = "TAP_TABLE";
pub const ENV_TIMEOUT: &str = "TAP_TIMEOUT";
pub const ENV_RETRIES: &str = "TAP_RETRIES";
