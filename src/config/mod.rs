//! Configuration system
//!
//! - `macros`: the `config_struct!` macro (fields with inline defaults)
//! - `schemas`: every configuration section
//! - `utils`: loading, reloading and global access

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    CacheSettings, Config, HubConfig, MetricsConfig, RateLimitConfig, WebserverConfig,
};
pub use utils::{
    get_config_clone, init_config, load_config_from_path, parse_config, read_config_file,
    reload_config_from_path, save_config, with_config, CONFIG, CONFIG_FILE_PATH,
};
