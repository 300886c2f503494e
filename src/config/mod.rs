//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{
    default_config_path, default_log_path, open_log_file_append, path_has_symlink_ancestor,
    CONFIG_ENV,
};
pub use types::{Config, LogLevel};
pub use validate::MAX_STEP_DELAY;
pub use xml::{load_config, load_config_from_xml_path};
