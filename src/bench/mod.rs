//! Suite configuration and the commands behind the CLI.

pub mod bench_cmd;
pub mod config;

pub use config::{RunSection, SuiteConfig, load_suite_config, parse_suite_config};
