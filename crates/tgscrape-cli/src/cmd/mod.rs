pub mod harvest;
pub mod prompt;
pub mod show_config;
