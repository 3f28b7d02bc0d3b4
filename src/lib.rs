pub mod api;
pub mod config;
pub mod plugins;
pub mod protocols;
pub mod runtime;
pub mod shell;

pub use api::types::ShellError;
pub use config::ShellConfig;
pub use shell::Shell;
