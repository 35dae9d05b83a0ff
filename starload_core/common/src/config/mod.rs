pub mod components;
pub mod error;
pub mod loader;

/// Name of the project file looked up in the config directory.
pub const PROJECT_FILE_NAME: &str = "warehouse-project.yml";
