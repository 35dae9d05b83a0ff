pub mod connections;
pub mod global;
pub mod project;
pub mod sources;
