//! Configuration system for gantry

pub mod defaults;
mod loader;
mod project_file;
mod types;
pub mod validation;

pub use defaults::*;
pub use loader::*;
pub use project_file::ProjectConfigFile;
pub use types::*;
pub use validation::*;
