//! CLI commands

mod changelog;
mod completions;
mod doctor;
mod init;
mod inspect;
mod lane;
mod mode;
mod secrets;
mod version;

pub use changelog::ChangelogCommand;
pub use completions::CompletionsCommand;
pub use doctor::DoctorCommand;
pub use init::InitCommand;
pub use inspect::InspectCommand;
pub use lane::LaneCommand;
pub use mode::ModeCommand;
pub use secrets::SecretsCommand;
pub use version::VersionCommand;
