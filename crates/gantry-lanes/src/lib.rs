//! Gantry Lanes - signing, build and store upload
//!
//! Each lane is a straight sequence of external commands (`flutter`,
//! `bundle exec fastlane`, `git`) run through a [`gantry_core::CommandRunner`].
//! There is no retry: the first failing step ends the lane.

pub mod build;
pub mod clean;
pub mod credentials;
pub mod deploy;
pub mod lane;
pub mod signing;

pub use build::build;
pub use clean::clean;
pub use credentials::{AndroidCredentials, IosCredentials};
pub use deploy::{deploy, promote, tag_release, DeployRequest, LaneKind, Rollout, FORWARDED_ENV};
pub use lane::{LaneInvoker, LaneOptions, LaneStep, LaneSummary};
pub use signing::{setup_signing, SecretFiles};
