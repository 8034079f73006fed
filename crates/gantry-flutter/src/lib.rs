//! Gantry Flutter - Flutter project knowledge
//!
//! Reads project identity from `pubspec.yaml` and the platform folders,
//! bumps the pubspec version, and knows where `flutter build` leaves its
//! artifacts.

pub mod artifacts;
pub mod inspector;
pub mod version;

pub use artifacts::{build_output_dirs, locate_artifact};
pub use inspector::{inspect, Inspector, MANIFEST_FILE};
pub use version::{bump_version, read_version, set_version, FlutterVersion};
