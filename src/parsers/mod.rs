//! Parsers for requirements manifests and API responses

pub mod naru;
pub mod requirements;

pub use requirements::{LineError, RequirementsParser};
