//! Data models for manifests and catalogue records

mod book;
mod manifest;
mod requirement;

pub use book::*;
pub use manifest::*;
pub use requirement::*;
pub(crate) use requirement::strip_comment;
