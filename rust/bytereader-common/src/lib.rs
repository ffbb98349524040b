//! Core definitions (error kinds, result alias and value attribution), relied upon
//! by all bytereader-* crates.

pub mod error;
pub mod result;
pub mod site;

pub use result::Result;
pub use site::ValueSite;
