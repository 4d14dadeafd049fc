//! Input bundle, output records and the small shared helpers around them.

pub mod bundle;
pub mod error;
pub mod hash;
pub mod output;
pub mod time;
pub mod types;
