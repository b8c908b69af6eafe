// Utility functions

pub mod fs;
pub mod logger;

pub use logger::*;
