// Middleware for the node's HTTP surface

pub mod cors;

pub use cors::*;
