//! Command implementations for the elasticstack CLI

pub mod resource;
pub mod schema;
