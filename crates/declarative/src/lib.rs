//! # Declarative
//!
//! The host-facing contract for declaratively managed remote resources.
//!
//! This crate provides the abstractions a host orchestrator and a set of
//! resource handlers agree on: how state is represented, how it is
//! declared and checked, and the create/read/update/delete lifecycle each
//! handler implements.
//!
//! ## Core Concepts
//!
//! - **Value**: A dynamic value in declarative state (string, bool, list, block)
//! - **ResourceData**: The state of one resource instance plus its remote id
//! - **Schema**: Field declarations used to default and conform state
//! - **Codec**: The boundary where dynamic values become typed values
//! - **Resource**: The CRUD contract, with read-after-write for create/update
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Resource, ResourceData, Value};
//!
//! let mut data = ResourceData::new();
//! data.set("name", "readers");
//! data.set("cluster_privileges", Value::List(vec!["monitor".into()]));
//!
//! let schema = handler.schema();
//! schema.normalize(&mut data);
//! schema.conform(&data)?;
//!
//! handler.create(&mut data, &client)?;
//! assert_eq!(data.id(), Some("readers"));
//! ```
//!
//! ## Lifecycle
//!
//! `Absent -> Creating -> Present -> Updating -> Present -> Deleting -> Absent`.
//! Read may be invoked at any time; when the object is gone it clears the
//! id and reports [`ResourceState::Absent`] rather than succeeding.

pub mod codec;
pub mod data;
pub mod error;
pub mod resource;
pub mod schema;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use codec::{collapse_string_list, expand_string_list};
pub use data::ResourceData;
pub use error::{Error, Result};
pub use resource::{BoxedResource, Resource, ensure_key_unchanged, read_back};
pub use schema::{FieldSchema, FieldType, REDACTED, Schema};
pub use types::{Operation, ResourceState};
pub use value::{Value, block};
