//! Resource handlers for the Elasticsearch security API
//!
//! Every handler implements [`declarative::Resource`] over a shared
//! [`SecurityClient`]:
//! - `write` builds a typed wire record from declarative state and PUTs it
//! - `read` GETs the object and refreshes state, or clears the id when gone
//! - `delete` removes the object
//!
//! Handlers are stateless; everything they need arrives with each call.

use anyhow::Result;
use declarative::{BoxedResource, ResourceData};
use secapi::SecurityClient;

pub mod role;
pub mod role_mapping;
pub mod user;

pub use role::RoleResource;
pub use role_mapping::RoleMappingResource;
pub use user::UserResource;

/// Every handler the provider serves
pub fn all() -> Vec<BoxedResource<SecurityClient>> {
    vec![
        Box::new(RoleResource),
        Box::new(RoleMappingResource),
        Box::new(UserResource),
    ]
}

/// The `name` attribute, which doubles as the remote key
///
/// Names are immutable primary keys; an empty one would address the
/// collection instead of an object.
pub(crate) fn required_name(data: &ResourceData) -> Result<String> {
    let name = data.require_string("name")?;
    if name.trim().is_empty() {
        return Err(declarative::Error::Validation("name must not be empty".to_string()).into());
    }
    Ok(name)
}

#[cfg(test)]
pub(crate) mod testing {
    use secapi::{MockTransport, SecurityClient};

    /// Client backed by an in-memory cluster, plus a handle to inspect it
    pub fn mock_client() -> (SecurityClient, MockTransport) {
        let mock = MockTransport::new();
        let client = SecurityClient::with_transport(Box::new(mock.clone()));
        (client, mock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_unique_and_schemas_valid() {
        let handlers = all();
        let mut types: Vec<_> = handlers.iter().map(|h| h.resource_type()).collect();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), handlers.len());

        for handler in &handlers {
            handler
                .schema()
                .validate()
                .unwrap_or_else(|e| panic!("{}: {e}", handler.resource_type()));
        }
    }

    #[test]
    fn test_required_name() {
        let mut data = ResourceData::new();
        assert!(required_name(&data).is_err());

        data.set("name", "  ");
        let err = required_name(&data).unwrap_err();
        assert!(
            err.downcast_ref::<declarative::Error>()
                .is_some_and(declarative::Error::is_validation)
        );

        data.set("name", "readers");
        assert_eq!(required_name(&data).unwrap(), "readers");
    }
}
