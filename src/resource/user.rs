//! User resource (`elasticstack_auth_user`)
//!
//! Only the schema is declared. Every lifecycle operation fails with
//! [`declarative::Error::NotImplemented`] before touching the network.

use anyhow::Result;
use declarative::{Error, FieldSchema, FieldType, Resource, ResourceData, ResourceState, Schema};
use secapi::SecurityClient;

/// Handler for native realm users
#[derive(Debug, Clone, Copy, Default)]
pub struct UserResource;

impl UserResource {
    pub const TYPE: &'static str = "elasticstack_auth_user";

    fn not_implemented() -> anyhow::Error {
        Error::NotImplemented {
            resource_type: Self::TYPE.to_string(),
        }
        .into()
    }
}

impl Resource<SecurityClient> for UserResource {
    fn resource_type(&self) -> &'static str {
        Self::TYPE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .field("username", FieldSchema::required(FieldType::String))
            .field("full_name", FieldSchema::optional(FieldType::String))
            .field("email", FieldSchema::optional(FieldType::String))
            .field(
                "metadata",
                FieldSchema::optional(FieldType::Map).description("Arbitrary user metadata"),
            )
            .field(
                "password",
                FieldSchema::optional(FieldType::String)
                    .sensitive()
                    .description("Initial password"),
            )
            .field(
                "roles",
                FieldSchema::optional(FieldType::set_of(FieldType::String)),
            )
    }

    fn id_field(&self) -> &'static str {
        "username"
    }

    fn write(&self, _data: &ResourceData, _client: &SecurityClient) -> Result<()> {
        Err(Self::not_implemented())
    }

    fn read(&self, _data: &mut ResourceData, _client: &SecurityClient) -> Result<ResourceState> {
        Err(Self::not_implemented())
    }

    fn delete(&self, _data: &ResourceData, _client: &SecurityClient) -> Result<()> {
        Err(Self::not_implemented())
    }

    fn import(&self, _id: &str, _client: &SecurityClient) -> Result<ResourceData> {
        Err(Self::not_implemented())
    }
}
