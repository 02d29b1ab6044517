//! Provider shell
//!
//! Declares the provider's own configuration schema, owns the
//! [`SecurityClient`] and dispatches lifecycle operations to the registered
//! resource handlers. Declarative state is normalized and conformed to the
//! handler's schema before a create or update reaches the handler.

use anyhow::{Context, Result, bail};
use declarative::{
    BoxedResource, FieldSchema, FieldType, Operation, Resource, ResourceData, ResourceState,
    Schema,
};
use secapi::SecurityClient;
use std::collections::BTreeMap;

use crate::config::ProviderConfig;
use crate::resource;

pub const PROVIDER_NAME: &str = "elasticstack";

/// Configuration fields the provider accepts
pub fn provider_schema() -> Schema {
    Schema::new()
        .field(
            "elasticsearch_url",
            FieldSchema::required(FieldType::String)
                .description("Cluster URL, e.g. https://localhost:9200"),
        )
        .field(
            "username",
            FieldSchema::required(FieldType::String).description("Username for basic auth"),
        )
        .field(
            "password",
            FieldSchema::required(FieldType::String)
                .sensitive()
                .description("Password for basic auth"),
        )
}

/// Resource registry plus the client every handler shares
pub struct Provider {
    client: SecurityClient,
    resources: BTreeMap<&'static str, BoxedResource<SecurityClient>>,
}

impl Provider {
    /// Build the HTTP client from resolved configuration
    pub fn configure(config: &ProviderConfig) -> Result<Self> {
        log::debug!(
            "configuring {PROVIDER_NAME} provider for {} as {}",
            config.elasticsearch_url,
            config.username
        );
        let client = SecurityClient::new(&config.client_config())
            .context("Failed to create the security API client")?;
        Ok(Self::with_client(client))
    }

    /// Use an existing client (useful for testing)
    pub fn with_client(client: SecurityClient) -> Self {
        let resources = resource::all()
            .into_iter()
            .map(|handler| (handler.resource_type(), handler))
            .collect();
        Self { client, resources }
    }

    /// Registered resource type names, sorted
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Look up a handler by type name
    pub fn resource(&self, resource_type: &str) -> Result<&dyn Resource<SecurityClient>> {
        match self.resources.get(resource_type) {
            Some(handler) => Ok(handler.as_ref()),
            None => bail!(
                "Unknown resource type '{}'; expected one of: {}",
                resource_type,
                self.resource_types().collect::<Vec<_>>().join(", ")
            ),
        }
    }

    /// Schema of one resource type
    pub fn schema(&self, resource_type: &str) -> Result<Schema> {
        Ok(self.resource(resource_type)?.schema())
    }

    /// Run a create, read, update or delete against `data`
    ///
    /// - create/update: `data` is refreshed from the cluster
    /// - read: `data` is refreshed, or its id cleared when the object is gone
    /// - delete: the id is cleared only once the cluster confirmed it
    ///
    /// Import takes a raw id instead of state; use [`Provider::import`].
    pub fn apply(
        &self,
        operation: Operation,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Result<ResourceState> {
        let handler = self.resource(resource_type)?;
        log::debug!("{operation} {resource_type}");

        match operation {
            Operation::Create | Operation::Update => {
                let schema = handler.schema();
                schema.normalize(data);
                schema
                    .conform(data)
                    .with_context(|| format!("Invalid {resource_type} definition"))?;

                if operation == Operation::Create {
                    handler.create(data, &self.client)?;
                } else {
                    handler.update(data, &self.client)?;
                }
                Ok(ResourceState::Present)
            }
            Operation::Read => handler.read(data, &self.client),
            Operation::Delete => {
                handler.delete(data, &self.client)?;
                data.clear_id();
                Ok(ResourceState::Absent)
            }
            Operation::Import => bail!("import takes an id, not state"),
        }
    }

    /// Adopt an existing remote object by its id
    pub fn import(&self, resource_type: &str, id: &str) -> Result<ResourceData> {
        let handler = self.resource(resource_type)?;
        log::debug!("{} {resource_type} {id}", Operation::Import);
        handler.import(id, &self.client)
    }

    /// State with sensitive values masked, for display
    pub fn redact(&self, resource_type: &str, data: &ResourceData) -> Result<ResourceData> {
        Ok(self.schema(resource_type)?.redact(data))
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
