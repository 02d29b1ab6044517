//! Role resource (`elasticstack_auth_role`)
//!
//! A role is a named set of cluster, index and run-as privileges, stored at
//! `/_security/role/{name}`. The name is the id.

use anyhow::{Context, Result};
use declarative::{
    FieldSchema, FieldType, Resource, ResourceData, ResourceState, Schema, Value, block,
    collapse_string_list,
};
use secapi::{IndexPrivilege, Role, SecurityClient};

use super::required_name;

/// Handler for security roles
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleResource;

impl RoleResource {
    pub const TYPE: &'static str = "elasticstack_auth_role";

    /// Build the wire role from declarative state
    pub fn role_from_state(data: &ResourceData) -> Result<(String, Role)> {
        let name = required_name(data)?;
        let role = Role {
            cluster: data.get_string_list("cluster_privileges")?,
            run_as: data.get_string_list("run_as_privileges")?,
            indices: index_privileges_from_state(data)?,
        };
        Ok((name, role))
    }

    /// Copy a role fetched from the cluster into declarative state
    pub fn apply_to_state(name: &str, role: &Role, data: &mut ResourceData) {
        data.set_id(name);
        data.set("name", name);
        data.set("cluster_privileges", collapse_string_list(&role.cluster));
        data.set("run_as_privileges", collapse_string_list(&role.run_as));
        data.set("index_privileges", index_privileges_to_state(&role.indices));
    }
}

fn index_privilege_schema() -> Schema {
    Schema::new()
        .field(
            "indices",
            FieldSchema::required(FieldType::list_of(FieldType::String))
                .min_items(1)
                .description("Index names or patterns"),
        )
        .field(
            "privileges",
            FieldSchema::required(FieldType::list_of(FieldType::String))
                .min_items(1)
                .description("Privileges granted on those indices"),
        )
        .field(
            "query",
            FieldSchema::optional(FieldType::String)
                .description("Document-level security query, as JSON"),
        )
        .field(
            "allow_restricted_indices",
            FieldSchema::optional(FieldType::Bool)
                .default(false)
                .description("Whether the patterns also cover restricted indices"),
        )
}

fn index_privileges_from_state(data: &ResourceData) -> declarative::Result<Vec<IndexPrivilege>> {
    data.get_blocks("index_privileges")?
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let privilege = || -> declarative::Result<IndexPrivilege> {
                Ok(IndexPrivilege {
                    names: entry.get_string_list("indices")?,
                    privileges: entry.get_string_list("privileges")?,
                    query: entry.get_string("query")?,
                    allow_restricted_indices: entry
                        .get_bool("allow_restricted_indices")?
                        .unwrap_or(false),
                })
            };
            privilege().map_err(|e| e.in_field(format!("index_privileges[{index}]")))
        })
        .collect()
}

fn index_privileges_to_state(indices: &[IndexPrivilege]) -> Value {
    Value::List(
        indices
            .iter()
            .map(|privilege| {
                let mut pairs = vec![
                    ("indices", collapse_string_list(&privilege.names)),
                    ("privileges", collapse_string_list(&privilege.privileges)),
                    (
                        "allow_restricted_indices",
                        Value::Bool(privilege.allow_restricted_indices),
                    ),
                ];
                if let Some(query) = &privilege.query {
                    pairs.push(("query", Value::from(query.as_str())));
                }
                block(pairs)
            })
            .collect(),
    )
}

impl Resource<SecurityClient> for RoleResource {
    fn resource_type(&self) -> &'static str {
        Self::TYPE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .field(
                "name",
                FieldSchema::required(FieldType::String)
                    .description("Role name; changing it replaces the role"),
            )
            .field(
                "cluster_privileges",
                FieldSchema::optional(FieldType::list_of(FieldType::String))
                    .description("Cluster privileges, e.g. monitor or manage"),
            )
            .field(
                "run_as_privileges",
                FieldSchema::optional(FieldType::list_of(FieldType::String))
                    .description("Users this role may impersonate"),
            )
            .field(
                "index_privileges",
                FieldSchema::optional(FieldType::list_of(FieldType::Block(
                    index_privilege_schema(),
                )))
                .description("Privileges on groups of indices"),
            )
    }

    fn write(&self, data: &ResourceData, client: &SecurityClient) -> Result<()> {
        let (name, role) = Self::role_from_state(data)?;
        log::debug!("writing role {name}");
        client
            .put_role(&name, &role)
            .with_context(|| format!("Failed to write role {name}"))
    }

    fn read(&self, data: &mut ResourceData, client: &SecurityClient) -> Result<ResourceState> {
        let name = required_name(data)?;
        log::debug!("reading role {name}");

        let fetched = client
            .get_role(&name)
            .with_context(|| format!("Failed to read role {name}"))?;

        match fetched {
            Some(role) => {
                Self::apply_to_state(&name, &role, data);
                Ok(ResourceState::Present)
            }
            None => {
                log::info!("role {name} not found, removing from state");
                data.clear_id();
                Ok(ResourceState::Absent)
            }
        }
    }

    fn delete(&self, data: &ResourceData, client: &SecurityClient) -> Result<()> {
        let name = required_name(data)?;
        log::debug!("deleting role {name}");
        client
            .delete_role(&name)
            .with_context(|| format!("Failed to delete role {name}"))
    }
}
