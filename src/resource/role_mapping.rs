//! Role mapping resource (`elasticstack_auth_role_mapping`)
//!
//! A role mapping grants roles to users whose attributes match a rule. It is
//! stored at `/_security/role_mapping/{name}`; the name is the id.
//!
//! `rules` is write-only: read refreshes `name`, `roles` and `enabled` but
//! leaves the declared rules untouched, so drift in the remote rule tree is
//! not detected.

use anyhow::{Context, Result};
use declarative::{
    Error, FieldSchema, FieldType, Resource, ResourceData, ResourceState, Schema,
    collapse_string_list,
};
use secapi::{RoleMapping, RoleMappingRecord, RuleExpression, SecurityClient};

use super::required_name;

/// Raised when `rules` does not hold exactly one element
pub const ONE_RULE: &str = "role mapping must define one top-level rule";

/// Raised when the rule does not hold exactly one field match
pub const ONE_FIELD: &str = "role mapping rule must define exactly one field match";

/// Handler for role mappings
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleMappingResource;

impl RoleMappingResource {
    pub const TYPE: &'static str = "elasticstack_auth_role_mapping";

    /// Build the wire mapping from declarative state
    ///
    /// Every check runs here, so a malformed mapping never reaches the
    /// network.
    pub fn mapping_from_state(data: &ResourceData) -> Result<(String, RoleMapping)> {
        let name = required_name(data)?;

        let roles = data.get_string_list("roles")?;
        if roles.is_empty() {
            return Err(
                Error::Validation("role mapping must grant at least one role".to_string())
                    .in_field("roles")
                    .into(),
            );
        }

        let mapping = RoleMapping {
            enabled: data.get_bool("enabled")?.unwrap_or(true),
            roles,
            rules: rule_from_state(data)?,
        };
        Ok((name, mapping))
    }

    /// Copy a mapping fetched from the cluster into declarative state
    pub fn apply_to_state(name: &str, record: &RoleMappingRecord, data: &mut ResourceData) {
        data.set_id(name);
        data.set("name", name);
        data.set("roles", collapse_string_list(&record.roles));
        data.set("enabled", record.enabled);
        log::debug!("role mapping {name}: rules are not refreshed from the cluster");
    }
}

fn rule_from_state(data: &ResourceData) -> declarative::Result<RuleExpression> {
    let rules = data.get_blocks("rules")?;
    let [rule] = rules.as_slice() else {
        return Err(Error::Validation(ONE_RULE.to_string()));
    };

    // TODO: only a single field leaf can be declared; any/all/except need a
    // recursive rule block in the schema before they can be built here.
    let fields = rule.get_blocks("field").map_err(|e| e.in_field("rules[0]"))?;
    let [field] = fields.as_slice() else {
        return Err(Error::Validation(ONE_FIELD.to_string()).in_field("rules[0]"));
    };

    let at = |e: Error| e.in_field("rules[0].field[0]");
    let key = field.require_string("key").map_err(at)?;
    let value = field.require_string("string_value").map_err(at)?;
    Ok(RuleExpression::field(key, value))
}

fn field_schema() -> Schema {
    Schema::new()
        .field(
            "key",
            FieldSchema::required(FieldType::String)
                .description("User attribute to match, e.g. username or groups"),
        )
        .field(
            "string_value",
            FieldSchema::required(FieldType::String).description("Value the attribute must equal"),
        )
}

fn rule_schema() -> Schema {
    Schema::new().field(
        "field",
        FieldSchema::required(FieldType::set_of(FieldType::Block(field_schema())))
            .min_items(1)
            .max_items(1)
            .description("Attribute match; exactly one"),
    )
}

impl Resource<SecurityClient> for RoleMappingResource {
    fn resource_type(&self) -> &'static str {
        Self::TYPE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .field(
                "name",
                FieldSchema::required(FieldType::String)
                    .description("Mapping name; changing it replaces the mapping"),
            )
            .field(
                "roles",
                FieldSchema::required(FieldType::list_of(FieldType::String))
                    .description("Roles granted to matching users"),
            )
            .field(
                "enabled",
                FieldSchema::optional(FieldType::Bool)
                    .default(true)
                    .description("Whether the mapping is active"),
            )
            .field(
                "rules",
                FieldSchema::required(FieldType::set_of(FieldType::Block(rule_schema())))
                    .description("Which users the mapping applies to; exactly one rule"),
            )
    }

    fn write(&self, data: &ResourceData, client: &SecurityClient) -> Result<()> {
        let (name, mapping) = Self::mapping_from_state(data)?;
        log::debug!("writing role mapping {name}");
        client
            .put_role_mapping(&name, &mapping)
            .with_context(|| format!("Failed to write role mapping {name}"))
    }

    fn read(&self, data: &mut ResourceData, client: &SecurityClient) -> Result<ResourceState> {
        let name = required_name(data)?;
        log::debug!("reading role mapping {name}");

        let fetched = client
            .get_role_mapping(&name)
            .with_context(|| format!("Failed to read role mapping {name}"))?;

        match fetched {
            Some(record) => {
                Self::apply_to_state(&name, &record, data);
                Ok(ResourceState::Present)
            }
            None => {
                log::info!("role mapping {name} not found, removing from state");
                data.clear_id();
                Ok(ResourceState::Absent)
            }
        }
    }

    fn delete(&self, data: &ResourceData, client: &SecurityClient) -> Result<()> {
        let name = required_name(data)?;
        log::debug!("deleting role mapping {name}");
        client
            .delete_role_mapping(&name)
            .with_context(|| format!("Failed to delete role mapping {name}"))
    }
}
