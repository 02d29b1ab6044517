//! Wire types for the security API.
//!
//! These mirror the JSON bodies exchanged with `/_security/role` and
//! `/_security/role_mapping`. Fields the API returns but this crate does not
//! manage are ignored on decode.

use crate::rules::RuleExpression;
use serde::{Deserialize, Deserializer, Serialize};

/// A role: a named set of privileges.
///
/// The name is the URL key, not part of the body. Empty lists are left
/// out of the encoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Cluster-level privileges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster: Vec<String>,
    /// Users this role may impersonate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_as: Vec<String>,
    /// Index-level privileges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<IndexPrivilege>,
}

/// Privileges granted on a group of indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPrivilege {
    /// Index names or patterns.
    pub names: Vec<String>,
    /// Privileges on those indices.
    pub privileges: Vec<String>,
    /// Document-level security query.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "query_as_string"
    )]
    pub query: Option<String>,
    /// Whether the patterns also cover restricted indices.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_restricted_indices: bool,
}

/// A role mapping as sent on PUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    /// Whether the mapping is active. Always sent, including `false`.
    pub enabled: bool,
    /// Roles granted to matching users.
    pub roles: Vec<String>,
    /// Which users the mapping applies to.
    pub rules: RuleExpression,
}

/// A role mapping as returned on GET.
///
/// Rules are kept as raw JSON: the cluster may hold rule shapes richer
/// than [`RuleExpression`] models, and a read must not fail over them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleMappingRecord {
    /// Whether the mapping is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Roles granted to matching users.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Raw rule tree.
    #[serde(default)]
    pub rules: Option<serde_json::Value>,
}

impl RoleMappingRecord {
    /// Decode the rule tree, if there is one.
    pub fn rule_expression(&self) -> Option<Result<RuleExpression, crate::rules::RuleError>> {
        self.rules.as_ref().map(RuleExpression::from_json)
    }
}

fn default_enabled() -> bool {
    true
}

/// Queries may come back as a JSON string or as an inline object.
fn query_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_omits_empty_lists() {
        let role = Role {
            cluster: vec!["monitor".to_string()],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&role).unwrap(),
            r#"{"cluster":["monitor"]}"#
        );
        assert_eq!(serde_json::to_string(&Role::default()).unwrap(), "{}");
    }

    #[test]
    fn test_role_decode_ignores_unmanaged_fields() {
        let role: Role = serde_json::from_value(json!({
            "cluster": ["monitor"],
            "indices": [{
                "names": ["logs-*"],
                "privileges": ["read"],
                "allow_restricted_indices": false
            }],
            "applications": [],
            "run_as": [],
            "metadata": {},
            "transient_metadata": {"enabled": true}
        }))
        .unwrap();

        assert_eq!(role.cluster, vec!["monitor"]);
        assert!(role.run_as.is_empty());
        assert_eq!(role.indices[0].names, vec!["logs-*"]);
        assert!(!role.indices[0].allow_restricted_indices);
        assert_eq!(role.indices[0].query, None);
    }

    #[test]
    fn test_index_privilege_query_forms() {
        let as_string: IndexPrivilege = serde_json::from_value(json!({
            "names": ["a"], "privileges": ["read"], "query": "{\"match_all\":{}}"
        }))
        .unwrap();
        assert_eq!(as_string.query.as_deref(), Some(r#"{"match_all":{}}"#));

        let as_object: IndexPrivilege = serde_json::from_value(json!({
            "names": ["a"], "privileges": ["read"], "query": {"match_all": {}}
        }))
        .unwrap();
        assert_eq!(as_object.query.as_deref(), Some(r#"{"match_all":{}}"#));
    }

    #[test]
    fn test_role_mapping_body() {
        let mapping = RoleMapping {
            enabled: false,
            roles: vec!["viewer".to_string()],
            rules: RuleExpression::field("username", "alice"),
        };
        assert_eq!(
            serde_json::to_value(&mapping).unwrap(),
            json!({
                "enabled": false,
                "roles": ["viewer"],
                "rules": {"field": {"username": "alice"}}
            })
        );
    }

    #[test]
    fn test_role_mapping_record_tolerates_rich_rules() {
        let record: RoleMappingRecord = serde_json::from_value(json!({
            "enabled": true,
            "roles": ["viewer"],
            "rules": {"field": {"groups": ["a", "b"]}},
            "metadata": {}
        }))
        .unwrap();

        assert_eq!(record.roles, vec!["viewer"]);
        assert!(matches!(record.rule_expression(), Some(Err(_))));
    }

    #[test]
    fn test_role_mapping_record_defaults() {
        let record: RoleMappingRecord = serde_json::from_value(json!({})).unwrap();
        assert!(record.enabled);
        assert!(record.roles.is_empty());
        assert!(record.rule_expression().is_none());
    }
}
