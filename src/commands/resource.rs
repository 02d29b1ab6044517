//! Single-operation resource commands
//!
//! Each command runs exactly one lifecycle operation and prints the
//! resulting state as JSON, with sensitive values masked:
//! - `create` / `update` - load state from a file and push it
//! - `read` - refresh state for a name
//! - `delete` - remove by name
//! - `import` - adopt an existing object by id

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{Operation, ResourceData, ResourceState, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::Context;
use crate::provider::Provider;
use crate::ui;

/// Load declarative state from a `.toml` or `.json` file
pub fn load_state(path: &Path) -> Result<ResourceData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read state file: {}", path.display()))?;

    let attributes: BTreeMap<String, Value> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") | None => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        Some(other) => bail!("Unsupported state file extension '.{other}'; use .toml or .json"),
    };

    Ok(ResourceData::from_attributes(attributes))
}

/// Create or update from a state file
pub fn write(
    ctx: &Context,
    provider: &Provider,
    operation: Operation,
    resource_type: &str,
    file: &Path,
) -> Result<()> {
    let mut data = load_state(file)?;
    provider.apply(operation, resource_type, &mut data)?;

    if !ctx.quiet {
        let verb = match operation {
            Operation::Create => "Created",
            _ => "Updated",
        };
        ui::success(&format!(
            "{verb} {}",
            ui::address(resource_type, data.id().unwrap_or_default())
        ));
    }
    print_state(provider, resource_type, &data)
}

/// Refresh state for one name
pub fn read(ctx: &Context, provider: &Provider, resource_type: &str, name: &str) -> Result<()> {
    let mut data = named(provider, resource_type, name)?;

    match provider.apply(Operation::Read, resource_type, &mut data)? {
        ResourceState::Present => print_state(provider, resource_type, &data),
        ResourceState::Absent => {
            if !ctx.quiet {
                ui::warn(&format!(
                    "{} does not exist",
                    ui::address(resource_type, name)
                ));
            }
            Ok(())
        }
    }
}

/// Delete by name
pub fn delete(ctx: &Context, provider: &Provider, resource_type: &str, name: &str) -> Result<()> {
    let mut data = named(provider, resource_type, name)?;
    data.set_id(name);

    provider.apply(Operation::Delete, resource_type, &mut data)?;

    if !ctx.quiet {
        ui::success(&format!("Deleted {}", ui::address(resource_type, name)));
    }
    Ok(())
}

/// Adopt an existing object
pub fn import(ctx: &Context, provider: &Provider, resource_type: &str, id: &str) -> Result<()> {
    let data = provider.import(resource_type, id)?;

    if !ctx.quiet {
        ui::success(&format!("Imported {}", ui::address(resource_type, id)));
        ui::dim("Rules of role mappings are not read back; add them to the state file");
    }
    print_state(provider, resource_type, &data)
}

/// State holding only the identifying field
fn named(provider: &Provider, resource_type: &str, name: &str) -> Result<ResourceData> {
    let handler = provider.resource(resource_type)?;
    let mut data = ResourceData::new();
    data.set(handler.id_field(), name);
    Ok(data)
}

/// State as pretty JSON, sensitive values masked
pub fn render_state(provider: &Provider, resource_type: &str, data: &ResourceData) -> Result<String> {
    let shown = provider.redact(resource_type, data)?;
    serde_json::to_string_pretty(&shown).context("Failed to serialize state")
}

fn print_state(provider: &Provider, resource_type: &str, data: &ResourceData) -> Result<()> {
    println!("{}", render_state(provider, resource_type, data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{RoleResource, UserResource};
    use secapi::{MockTransport, SecurityClient};
    use tempfile::TempDir;

    fn provider() -> (Provider, MockTransport) {
        let mock = MockTransport::new();
        let client = SecurityClient::with_transport(Box::new(mock.clone()));
        (Provider::with_client(client), mock)
    }

    fn quiet() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    #[test]
    fn test_load_toml_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mapping.toml");
        fs::write(
            &path,
            r#"
name = "alice"
roles = ["viewer"]
enabled = false

[[rules]]
[[rules.field]]
key = "username"
string_value = "alice"
"#,
        )
        .unwrap();

        let data = load_state(&path).unwrap();
        assert_eq!(data.get_string_list("roles").unwrap(), vec!["viewer"]);
        assert_eq!(data.get_bool("enabled").unwrap(), Some(false));
        let rules = data.get_blocks("rules").unwrap();
        let fields = rules[0].get_blocks("field").unwrap();
        assert_eq!(fields[0].get_string("key").unwrap().as_deref(), Some("username"));
    }

    #[test]
    fn test_load_json_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("role.json");
        fs::write(&path, r#"{"name": "readers", "cluster_privileges": ["monitor"]}"#).unwrap();

        let data = load_state(&path).unwrap();
        assert_eq!(data.get_string_list("cluster_privileges").unwrap(), vec!["monitor"]);
        assert_eq!(data.id(), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("role.yaml");
        fs::write(&path, "name: readers").unwrap();
        assert!(load_state(&path).is_err());
    }

    #[test]
    fn test_create_then_read_then_delete() {
        let (provider, mock) = provider();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("readers.toml");
        fs::write(&path, "name = \"readers\"\ncluster_privileges = [\"monitor\"]\n").unwrap();

        write(&quiet(), &provider, Operation::Create, RoleResource::TYPE, &path).unwrap();
        assert!(mock.role("readers").is_some());

        read(&quiet(), &provider, RoleResource::TYPE, "readers").unwrap();
        delete(&quiet(), &provider, RoleResource::TYPE, "readers").unwrap();
        assert!(mock.role("readers").is_none());

        read(&quiet(), &provider, RoleResource::TYPE, "readers").unwrap();
        assert!(delete(&quiet(), &provider, RoleResource::TYPE, "readers").is_err());
    }

    #[test]
    fn test_import_missing_fails() {
        let (provider, _mock) = provider();
        assert!(import(&quiet(), &provider, RoleResource::TYPE, "nobody").is_err());
    }

    #[test]
    fn test_rendered_state_masks_password() {
        let (provider, _mock) = provider();
        let mut data = ResourceData::new();
        data.set("username", "alice");
        data.set("password", "hunter2");

        let rendered = render_state(&provider, UserResource::TYPE, &data).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains(declarative::REDACTED));
    }
}
