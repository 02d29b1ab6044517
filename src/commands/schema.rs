//! `schema` and `types` commands; neither needs a cluster connection

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::Schema;

use crate::provider::{PROVIDER_NAME, provider_schema};
use crate::resource;
use crate::ui;

/// Schema of the provider itself, or of one resource type
pub fn lookup(resource_type: Option<&str>) -> Result<Schema> {
    let Some(resource_type) = resource_type else {
        return Ok(provider_schema());
    };

    let handlers = resource::all();
    match handlers
        .iter()
        .find(|handler| handler.resource_type() == resource_type)
    {
        Some(handler) => Ok(handler.schema()),
        None => bail!("Unknown resource type '{resource_type}'"),
    }
}

/// Print a schema as JSON
pub fn show(resource_type: Option<&str>) -> Result<()> {
    let schema = lookup(resource_type)?;
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    println!("{json}");
    Ok(())
}

/// List the registered resource types
pub fn types() {
    ui::header(&format!("{PROVIDER_NAME} resource types"));
    for handler in resource::all() {
        let schema = handler.schema();
        let required: Vec<_> = schema
            .fields()
            .filter(|(_, field)| field.required)
            .map(|(name, _)| name)
            .collect();
        ui::kv(handler.resource_type(), &format!("requires {}", required.join(", ")));
    }
}
