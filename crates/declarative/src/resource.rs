//! Resource trait - the CRUD contract every managed entity satisfies
//!
//! A Resource is a stateless handler. It receives the host's declarative
//! state and a client handle on every call and keeps nothing between
//! calls. Create and update are two explicit phases: [`Resource::write`]
//! pushes the payload, then [`Resource::read`] pulls back what the remote
//! side accepted.

use crate::data::ResourceData;
use crate::error::Error;
use crate::schema::Schema;
use crate::types::ResourceState;
use anyhow::{Context, Result};
use std::fmt;

/// Core trait for declarative resources
///
/// `C` is the client handle, owned by the host and lent to each call.
///
/// # Example
///
/// ```ignore
/// use declarative::{Resource, ResourceData, ResourceState, Schema};
///
/// #[derive(Debug)]
/// struct Note;
///
/// impl Resource<NotesClient> for Note {
///     fn resource_type(&self) -> &'static str {
///         "note"
///     }
///
///     fn schema(&self) -> Schema {
///         Schema::new().field("name", FieldSchema::required(FieldType::String))
///     }
///
///     fn write(&self, data: &ResourceData, client: &NotesClient) -> anyhow::Result<()> {
///         client.put(&data.require_string("name")?)
///     }
///
///     fn read(&self, data: &mut ResourceData, client: &NotesClient) -> anyhow::Result<ResourceState> {
///         let name = data.require_string("name")?;
///         if client.exists(&name)? {
///             data.set_id(name);
///             Ok(ResourceState::Present)
///         } else {
///             data.clear_id();
///             Ok(ResourceState::Absent)
///         }
///     }
///
///     fn delete(&self, data: &ResourceData, client: &NotesClient) -> anyhow::Result<()> {
///         client.delete(&data.require_string("name")?)
///     }
/// }
/// ```
pub trait Resource<C: ?Sized>: Send + Sync + fmt::Debug {
    /// Resource type name as the host knows it
    fn resource_type(&self) -> &'static str;

    /// Field declarations for this resource type
    fn schema(&self) -> Schema;

    /// Field that carries the identifier when importing
    fn id_field(&self) -> &'static str {
        "name"
    }

    /// Push the desired state to the remote side
    ///
    /// Does not touch local state. Validation failures must be reported
    /// before anything is sent.
    fn write(&self, data: &ResourceData, client: &C) -> Result<()>;

    /// Refresh local state from the remote side
    ///
    /// Sets the id and returns `Present` when the object exists. Clears the
    /// id and returns `Absent` when it does not.
    fn read(&self, data: &mut ResourceData, client: &C) -> Result<ResourceState>;

    /// Remove the object remotely
    fn delete(&self, data: &ResourceData, client: &C) -> Result<()>;

    /// Write, then read back
    fn create(&self, data: &mut ResourceData, client: &C) -> Result<()> {
        self.write(data, client)?;
        read_back(self, data, client)
    }

    /// Same as create: the remote side overwrites by key
    ///
    /// The key itself cannot change; renaming needs a delete and a create.
    fn update(&self, data: &mut ResourceData, client: &C) -> Result<()> {
        ensure_key_unchanged::<C, Self>(self, data)?;
        self.create(data, client)
    }

    /// Build state for an existing remote object from its raw identifier
    fn import(&self, id: &str, client: &C) -> Result<ResourceData> {
        let mut data = ResourceData::new();
        data.set(self.id_field(), id);
        data.set_id(id);

        match self.read(&mut data, client)? {
            ResourceState::Present => Ok(data),
            ResourceState::Absent => Err(Error::ImportNotFound {
                resource_type: self.resource_type().to_string(),
                id: id.to_string(),
            }
            .into()),
        }
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource<C> = Box<dyn Resource<C>>;

/// Reject state whose id field no longer matches the id it was stored under
///
/// Runs before anything is sent, so the object under the old id stays
/// where it is and is still tracked.
pub fn ensure_key_unchanged<C, R>(resource: &R, data: &ResourceData) -> crate::error::Result<()>
where
    C: ?Sized,
    R: Resource<C> + ?Sized,
{
    let Some(id) = data.id() else {
        return Ok(());
    };
    let field = resource.id_field();
    match data.get_string(field)? {
        Some(key) if key != id => Err(Error::Validation(format!(
            "{field} cannot change from '{id}' to '{key}'; delete and recreate instead"
        ))
        .in_field(field)),
        _ => Ok(()),
    }
}

/// Second phase of create/update
///
/// A failure here happens after the write went through, so the remote side
/// may already hold the new state while local state does not. The error
/// says so instead of hiding it.
pub fn read_back<C, R>(resource: &R, data: &mut ResourceData, client: &C) -> Result<()>
where
    C: ?Sized,
    R: Resource<C> + ?Sized,
{
    let id = data
        .get_string(resource.id_field())
        .ok()
        .flatten()
        .unwrap_or_default();

    let state = resource.read(data, client).with_context(|| {
        format!(
            "{} {} was written but reading it back failed; remote state may differ from local state",
            resource.resource_type(),
            id
        )
    })?;

    if state.is_absent() {
        log::warn!("{} {} vanished right after being written", resource.resource_type(), id);
        return Err(Error::VanishedAfterWrite {
            resource_type: resource.resource_type().to_string(),
            id,
        }
        .into());
    }
    Ok(())
}
