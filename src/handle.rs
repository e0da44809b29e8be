use crate::error::{FlapiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Capability tag for a server-owned object. The service exposes its object
/// model as polymorphic handles, so the tag is data rather than a type
/// hierarchy on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleType {
    Scene,
    Shot,
    SequenceDescriptor,
    RenderSetup,
    RenderProcessor,
    FormatSet,
    Format,
}

impl fmt::Display for HandleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            HandleType::Scene => "Scene",
            HandleType::Shot => "Shot",
            HandleType::SequenceDescriptor => "SequenceDescriptor",
            HandleType::RenderSetup => "RenderSetup",
            HandleType::RenderProcessor => "RenderProcessor",
            HandleType::FormatSet => "FormatSet",
            HandleType::Format => "Format",
        };
        write!(f, "{}", name)
    }
}

/// Client-side proxy for a server-owned object: opaque server id, immutable
/// type tag, and the session that owns it. Cheap to copy; the registry on the
/// owning connection decides whether it is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    id: i64,
    kind: HandleType,
    session: Uuid,
}

impl Handle {
    pub(crate) fn new(id: i64, kind: HandleType, session: Uuid) -> Self {
        Handle { id, kind, session }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn kind(&self) -> HandleType {
        self.kind
    }

    pub(crate) fn session(&self) -> Uuid {
        self.session
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} id {}", self.kind, self.id)
    }
}

/// Tracks every live handle belonging to one session. The registry is the
/// authority on validity: a handle missing from here has been released (or
/// never existed) and must not reach the server again.
#[derive(Debug)]
pub(crate) struct HandleRegistry {
    session: Uuid,
    entries: HashMap<i64, HandleType>,
}

impl HandleRegistry {
    pub fn new(session: Uuid) -> Self {
        HandleRegistry {
            session,
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: i64, kind: HandleType) -> Handle {
        self.entries.insert(id, kind);
        Handle::new(id, kind, self.session)
    }

    /// Remove a handle. Returns false if it was already gone, which callers
    /// treat as a successful no-op so defensive double-release is harmless.
    pub fn remove(&mut self, id: i64) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drain every entry, for release-all during session close.
    pub fn drain(&mut self) -> Vec<(i64, HandleType)> {
        self.entries.drain().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Validate a handle for an operation expecting a particular tag.
    pub fn check(&self, handle: &Handle, expected: HandleType) -> Result<()> {
        if handle.session() != self.session {
            return Err(FlapiError::StaleHandle(format!(
                "{} belongs to another session",
                handle
            )));
        }
        match self.entries.get(&handle.id()) {
            None => Err(FlapiError::StaleHandle(format!(
                "{} has been released",
                handle
            ))),
            Some(kind) if *kind != expected => Err(FlapiError::TypeMismatch {
                expected,
                found: *kind,
            }),
            Some(_) => Ok(()),
        }
    }
}
