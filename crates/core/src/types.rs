//! Identifier and version newtypes
//!
//! - Identity: wrapper around a UUID, the only way records refer to each other
//! - TypeName: a record's class name under the current schema
//! - SchemaVersion: the whole-store integer version
//! - RefKind / Reference: embedded pointers between records

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Globally unique identifier for a record
///
/// An Identity wraps a UUID and never changes once assigned; a "change of
/// identity" removes the old record and adds a new one. Textual forms compare
/// case-insensitively because historical stores mix upper- and lower-case
/// hex; parsing normalizes, so two Identity values are equal exactly when
/// they name the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(Uuid);

impl Identity {
    /// Create a new random Identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an Identity from its textual form
    ///
    /// Accepts standard UUID format with or without hyphens, any case.
    /// Returns None if the string is not a valid UUID.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }

    /// Create an Identity from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The raw bytes of this Identity
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record's class name as understood by the current schema
///
/// The name may refer to a class that no longer exists in the live type
/// catalog (an "obsolete" record); the store indexes such records all the
/// same so that steps can find and rework them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    /// Create a TypeName from any string-like value
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whole-store schema version
///
/// One monotonically increasing integer attached to the store, never to a
/// record. Every migration step advances it by exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    /// The version one step after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw integer value
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an embedded reference binds the target's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefKind {
    /// Lifetime-binding; a record has at most one inbound owning reference.
    Owning,
    /// Non-owning pointer.
    Plain,
}

/// An embedded pointer from one record to another's Identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Owning or plain.
    pub kind: RefKind,
    /// Identity of the record pointed at.
    pub target: Identity,
}
