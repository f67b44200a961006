//! Tag and attribute names of the serialized record format
//!
//! A record is a tagged block `rt` with attributes `class`, `guid`, and
//! optionally `ownerguid`. Properties are child tags named by property name;
//! pointer properties hold zero or more `objsur` children with `t`
//! (`"o"` owning / `"r"` plain) and `guid`. Custom properties use a `Custom`
//! tag carrying a `name` attribute. An absent property element means
//! empty/default, never an error.

/// Tag of one serialized record.
pub const RT_TAG: &str = "rt";

/// Class (type name) attribute on the record tag.
pub const CLASS_ATTR: &str = "class";

/// Identity attribute on the record tag and on `objsur`.
pub const GUID_ATTR: &str = "guid";

/// Owner back-pointer attribute on the record tag.
pub const OWNER_ATTR: &str = "ownerguid";

/// Tag of one embedded object pointer.
pub const OBJSUR_TAG: &str = "objsur";

/// Kind attribute on `objsur`.
pub const OBJSUR_KIND_ATTR: &str = "t";

/// Kind value for an owning pointer.
pub const OBJSUR_OWNING: &str = "o";

/// Kind value for a plain (non-owning) pointer.
pub const OBJSUR_PLAIN: &str = "r";

/// Tag used for dynamically-added properties.
pub const CUSTOM_TAG: &str = "Custom";

/// Property-name attribute on a `Custom` tag.
pub const NAME_ATTR: &str = "name";
