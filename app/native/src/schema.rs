//! JSON Schema generation for the persisted rotation record and the host
//! configuration.

use schemars::Schema;

use crate::config::WallcycleConfig;
use crate::rotation::RotationConfig;

const SCHEMA_BASE_URL: &str = "https://raw.githubusercontent.com/wallcycle/wallcycle/main/schemas";

/// Which document a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaKind {
    /// The host configuration file.
    #[default]
    Config,
    /// The persisted rotation record.
    Record,
}

impl SchemaKind {
    const fn file_name(self) -> &'static str {
        match self {
            Self::Config => "wallcycle.schema.json",
            Self::Record => "rotation_config.schema.json",
        }
    }
}

/// Generates a JSON Schema for the given document.
#[must_use]
pub fn generate_schema(kind: SchemaKind) -> Schema {
    let mut schema = match kind {
        SchemaKind::Config => schemars::schema_for!(WallcycleConfig),
        SchemaKind::Record => schemars::schema_for!(RotationConfig),
    };

    if let Some(obj) = schema.as_object_mut() {
        obj.insert(
            "$id".to_string(),
            serde_json::json!(format!("{SCHEMA_BASE_URL}/{}", kind.file_name())),
        );
    }

    schema
}

/// Generates a pretty-printed JSON Schema string.
#[must_use]
pub fn generate_schema_json(kind: SchemaKind) -> String {
    serde_json::to_string_pretty(&generate_schema(kind)).unwrap_or_default()
}
