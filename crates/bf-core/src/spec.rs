// SPDX-License-Identifier: MIT OR Apache-2.0
//! The canonical intermediate representation produced by the Prompt→Spec
//! Agent (C3) and consumed by the (external) templating collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A project name that has already passed the slug grammar: lowercase,
/// starts with a letter, letters/digits/hyphens only, ≤ 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectSlug(String);

impl ProjectSlug {
    /// Validate and wrap a raw string as a [`ProjectSlug`].
    pub fn new(raw: impl Into<String>) -> Result<Self, SpecError> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > 64 {
            return Err(SpecError::InvalidProjectName {
                reason: "must be 1-64 characters".into(),
            });
        }
        let mut chars = raw.chars();
        let first = chars.next().expect("non-empty checked above");
        if !first.is_ascii_lowercase() {
            return Err(SpecError::InvalidProjectName {
                reason: "must start with a lowercase letter".into(),
            });
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SpecError::InvalidProjectName {
                reason: "must contain only lowercase letters, digits, and hyphens".into(),
            });
        }
        Ok(Self(raw))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectSlug {
    type Error = SpecError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectSlug> for String {
    fn from(value: ProjectSlug) -> Self {
        value.0
    }
}

impl std::fmt::Display for ProjectSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed field-type enumeration (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Variable-length short text.
    String,
    /// Signed integer.
    Integer,
    /// Floating point.
    Float,
    /// Boolean.
    Boolean,
    /// Timestamp.
    Datetime,
    /// UUID.
    Uuid,
    /// Long-form text.
    Text,
}

/// A single column on an [`Entity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    /// snake_case field name.
    pub name: String,
    /// Fixed field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether this field is (part of) the entity's primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this field may be null.
    #[serde(default)]
    pub nullable: bool,
    /// Whether this field must be unique.
    #[serde(default)]
    pub unique: bool,
}

/// A database table/resource generated from the spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    /// PascalCase entity name.
    pub name: String,
    /// snake_case table name.
    pub table_name: String,
    /// Non-empty ordered sequence of fields.
    pub fields: Vec<Field>,
    /// Whether to generate full CRUD endpoints for this entity.
    #[serde(default)]
    pub crud: bool,
}

impl Entity {
    /// The entity's single primary-key field, if exactly one exists.
    pub fn primary_key(&self) -> Option<&Field> {
        let mut pks = self.fields.iter().filter(|f| f.primary_key);
        let first = pks.next()?;
        if pks.next().is_some() {
            None
        } else {
            Some(first)
        }
    }
}

/// The (MVP) single supported database backend, with a version string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Database {
    /// PostgreSQL, the only MVP variant.
    Postgres {
        /// Server version string, e.g. `"15"`.
        version: String,
    },
}

/// Auth subsystem configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuthConfig {
    /// Whether authentication is enabled for the generated backend.
    pub enabled: bool,
    /// Auth scheme identifier (e.g. `"jwt"`).
    pub kind: String,
    /// Token lifetime in minutes, constrained to `[1, 1440]`.
    pub token_expiry_minutes: u32,
}

/// The canonical, validated intermediate representation of a backend
/// project (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Spec {
    /// Validated project slug.
    pub project_name: ProjectSlug,
    /// Free-text description.
    pub description: String,
    /// Database backend.
    pub database: Database,
    /// Auth configuration.
    pub auth: AuthConfig,
    /// Non-empty ordered sequence of entities.
    pub entities: Vec<Entity>,
    /// Schema-evolution marker.
    pub spec_version: String,
}

/// Reserved identifiers a field name may not collide with, except `id`
/// itself which is explicitly allowed (§4.5).
pub const RESERVED_FIELD_NAMES: &[&str] = &["type", "class", "import", "from", "return", "pass"];

/// "Generic" project names the reviewer warns about (§4.5).
pub const GENERIC_PROJECT_NAMES: &[&str] = &["app", "test", "tests", "src", "lib"];

/// Structural validation errors — type/shape and the invariants from §3
/// that a `Spec` can never legally violate. Cross-field semantic checks
/// that are better expressed as warnings live in `bf-reviewer` (C5)
/// instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    /// `project_name` failed the slug grammar.
    #[error("invalid project name: {reason}")]
    InvalidProjectName {
        /// Why the name was rejected.
        reason: String,
    },
    /// `entities` was empty.
    #[error("spec must declare at least one entity")]
    NoEntities,
    /// An entity declared zero fields.
    #[error("entity '{entity}' must declare at least one field")]
    EntityHasNoFields {
        /// Offending entity name.
        entity: String,
    },
    /// Two entities share a case-insensitive name.
    #[error("duplicate entity name (case-insensitive): {name}")]
    DuplicateEntityName {
        /// The colliding name.
        name: String,
    },
    /// Two entities share a table name.
    #[error("duplicate table name: {table_name}")]
    DuplicateTableName {
        /// The colliding table name.
        table_name: String,
    },
    /// An entity does not have exactly one primary-key field.
    #[error("entity '{entity}' must have exactly one primary-key field, found {count}")]
    WrongPrimaryKeyCount {
        /// Offending entity name.
        entity: String,
        /// Number of fields marked `primary_key`.
        count: usize,
    },
    /// An entity's primary-key field is nullable.
    #[error("entity '{entity}' primary key '{field}' must not be nullable")]
    NullablePrimaryKey {
        /// Offending entity name.
        entity: String,
        /// Offending field name.
        field: String,
    },
    /// `auth.token_expiry_minutes` is out of `[1, 1440]`.
    #[error("token_expiry_minutes must be within [1, 1440], got {value}")]
    InvalidTokenExpiry {
        /// The out-of-range value.
        value: u32,
    },
}

impl Spec {
    /// Run the structural invariants from §3 against this spec.
    ///
    /// Returns the first violation found; callers that want every violation
    /// at once should use `validate_all`.
    pub fn validate(&self) -> Result<(), SpecError> {
        self.validate_all().into_iter().next().map_or(Ok(()), Err)
    }

    /// Run every structural invariant, collecting all violations.
    pub fn validate_all(&self) -> Vec<SpecError> {
        let mut errors = Vec::new();

        if self.entities.is_empty() {
            errors.push(SpecError::NoEntities);
        }

        let mut seen_names = std::collections::HashSet::new();
        let mut seen_tables = std::collections::HashSet::new();

        for entity in &self.entities {
            if entity.fields.is_empty() {
                errors.push(SpecError::EntityHasNoFields {
                    entity: entity.name.clone(),
                });
            }

            let lower_name = entity.name.to_lowercase();
            if !seen_names.insert(lower_name) {
                errors.push(SpecError::DuplicateEntityName {
                    name: entity.name.clone(),
                });
            }
            if !seen_tables.insert(entity.table_name.clone()) {
                errors.push(SpecError::DuplicateTableName {
                    table_name: entity.table_name.clone(),
                });
            }

            let pk_count = entity.fields.iter().filter(|f| f.primary_key).count();
            if pk_count != 1 {
                errors.push(SpecError::WrongPrimaryKeyCount {
                    entity: entity.name.clone(),
                    count: pk_count,
                });
            } else if let Some(pk) = entity.primary_key()
                && pk.nullable
            {
                errors.push(SpecError::NullablePrimaryKey {
                    entity: entity.name.clone(),
                    field: pk.name.clone(),
                });
            }
        }

        if !(1..=1440).contains(&self.auth.token_expiry_minutes) {
            errors.push(SpecError::InvalidTokenExpiry {
                value: self.auth.token_expiry_minutes,
            });
        }

        errors
    }
}
