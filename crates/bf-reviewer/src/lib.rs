// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-field and semantic review of a validated [`Spec`] (C5, §4.5).
//!
//! Structural shape (entity/field cardinality, uniqueness, primary-key
//! count) is enforced by [`bf_core::Spec::validate`]; this crate only
//! checks rules that need to see the whole Spec at once, or that are
//! judgment calls rather than hard invariants.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use bf_core::{Spec, GENERIC_PROJECT_NAMES};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Closed list of identifiers that are reserved in generated code, besides
/// `id` which is exempted (§4.5).
const RESERVED_IDENTIFIERS: &[&str] = &["type", "class", "import", "from", "return", "pass"];

/// The built-in users table name auth wiring reserves for itself.
const AUTH_USERS_TABLE: &str = "users";

/// A blocking review finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewError {
    /// Which entity the finding concerns, if any.
    pub entity: Option<String>,
    /// Description of the problem.
    pub message: String,
}

/// A non-blocking review finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWarning {
    /// Which entity the finding concerns, if any.
    pub entity: Option<String>,
    /// Description of the concern.
    pub message: String,
}

/// The outcome of reviewing a [`Spec`] (§4.5: `(valid, errors[], warnings[])`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReport {
    /// Whether the spec has no blocking errors.
    pub valid: bool,
    /// Blocking findings.
    pub errors: Vec<ReviewError>,
    /// Non-blocking findings.
    pub warnings: Vec<ReviewWarning>,
}

/// Review a spec for cross-field and semantic issues (§4.5). Pure and
/// deterministic: no I/O, same input always yields the same report.
pub fn review(spec: &Spec) -> ReviewReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for entity in &spec.entities {
        let mut seen_fields = HashSet::new();
        for field in &entity.fields {
            if !seen_fields.insert(field.name.as_str()) {
                errors.push(ReviewError {
                    entity: Some(entity.name.clone()),
                    message: format!("duplicate field name '{}'", field.name),
                });
            }

            if field.name != "id" && RESERVED_IDENTIFIERS.contains(&field.name.as_str()) {
                warnings.push(ReviewWarning {
                    entity: Some(entity.name.clone()),
                    message: format!("field name '{}' is a reserved identifier", field.name),
                });
            }

            if field.primary_key && field.nullable {
                errors.push(ReviewError {
                    entity: Some(entity.name.clone()),
                    message: format!("primary key field '{}' must not be nullable", field.name),
                });
            }
        }

        if spec.auth.enabled && entity.table_name.eq_ignore_ascii_case(AUTH_USERS_TABLE) {
            errors.push(ReviewError {
                entity: Some(entity.name.clone()),
                message: format!(
                    "table name '{}' collides with the built-in auth users table",
                    entity.table_name
                ),
            });
        }
    }

    if GENERIC_PROJECT_NAMES.contains(&spec.project_name.as_str()) {
        warnings.push(ReviewWarning {
            entity: None,
            message: format!("project name '{}' is generic", spec.project_name.as_str()),
        });
    }

    ReviewReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
