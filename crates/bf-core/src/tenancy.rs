// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ownership checks shared by every handler that looks up a user-scoped
//! resource (§5, §8: "a tenancy violation must manifest as `NotFound`,
//! never `Forbidden`, so as not to leak the existence of another
//! tenant's resource").

use bf_error::{BfError, ErrorCode};
use uuid::Uuid;

/// Verify that `owner_id` matches `requester_id`, returning a `NotFound`
/// [`BfError`] (not `Forbidden`) when it does not.
///
/// `resource` names the kind of thing being checked, for the error context
/// only (e.g. `"project"`, `"document"`).
pub fn check_owner(resource: &str, owner_id: Uuid, requester_id: Uuid) -> Result<(), BfError> {
    if owner_id == requester_id {
        return Ok(());
    }
    Err(BfError::new(ErrorCode::NotFound, format!("{resource} not found"))
        .with_context("resource", resource))
}
