// SPDX-License-Identifier: MIT OR Apache-2.0
//! Contract-only external collaborators (§6): templating, archive
//! assembly, and artifact storage. Real implementations live outside this
//! crate; the mocks here exist for pipeline tests.

use async_trait::async_trait;
use bf_core::Spec;
use bf_error::BfError;
use std::collections::HashMap;
use uuid::Uuid;

/// Pure, deterministic spec-to-files renderer (§6: "same spec => same
/// output").
#[async_trait]
pub trait Templating: Send + Sync {
    /// Render `spec` into a `relative_path -> utf8_content` map.
    async fn render(&self, spec: &Spec) -> Result<HashMap<String, String>, BfError>;
}

/// Opaque handle to an assembled archive; callers never inspect more than
/// the path (§6: "the handle is an opaque path").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle(pub String);

/// Packs a rendered file map into a ZIP rooted at `project_name` (§6).
#[async_trait]
pub trait ArchiveAssembler: Send + Sync {
    /// Assemble `files` into an archive and return its handle.
    async fn assemble(
        &self,
        project_name: &str,
        files: &HashMap<String, String>,
    ) -> Result<ArchiveHandle, BfError>;
}

/// Moves an assembled archive into per-tenant storage (§6).
#[async_trait]
pub trait ProjectStorage: Send + Sync {
    /// Persist `archive` under `{root}/{user_id}/{project_id}/…` and
    /// return the stored relative path.
    async fn save(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        archive: &ArchiveHandle,
    ) -> Result<String, BfError>;
}

/// An in-memory `Templating` double: returns a fixed file map regardless
/// of the spec's contents, for pipeline tests that only exercise
/// sequencing.
pub struct MockTemplating {
    files: HashMap<String, String>,
}

impl MockTemplating {
    /// Build a mock that always renders `files`.
    pub fn new(files: HashMap<String, String>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl Templating for MockTemplating {
    async fn render(&self, _spec: &Spec) -> Result<HashMap<String, String>, BfError> {
        Ok(self.files.clone())
    }
}

/// An in-memory `ArchiveAssembler` double.
pub struct MockArchiveAssembler;

#[async_trait]
impl ArchiveAssembler for MockArchiveAssembler {
    async fn assemble(
        &self,
        project_name: &str,
        files: &HashMap<String, String>,
    ) -> Result<ArchiveHandle, BfError> {
        Ok(ArchiveHandle(format!("/tmp/{project_name}-{}.zip", files.len())))
    }
}

/// An in-memory `ProjectStorage` double.
pub struct MockProjectStorage;

#[async_trait]
impl ProjectStorage for MockProjectStorage {
    async fn save(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        archive: &ArchiveHandle,
    ) -> Result<String, BfError> {
        let _ = &archive.0;
        Ok(format!("{user_id}/{project_id}/project.zip"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::{AuthConfig, Database, ProjectSlug};

    fn spec() -> Spec {
        Spec {
            project_name: ProjectSlug::new("demo").unwrap(),
            description: "demo".into(),
            database: Database::Postgres { version: "15".into() },
            auth: AuthConfig { enabled: false, kind: "none".into(), token_expiry_minutes: 60 },
            entities: vec![],
            spec_version: "1".into(),
        }
    }

    #[tokio::test]
    async fn mock_templating_returns_fixed_files() {
        let mut files = HashMap::new();
        files.insert("app/main.py".to_string(), "pass".to_string());
        let templating = MockTemplating::new(files.clone());
        assert_eq!(templating.render(&spec()).await.unwrap(), files);
    }

    #[tokio::test]
    async fn mock_storage_path_is_scoped_to_user_and_project() {
        let storage = MockProjectStorage;
        let user_id = Uuid::new_v4();
        let project_id = Uuid::new_v4();
        let path = storage
            .save(user_id, project_id, &ArchiveHandle("x.zip".into()))
            .await
            .unwrap();
        assert_eq!(path, format!("{user_id}/{project_id}/project.zip"));
    }
}
