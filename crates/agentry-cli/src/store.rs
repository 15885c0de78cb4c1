//! File-backed workflow store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentry_graph::{WorkflowError, WorkflowResult};
use agentry_graph::payload::WorkflowPayload;
use agentry_graph::registry::NodeRegistry;
use agentry_graph::store::{StoredWorkflow, WorkflowStore, check_payload, check_revision, stamp};
use async_trait::async_trait;
use jiff::Timestamp;
use tokio::fs;
use tokio::sync::Mutex;

use crate::TRACING_TARGET_COMMAND;

/// [`WorkflowStore`] keeping one `<id>.json` file per workflow in a directory.
///
/// Each file is replaced atomically through a temporary file, so readers
/// never see a partial write.
///
/// The revision check only holds within one process: saves through the same
/// `FileStore` are serialized, but nothing locks the directory against other
/// processes. Two `agentry save` runs racing on the same id can both pass the
/// check, and the later rename wins. Give each store directory a single
/// writer process.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    registry: Arc<NodeRegistry>,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, registry: Arc<NodeRegistry>) -> Self {
        Self {
            dir: dir.into(),
            registry,
            write_lock: Mutex::new(()),
        }
    }

    fn path(&self, id: &str) -> WorkflowResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(WorkflowError::WorkflowNotFound(id.to_owned()));
        }

        Ok(self.dir.join(format!("{id}.json")))
    }

    async fn read(path: &Path) -> WorkflowResult<Option<StoredWorkflow>> {
        match fs::read_to_string(path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_error(path, &err)),
        }
    }

    async fn write(&self, path: &Path, stored: &StoredWorkflow) -> WorkflowResult<()> {
        let json = serde_json::to_string_pretty(stored)?;
        let staging = path.with_extension("json.tmp");

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| storage_error(&self.dir, &err))?;
        fs::write(&staging, json)
            .await
            .map_err(|err| storage_error(&staging, &err))?;
        fs::rename(&staging, path)
            .await
            .map_err(|err| storage_error(path, &err))
    }
}

fn storage_error(path: &Path, err: &std::io::Error) -> WorkflowError {
    WorkflowError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl WorkflowStore for FileStore {
    async fn load(&self, id: &str) -> WorkflowResult<StoredWorkflow> {
        let path = self.path(id)?;
        Self::read(&path)
            .await?
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.to_owned()))
    }

    async fn save(
        &self,
        id: &str,
        expected_revision: u64,
        mut payload: WorkflowPayload,
    ) -> WorkflowResult<u64> {
        let path = self.path(id)?;
        check_payload(&self.registry, &payload)?;

        let _guard = self.write_lock.lock().await;
        let previous = Self::read(&path).await?;
        let current = previous.as_ref().map_or(0, |stored| stored.revision);
        check_revision(expected_revision, current)?;
        stamp(previous.as_ref(), &mut payload, Timestamp::now());

        let revision = current + 1;
        self.write(&path, &StoredWorkflow { revision, payload })
            .await?;

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            workflow_id = %id,
            revision,
            path = %path.display(),
            "workflow written"
        );

        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use agentry_graph::graph::{PortRef, Position, WorkflowGraph};
    use agentry_graph::registry::NodeKind;

    use super::*;

    fn registry() -> Arc<NodeRegistry> {
        Arc::new(NodeRegistry::builtin())
    }

    fn payload() -> WorkflowPayload {
        let mut graph = WorkflowGraph::new(registry());
        let input = graph
            .add_node(NodeKind::Input, None, Position::default())
            .unwrap()
            .id;
        let output = graph
            .add_node(NodeKind::Output, None, Position::default())
            .unwrap()
            .id;
        graph
            .connect(PortRef::new(input, "value"), PortRef::new(output, "value"))
            .unwrap();
        graph.to_payload()
    }

    #[tokio::test]
    async fn saves_and_reloads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("workflows"), registry());

        let saved = payload();
        assert_eq!(store.save("support-bot", 0, saved.clone()).await.unwrap(), 1);
        assert!(dir.path().join("workflows/support-bot.json").is_file());

        // A fresh store over the same directory sees the saved revision.
        let reopened = FileStore::new(dir.path().join("workflows"), registry());
        let stored = reopened.load("support-bot").await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.payload.nodes, saved.nodes);
        assert_eq!(stored.payload.edges, saved.edges);
    }

    #[tokio::test]
    async fn resave_keeps_creation_time_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), registry());

        store.save("bot", 0, payload()).await.unwrap();
        let first = store.load("bot").await.unwrap().payload.metadata;
        assert!(first.created_at.is_some());

        store.save("bot", 1, payload()).await.unwrap();
        let second = store.load("bot").await.unwrap().payload.metadata;
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let json = std::fs::read_to_string(dir.path().join("bot.json")).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), registry());
        store.save("bot", 0, payload()).await.unwrap();

        let err = store.save("bot", 0, payload()).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::VersionConflict {
                expected: 0,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), registry());

        let err = store.save("../escape", 0, payload()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::WorkflowNotFound(_)));
        assert!(matches!(
            store.load("missing").await.unwrap_err(),
            WorkflowError::WorkflowNotFound(_)
        ));
    }
}
