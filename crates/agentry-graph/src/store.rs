//! Workflow persistence with optimistic concurrency.
//!
//! Every stored workflow carries a revision that increases by one on each
//! save. A writer passes the revision it last loaded; if another save landed
//! in between, the write fails with [`WorkflowError::VersionConflict`] and the
//! caller has to reload and retry. Each accepted save also stamps the
//! payload metadata with its creation and modification times.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{WorkflowError, WorkflowResult};
use crate::payload::WorkflowPayload;
use crate::registry::NodeRegistry;
use crate::validate::Validator;

/// Tracing target for store operations.
const TRACING_TARGET: &str = "agentry_graph::store";

/// A persisted workflow together with its revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWorkflow {
    /// Revision of this copy; the first save produces revision 1.
    pub revision: u64,
    /// Saved payload.
    pub payload: WorkflowPayload,
}

/// Storage backend for workflow payloads.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Loads the latest revision of a workflow.
    ///
    /// Fails with [`WorkflowError::WorkflowNotFound`] if nothing is stored
    /// under `id`.
    async fn load(&self, id: &str) -> WorkflowResult<StoredWorkflow>;

    /// Saves a new revision and returns its number.
    ///
    /// `expected_revision` is the revision the caller last loaded, or `0` for
    /// a workflow that has never been saved. The payload must pass
    /// validation. The stored copy is stamped through [`stamp`].
    async fn save(
        &self,
        id: &str,
        expected_revision: u64,
        payload: WorkflowPayload,
    ) -> WorkflowResult<u64>;
}

/// Rebuilds `payload` against `registry` and runs the validator on it.
///
/// Stores call this before accepting a write.
pub fn check_payload(registry: &Arc<NodeRegistry>, payload: &WorkflowPayload) -> WorkflowResult<()> {
    let graph = payload.clone().into_graph(Arc::clone(registry))?;
    Validator::new(registry).validate(&graph).into_result()
}

/// Compares the caller's revision against the stored one.
pub fn check_revision(expected: u64, actual: u64) -> WorkflowResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(WorkflowError::VersionConflict { expected, actual })
    }
}

/// Stamps `payload` as a modification at `now`.
///
/// The creation time is taken from `previous`, the revision being replaced,
/// so a client cannot rewrite it. A first save records `now` as both times.
pub fn stamp(previous: Option<&StoredWorkflow>, payload: &mut WorkflowPayload, now: Timestamp) {
    let metadata = &mut payload.metadata;
    metadata.created_at = previous.and_then(|stored| stored.payload.metadata.created_at);
    metadata.touch(now);
}

/// In-memory [`WorkflowStore`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    registry: Arc<NodeRegistry>,
    workflows: Arc<RwLock<HashMap<String, StoredWorkflow>>>,
}

impl MemoryStore {
    /// Creates an empty store that validates against `registry`.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            workflows: Arc::default(),
        }
    }

    /// Returns the number of stored workflows.
    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    /// Returns whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn load(&self, id: &str) -> WorkflowResult<StoredWorkflow> {
        self.workflows
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.to_owned()))
    }

    async fn save(
        &self,
        id: &str,
        expected_revision: u64,
        mut payload: WorkflowPayload,
    ) -> WorkflowResult<u64> {
        check_payload(&self.registry, &payload)?;

        let mut workflows = self.workflows.write().await;
        let previous = workflows.get(id);
        let current = previous.map_or(0, |stored| stored.revision);
        check_revision(expected_revision, current).inspect_err(|_| {
            tracing::warn!(
                target: TRACING_TARGET,
                workflow_id = %id,
                expected = expected_revision,
                actual = current,
                "stale workflow save rejected"
            );
        })?;
        stamp(previous, &mut payload, Timestamp::now());

        let revision = current + 1;
        workflows.insert(id.to_owned(), StoredWorkflow { revision, payload });

        tracing::debug!(
            target: TRACING_TARGET,
            workflow_id = %id,
            revision,
            "workflow saved"
        );

        Ok(revision)
    }
}
