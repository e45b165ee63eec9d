//! Asynchronous child loading triggered by expansion.

use std::fmt;

use futures::future::BoxFuture;

use crate::error::{TreeError, TreeResult};

/// Caller-supplied hook that populates a node's children.
///
/// The returned future only fills the model; it never changes which keys are expanded.
pub trait LoadData<Id>: Send + Sync {
    fn load(&self, node: Id, key: &str) -> BoxFuture<'static, Result<(), String>>;
}

impl<Id, F> LoadData<Id> for F
where
    F: Fn(Id, &str) -> BoxFuture<'static, Result<(), String>> + Send + Sync,
{
    fn load(&self, node: Id, key: &str) -> BoxFuture<'static, Result<(), String>> {
        self(node, key)
    }
}

/// In-flight load started by an expansion.
///
/// Await [`PendingLoad::finish`] and hand the completion to
/// [`TreeState::apply_load_completion`](crate::TreeState::apply_load_completion).
pub struct PendingLoad<Id> {
    node: Id,
    key: String,
    expanded_keys: Vec<String>,
    future: BoxFuture<'static, Result<(), String>>,
}

/// Completed load carrying the expansion decided when it started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadCompletion<Id> {
    pub node: Id,
    pub key: String,
    pub expanded_keys: Vec<String>,
}

impl<Id> PendingLoad<Id> {
    pub(crate) fn new(
        node: Id,
        key: String,
        expanded_keys: Vec<String>,
        future: BoxFuture<'static, Result<(), String>>,
    ) -> Self {
        Self {
            node,
            key,
            expanded_keys,
            future,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Waits for the hook.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Load`] if the hook failed; the expansion already applied
    /// is not rolled back.
    pub async fn finish(self) -> TreeResult<LoadCompletion<Id>> {
        match self.future.await {
            Ok(()) => Ok(LoadCompletion {
                node: self.node,
                key: self.key,
                expanded_keys: self.expanded_keys,
            }),
            Err(reason) => {
                tracing::warn!(message = "tree.load.failed", key = %self.key, reason = %reason);
                Err(TreeError::Load {
                    key: self.key,
                    reason,
                })
            }
        }
    }
}

impl<Id: fmt::Debug> fmt::Debug for PendingLoad<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("node", &self.node)
            .field("key", &self.key)
            .field("expanded_keys", &self.expanded_keys)
            .finish_non_exhaustive()
    }
}
