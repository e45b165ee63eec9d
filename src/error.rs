use thiserror::Error;

/// Result alias for fallible tree-state operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors surfaced by the tree state engine.
///
/// Absent keys are never an error: operations on unknown keys are no-ops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Checked keys were neither a key list nor a `{checked, halfChecked}` pair.
    #[error("checked keys must be a key list or a checked/halfChecked pair: {reason}")]
    MalformedCheckedKeys { reason: String },

    /// A check write (or commit) arrived while no check transaction was open.
    ///
    /// This signals a bug in the calling cascade, not bad data.
    #[error("check batch is not open (write for key '{key}')")]
    BatchNotOpen { key: String },

    /// Drop target lies inside the dragged subtree.
    #[error("cannot drop '{dragged}' onto '{target}': target is inside the dragged subtree")]
    InvalidDrop { dragged: String, target: String },

    /// The caller-supplied load hook failed.
    #[error("loading children of '{key}' failed: {reason}")]
    Load { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_not_open_names_the_key() {
        let err = TreeError::BatchNotOpen {
            key: "0-1".to_string(),
        };
        assert!(err.to_string().contains("'0-1'"));
    }

    #[test]
    fn invalid_drop_message_mentions_both_nodes() {
        let err = TreeError::InvalidDrop {
            dragged: "a".to_string(),
            target: "b".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'a'"));
        assert!(message.contains("'b'"));
    }
}
