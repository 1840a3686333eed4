//! Rendering results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::RecordId;

/// One output artifact written for a customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    /// Record the artifact was rendered for
    pub record: RecordId,

    /// Final path of the artifact
    pub path: PathBuf,

    /// Size in bytes
    pub bytes: usize,
}

impl RenderedArtifact {
    /// Create a new artifact entry.
    pub fn new(record: RecordId, path: impl Into<PathBuf>, bytes: usize) -> Self {
        Self {
            record,
            path: path.into(),
            bytes,
        }
    }
}

/// Total size of a set of artifacts in bytes.
pub fn total_bytes(artifacts: &[RenderedArtifact]) -> usize {
    artifacts.iter().map(|a| a.bytes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_bytes() {
        let artifacts = vec![
            RenderedArtifact::new(RecordId::new(1, None), "out/record-1.pdf", 1200),
            RenderedArtifact::new(RecordId::new(2, None), "out/record-2.pdf", 800),
        ];
        assert_eq!(total_bytes(&artifacts), 2000);
        assert_eq!(total_bytes(&[]), 0);
    }
}
