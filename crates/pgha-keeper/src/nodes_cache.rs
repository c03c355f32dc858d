//! The offline peer cache (spec.md §3: "`pgha.nodes`: JSON array cache of
//! peers, used when running without a monitor"). Refreshed every time the
//! keeper successfully hears back from the monitor, so a node that loses
//! its monitor connection can still resolve its peers' addresses.

use std::path::Path;

use pgha_types::NodeAddress;
use serde::{Deserialize, Serialize};

use crate::atomic::{read_file, write_atomic};
use crate::error::KeeperError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodesCache {
    pub peers: Vec<NodeAddress>,
}

impl NodesCache {
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, KeeperError> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = read_file(path)?;
        let peers: Vec<NodeAddress> =
            serde_json::from_slice(&bytes).map_err(|source| KeeperError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Some(NodesCache { peers }))
    }

    pub fn save(&self, path: &Path) -> Result<(), KeeperError> {
        let bytes = serde_json::to_vec_pretty(&self.peers).map_err(|source| KeeperError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgha_types::{NodeId, NodeState};
    use tempfile::tempdir;

    fn sample_peer() -> NodeAddress {
        NodeAddress {
            node_id: NodeId::from(2),
            name: "node-b".to_string(),
            host: "10.0.0.2".to_string(),
            port: 5432,
            state: NodeState::Secondary,
        }
    }

    #[test]
    fn load_if_exists_returns_none_when_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.nodes");
        assert!(NodesCache::load_if_exists(&path).unwrap().is_none());
    }

    #[test]
    fn roundtrips_through_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pgha.nodes");
        let cache = NodesCache {
            peers: vec![sample_peer()],
        };

        cache.save(&path).unwrap();
        let loaded = NodesCache::load_if_exists(&path).unwrap().unwrap();
        assert_eq!(loaded, cache);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("node-b"));
    }
}
