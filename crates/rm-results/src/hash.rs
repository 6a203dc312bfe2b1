//! Content-based hashing for run IDs.

use crate::ResultsResult;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
const RUN_ID_LEN: usize = 16;

/// Run ID from the serialized run configuration and the engine version.
pub fn compute_run_id<C: Serialize>(config: &C, engine_version: &str) -> ResultsResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(config)?.as_bytes());
    hasher.update(engine_version.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..RUN_ID_LEN].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_cycle::BoundaryConditions;

    #[test]
    fn hash_stability() {
        let bc = BoundaryConditions::default();
        let a = compute_run_id(&bc, "v1").unwrap();
        let b = compute_run_id(&bc, "v1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), RUN_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let a = compute_run_id(&BoundaryConditions::default(), "v1").unwrap();
        let warmer = BoundaryConditions {
            hot_outlet: 60.0,
            ..BoundaryConditions::default()
        };
        assert_ne!(a, compute_run_id(&warmer, "v1").unwrap());
        assert_ne!(a, compute_run_id(&BoundaryConditions::default(), "v2").unwrap());
    }
}
