//! Compiled contract artifacts (Hardhat JSON layout).

use std::path::Path;

use alloy::primitives::Bytes;
use serde::Deserialize;

use crate::error::{Result, SubsError};

/// Default location of the subscription contract artifact.
pub const DEFAULT_ARTIFACT_PATH: &str = "artifacts/contracts/OptimisticSubs.sol/OptimisticSubs.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    bytecode: String,
}

/// Creation bytecode of a compiled contract.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: Option<String>,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SubsError::Artifact(format!("{}: {e}", path.display())))?;
        let artifact = Self::from_json(&raw)?;

        tracing::debug!(
            target: "optisubs::artifact",
            path = %path.display(),
            contract = artifact.contract_name.as_deref().unwrap_or("<unnamed>"),
            code_len = artifact.bytecode.len(),
            "Loaded contract artifact"
        );
        Ok(artifact)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawArtifact =
            serde_json::from_str(json).map_err(|e| SubsError::Artifact(e.to_string()))?;

        let hex_code = raw.bytecode.trim_start_matches("0x");
        if hex_code.is_empty() {
            return Err(SubsError::Artifact(
                "artifact has no creation bytecode (abstract contract or interface?)".into(),
            ));
        }
        // Unlinked library placeholders (`__$...$__`) fail here as well.
        let bytecode = hex::decode(hex_code)
            .map_err(|e| SubsError::Artifact(format!("invalid bytecode: {e}")))?;

        Ok(Self {
            contract_name: raw.contract_name,
            bytecode: bytecode.into(),
        })
    }
}
