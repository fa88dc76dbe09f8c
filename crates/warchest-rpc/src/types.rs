//! JSON-RPC wire types for the `status` and `validators` methods.

use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcEnvelope<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}

/// Error object returned by the node.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub chain_id: String,
    pub sync_info: SyncInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncInfo {
    pub latest_block_height: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorsResponse {
    pub epoch_start_height: u64,
    #[serde(default)]
    pub current_validators: Vec<ValidatorInfo>,
    #[serde(default)]
    pub next_validators: Vec<ValidatorInfo>,
    #[serde(default)]
    pub current_proposals: Vec<ValidatorInfo>,
}

/// One entry of a validator or proposal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub account_id: String,
    /// Fixed-point stake string.
    pub stake: String,
    #[serde(default)]
    pub num_produced_blocks: u64,
    #[serde(default)]
    pub num_expected_blocks: u64,
}
