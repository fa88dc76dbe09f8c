//! warchest-rpc — chain state polling for the warchest controller.
//!
//! # Architecture
//!
//! ```text
//! Poller (fixed interval)
//!   ├── ChainClient::status()            → chain id, latest block height
//!   ├── ChainClient::validators(height)  → epoch start, validator sets
//!   ├── build_snapshot()                 → EpochSnapshot for the pool
//!   └── send Result<EpochSnapshot, PollError> to the engine
//! ```
//!
//! A failed tick is sent as `Err(PollError)` instead of being swallowed, so
//! the engine can extrapolate block progress across RPC outages.

pub mod client;
pub mod poller;
pub mod types;

pub use client::{ChainClient, JsonRpcClient, RpcError, RpcFuture};
pub use poller::{build_snapshot, PollError, PollResult, Poller};
pub use types::{StatusResponse, SyncInfo, ValidatorInfo, ValidatorsResponse};
