//! On-chain verification: ERC-1271 signature proof, requirement checks,
//! and the orchestrator tying them into one pass/fail decision.

pub mod abi;
mod orchestrator;
pub mod requirements;
pub mod signature;

pub use orchestrator::GateVerifier;
pub use requirements::{GatingRequirements, GatingSettings, TokenRequirement};
