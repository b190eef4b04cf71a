//! Raw JSON-RPC transport with ordered endpoint fallback.
//!
//! Individual blockchain RPC providers are unreliable; the client walks a
//! configured endpoint list in preference order and surfaces the first
//! success. Verifiers depend on the [`Rpc`] trait rather than the concrete
//! client so tests can substitute a canned transport.

mod client;

pub use client::RpcClient;

use crate::error::Result;
use serde_json::Value;

/// A JSON-RPC call executor.
///
/// `call` resolves to the response's `result` value on success. Implementors
/// must treat a JSON-RPC `error` field as a failure.
pub trait Rpc: Send + Sync {
    /// Execute a single JSON-RPC method call.
    fn call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;
}
