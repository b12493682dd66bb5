// florist_notify/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

use crate::model::OrderId;

#[derive(Debug, Error)]
pub enum NotifyError {
  /// A compare-and-set lost against another writer that already finalized the order.
  #[error("Order #{order_id} was already finalized by another actor")]
  StoreConflict { order_id: OrderId },

  #[error("Gateway call '{operation}' failed. Source: {source}")]
  GatewayUnavailable {
    operation: &'static str,
    #[source]
    source: AnyhowError,
  },

  #[error("Gateway call '{operation}' timed out after {timeout:?}")]
  GatewayTimeout { operation: &'static str, timeout: Duration },

  #[error("Data integrity failure for order #{order_id}: {message}")]
  DataIntegrity { order_id: OrderId, message: String },

  #[error("Invalid callback payload '{payload}': {reason}")]
  InvalidPayload { payload: String, reason: String },

  #[error("Not found: {0}")]
  NotFound(String),

  /// The scheduler has shut down and no longer accepts events.
  #[error("Scheduler queue is closed")]
  QueueClosed,

  #[error("Store operation failed. Source: {source}")]
  Store {
    #[source]
    source: AnyhowError,
  },
}

impl NotifyError {
  pub fn gateway(operation: &'static str, source: impl Into<AnyhowError>) -> Self {
    NotifyError::GatewayUnavailable {
      operation,
      source: source.into(),
    }
  }

  /// Gateway failures are expected at runtime and are never retried within the same cycle.
  pub fn is_gateway_failure(&self) -> bool {
    matches!(
      self,
      NotifyError::GatewayUnavailable { .. } | NotifyError::GatewayTimeout { .. }
    )
  }
}

impl From<AnyhowError> for NotifyError {
  fn from(err: AnyhowError) -> Self {
    // Adapters sometimes bubble a NotifyError back up through anyhow; keep it as a store failure
    // rather than trying to reconstruct the original variant.
    NotifyError::Store { source: err }
  }
}

pub type NotifyResult<T, E = NotifyError> = std::result::Result<T, E>;
