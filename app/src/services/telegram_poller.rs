// florist_shop/src/services/telegram_poller.rs

//! Long-polls the Bot API and feeds button presses and chat messages into the scheduler queue.

use florist_notify::EventPublisher;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::telegram::TelegramGateway;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub struct UpdatePoller {
  gateway: Arc<TelegramGateway>,
  publisher: EventPublisher,
  timeout_secs: u64,
}

impl UpdatePoller {
  pub fn new(gateway: Arc<TelegramGateway>, publisher: EventPublisher, timeout_secs: u64) -> Self {
    Self {
      gateway,
      publisher,
      timeout_secs,
    }
  }

  /// Polls until `stop` is cancelled or the scheduler queue closes.
  pub async fn run(self, stop: CancellationToken) {
    info!(timeout_secs = self.timeout_secs, "Telegram update poller started.");
    let mut offset: i64 = 0;
    let mut backoff = INITIAL_BACKOFF;

    loop {
      let polled = tokio::select! {
        biased;
        _ = stop.cancelled() => break,
        polled = self.gateway.get_updates(offset, self.timeout_secs) => polled,
      };

      let updates = match polled {
        Ok(updates) => {
          backoff = INITIAL_BACKOFF;
          updates
        }
        Err(e) => {
          warn!(error = %e, delay_secs = backoff.as_secs(), "getUpdates failed; retrying after backoff.");
          tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(backoff) => {}
          }
          backoff = (backoff * 2).min(MAX_BACKOFF);
          continue;
        }
      };

      for update in updates {
        offset = offset.max(update.update_id + 1);
        let update_id = update.update_id;
        let Some(event) = update.into_inbound() else {
          debug!(update_id, "Update carries nothing the bot handles; skipped.");
          continue;
        };
        if self.publisher.publish(event).await.is_err() {
          info!("Scheduler queue closed; update poller stopping.");
          return;
        }
      }
    }

    info!("Telegram update poller stopped.");
  }
}
