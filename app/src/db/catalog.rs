// florist_shop/src/db/catalog.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use florist_notify::{Flower, FlowerCatalog, FlowerId, NotificationLog, NotifyResult, UserId};
use sqlx::{FromRow, PgPool};

use super::store_error;

#[derive(Debug, FromRow)]
struct FlowerRow {
  id: i64,
  name: String,
  price_cents: i64,
}

#[derive(Clone)]
pub struct PgCatalog {
  pool: PgPool,
}

impl PgCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl FlowerCatalog for PgCatalog {
  async fn get(&self, flower_id: FlowerId) -> NotifyResult<Option<Flower>> {
    let row: Option<FlowerRow> = sqlx::query_as("SELECT id, name, price_cents FROM flowers WHERE id = $1")
      .bind(flower_id.0)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(row.map(|row| Flower {
      id: FlowerId(row.id),
      name: row.name,
      price_cents: row.price_cents,
    }))
  }
}

/// Insert-only; rows are never updated.
#[derive(Clone)]
pub struct PgNotificationLog {
  pool: PgPool,
}

impl PgNotificationLog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl NotificationLog for PgNotificationLog {
  async fn append(&self, user_id: Option<UserId>, message: &str, created_at: DateTime<Utc>) -> NotifyResult<()> {
    sqlx::query("INSERT INTO notification_log (user_id, message, created_at) VALUES ($1, $2, $3)")
      .bind(user_id.map(|u| u.0))
      .bind(message)
      .bind(created_at)
      .execute(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(())
  }
}
