// florist_shop/src/db/mod.rs

//! Store backends. Postgres for production; the in-memory adapters from `florist_notify::memory`
//! for local runs without a database.

pub mod catalog;
pub mod orders;
pub mod seed;
pub mod users;

use florist_notify::memory::{InMemoryCatalog, InMemoryNotificationLog, InMemoryOrderStore, InMemoryUserDirectory};
use florist_notify::{Clock, FlowerCatalog, NotificationLog, NotifyError, OrderStore, UserDirectory};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use crate::errors::{AppError, Result};

pub use catalog::{PgCatalog, PgNotificationLog};
pub use orders::PgOrderStore;
pub use users::PgUserDirectory;

pub(crate) fn store_error(err: sqlx::Error) -> NotifyError {
  NotifyError::Store { source: err.into() }
}

/// Every store port, backed by one backend.
#[derive(Clone)]
pub struct Stores {
  pub orders: Arc<dyn OrderStore>,
  pub users: Arc<dyn UserDirectory>,
  pub catalog: Arc<dyn FlowerCatalog>,
  pub log: Arc<dyn NotificationLog>,
}

impl Stores {
  /// Connects, runs the embedded migrations and optionally seeds demo data.
  pub async fn postgres(database_url: &str, clock: Arc<dyn Clock>, seed: bool) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Successfully connected to the database.");

    sqlx::migrate!("./migrations")
      .run(&pool)
      .await
      .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;
    info!("Database migrations applied.");

    if seed {
      seed::seed_postgres(&pool).await?;
    }

    Ok(Self {
      orders: Arc::new(PgOrderStore::new(pool.clone(), clock)),
      users: Arc::new(PgUserDirectory::new(pool.clone())),
      catalog: Arc::new(PgCatalog::new(pool.clone())),
      log: Arc::new(PgNotificationLog::new(pool)),
    })
  }

  pub fn in_memory(clock: Arc<dyn Clock>, seed: bool) -> Self {
    let catalog = InMemoryCatalog::new();
    let users = InMemoryUserDirectory::new();
    if seed {
      seed::seed_memory(&catalog, &users);
    }
    info!(seeded = seed, "Using in-memory stores; data is lost on restart.");
    Self {
      orders: Arc::new(InMemoryOrderStore::new(clock)),
      users: Arc::new(users),
      catalog: Arc::new(catalog),
      log: Arc::new(InMemoryNotificationLog::new()),
    }
  }
}
