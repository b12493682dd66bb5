// florist_shop/src/db/seed.rs

//! Demo catalog and one demo customer, applied only when `SEED_DB=true`.

use florist_notify::memory::{InMemoryCatalog, InMemoryUserDirectory};
use florist_notify::{Flower, FlowerId, UserId, UserProfile};
use sqlx::PgPool;
use tracing::info;

use crate::errors::Result;

const DEMO_FLOWERS: [(&str, i64); 5] = [
  ("Red Rose", 35_000),
  ("White Lily", 42_000),
  ("Tulip Mix", 18_900),
  ("Sunflower", 12_500),
  ("Orchid in Pot", 159_000),
];

const DEMO_CUSTOMER_NAME: &str = "Demo Customer";
const DEMO_CUSTOMER_PHONE: &str = "+70000000000";

pub async fn seed_postgres(pool: &PgPool) -> Result<()> {
  let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flowers").fetch_one(pool).await?;
  if existing > 0 {
    info!(existing, "Catalog already populated; seeding skipped.");
    return Ok(());
  }

  let mut tx = pool.begin().await?;
  for (name, price_cents) in DEMO_FLOWERS {
    sqlx::query("INSERT INTO flowers (name, price_cents) VALUES ($1, $2)")
      .bind(name)
      .bind(price_cents)
      .execute(&mut *tx)
      .await?;
  }
  sqlx::query("INSERT INTO user_profiles (full_name, phone) VALUES ($1, $2) ON CONFLICT (phone) DO NOTHING")
    .bind(DEMO_CUSTOMER_NAME)
    .bind(DEMO_CUSTOMER_PHONE)
    .execute(&mut *tx)
    .await?;
  tx.commit().await?;

  info!(flowers = DEMO_FLOWERS.len(), "Database seeded with demo data.");
  Ok(())
}

pub fn seed_memory(catalog: &InMemoryCatalog, users: &InMemoryUserDirectory) {
  for (index, (name, price_cents)) in DEMO_FLOWERS.iter().enumerate() {
    catalog.insert(Flower {
      id: FlowerId(index as i64 + 1),
      name: name.to_string(),
      price_cents: *price_cents,
    });
  }
  users.insert(UserProfile {
    id: UserId(1),
    full_name: DEMO_CUSTOMER_NAME.to_string(),
    phone: Some(DEMO_CUSTOMER_PHONE.to_string()),
    address: None,
    channel_id: None,
    notified_fallback: false,
  });
}
