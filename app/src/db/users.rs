// florist_shop/src/db/users.rs

use async_trait::async_trait;
use florist_notify::{ChannelId, NotifyError, NotifyResult, ProfileUpdate, UserDirectory, UserId, UserProfile};
use sqlx::{FromRow, PgPool};

use super::store_error;

#[derive(Debug, FromRow)]
struct ProfileRow {
  id: i64,
  full_name: String,
  phone: Option<String>,
  address: Option<String>,
  channel_id: Option<i64>,
  notified_fallback: bool,
}

impl From<ProfileRow> for UserProfile {
  fn from(row: ProfileRow) -> Self {
    UserProfile {
      id: UserId(row.id),
      full_name: row.full_name,
      phone: row.phone,
      address: row.address,
      channel_id: row.channel_id.map(ChannelId),
      notified_fallback: row.notified_fallback,
    }
  }
}

const PROFILE_COLUMNS: &str = "id, full_name, phone, address, channel_id, notified_fallback";

#[derive(Clone)]
pub struct PgUserDirectory {
  pool: PgPool,
}

impl PgUserDirectory {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn fetch_where(&self, condition: &str, value: i64) -> NotifyResult<Option<UserProfile>> {
    let row: Option<ProfileRow> = sqlx::query_as(&format!(
      "SELECT {} FROM user_profiles WHERE {} = $1",
      PROFILE_COLUMNS, condition
    ))
    .bind(value)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(row.map(UserProfile::from))
  }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
  async fn get(&self, user_id: UserId) -> NotifyResult<Option<UserProfile>> {
    self.fetch_where("id", user_id.0).await
  }

  async fn set_fallback_notified(&self, user_id: UserId) -> NotifyResult<bool> {
    let result = sqlx::query("UPDATE user_profiles SET notified_fallback = TRUE WHERE id = $1 AND notified_fallback = FALSE")
      .bind(user_id.0)
      .execute(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(result.rows_affected() == 1)
  }

  async fn find_by_channel(&self, channel_id: ChannelId) -> NotifyResult<Option<UserProfile>> {
    self.fetch_where("channel_id", channel_id.0).await
  }

  async fn find_by_phone(&self, phone: &str) -> NotifyResult<Option<UserProfile>> {
    let row: Option<ProfileRow> = sqlx::query_as(&format!(
      "SELECT {} FROM user_profiles WHERE phone = $1",
      PROFILE_COLUMNS
    ))
    .bind(phone)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(row.map(UserProfile::from))
  }

  async fn set_channel(&self, user_id: UserId, channel_id: Option<ChannelId>) -> NotifyResult<()> {
    let result = sqlx::query("UPDATE user_profiles SET channel_id = $2 WHERE id = $1")
      .bind(user_id.0)
      .bind(channel_id.map(|c| c.0))
      .execute(&self.pool)
      .await
      .map_err(store_error)?;
    if result.rows_affected() == 0 {
      return Err(NotifyError::NotFound(format!("user {}", user_id)));
    }
    Ok(())
  }

  async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> NotifyResult<Option<UserProfile>> {
    let row: Option<ProfileRow> = sqlx::query_as(&format!(
      "UPDATE user_profiles SET \
         full_name = COALESCE($2, full_name), \
         phone = COALESCE($3, phone), \
         address = COALESCE($4, address) \
       WHERE id = $1 RETURNING {}",
      PROFILE_COLUMNS
    ))
    .bind(user_id.0)
    .bind(update.full_name)
    .bind(update.phone)
    .bind(update.address)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(row.map(UserProfile::from))
  }
}
