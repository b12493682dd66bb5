// florist_notify/src/ports/users.rs

use async_trait::async_trait;

use crate::error::NotifyResult;
use crate::model::{ChannelId, ProfileUpdate, UserId, UserProfile};

#[async_trait]
pub trait UserDirectory: Send + Sync {
  async fn get(&self, user_id: UserId) -> NotifyResult<Option<UserProfile>>;

  async fn channel_id(&self, user_id: UserId) -> NotifyResult<Option<ChannelId>> {
    Ok(self.get(user_id).await?.and_then(|profile| profile.channel_id))
  }

  async fn is_fallback_notified(&self, user_id: UserId) -> NotifyResult<bool> {
    Ok(self.get(user_id).await?.map(|profile| profile.notified_fallback).unwrap_or(false))
  }

  /// Flips the sticky fallback flag. Returns `true` only for the call that actually flipped it,
  /// so two racing callers cannot both log the fallback notice.
  async fn set_fallback_notified(&self, user_id: UserId) -> NotifyResult<bool>;

  async fn find_by_channel(&self, channel_id: ChannelId) -> NotifyResult<Option<UserProfile>>;

  /// `phone` is expected in normalised form.
  async fn find_by_phone(&self, phone: &str) -> NotifyResult<Option<UserProfile>>;

  async fn set_channel(&self, user_id: UserId, channel_id: Option<ChannelId>) -> NotifyResult<()>;

  /// Applies a partial edit and returns the updated profile, or `None` for an unknown user.
  async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> NotifyResult<Option<UserProfile>>;
}
