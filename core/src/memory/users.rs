// florist_notify/src/memory/users.rs

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::{NotifyError, NotifyResult};
use crate::model::{ChannelId, ProfileUpdate, UserId, UserProfile};
use crate::ports::UserDirectory;

#[derive(Default)]
pub struct InMemoryUserDirectory {
  profiles: RwLock<BTreeMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, profile: UserProfile) {
    self.profiles.write().insert(profile.id, profile);
  }

  pub fn remove(&self, user_id: UserId) -> Option<UserProfile> {
    self.profiles.write().remove(&user_id)
  }

  pub fn snapshot(&self, user_id: UserId) -> Option<UserProfile> {
    self.profiles.read().get(&user_id).cloned()
  }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
  async fn get(&self, user_id: UserId) -> NotifyResult<Option<UserProfile>> {
    Ok(self.snapshot(user_id))
  }

  async fn set_fallback_notified(&self, user_id: UserId) -> NotifyResult<bool> {
    let mut profiles = self.profiles.write();
    let profile = profiles
      .get_mut(&user_id)
      .ok_or_else(|| NotifyError::NotFound(format!("user {}", user_id)))?;
    if profile.notified_fallback {
      return Ok(false);
    }
    profile.notified_fallback = true;
    Ok(true)
  }

  async fn find_by_channel(&self, channel_id: ChannelId) -> NotifyResult<Option<UserProfile>> {
    Ok(
      self
        .profiles
        .read()
        .values()
        .find(|profile| profile.channel_id == Some(channel_id))
        .cloned(),
    )
  }

  async fn find_by_phone(&self, phone: &str) -> NotifyResult<Option<UserProfile>> {
    Ok(
      self
        .profiles
        .read()
        .values()
        .find(|profile| profile.phone.as_deref() == Some(phone))
        .cloned(),
    )
  }

  async fn set_channel(&self, user_id: UserId, channel_id: Option<ChannelId>) -> NotifyResult<()> {
    let mut profiles = self.profiles.write();
    if let Some(channel_id) = channel_id {
      if let Some(holder) = profiles
        .values()
        .find(|profile| profile.channel_id == Some(channel_id) && profile.id != user_id)
      {
        return Err(NotifyError::Store {
          source: anyhow::anyhow!("channel {} is already linked to user {}", channel_id, holder.id),
        });
      }
    }
    let profile = profiles
      .get_mut(&user_id)
      .ok_or_else(|| NotifyError::NotFound(format!("user {}", user_id)))?;
    profile.channel_id = channel_id;
    Ok(())
  }

  async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> NotifyResult<Option<UserProfile>> {
    let mut profiles = self.profiles.write();
    let Some(profile) = profiles.get_mut(&user_id) else {
      return Ok(None);
    };
    if let Some(full_name) = update.full_name {
      profile.full_name = full_name;
    }
    if let Some(phone) = update.phone {
      profile.phone = Some(phone);
    }
    if let Some(address) = update.address {
      profile.address = Some(address);
    }
    Ok(Some(profile.clone()))
  }
}
