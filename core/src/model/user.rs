// florist_notify/src/model/user.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Opaque endpoint id on the messaging gateway (a Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

impl fmt::Display for ChannelId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
  pub id: UserId,
  pub full_name: String,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub channel_id: Option<ChannelId>,
  /// Sticky: flips false -> true at most once and is never reset here.
  pub notified_fallback: bool,
}

impl UserProfile {
  pub fn is_linked(&self) -> bool {
    self.channel_id.is_some()
  }
}

/// Partial profile edit coming from the web path; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
}

/// Normalises a phone number the way the shop stores them: separators stripped, national `8` and
/// bare `7` prefixes rewritten to `+7`.
pub fn normalize_phone(raw: &str) -> String {
  let cleaned: String = raw
    .trim()
    .chars()
    .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
    .collect();
  if let Some(rest) = cleaned.strip_prefix('8') {
    format!("+7{}", rest)
  } else if cleaned.starts_with('7') {
    format!("+{}", cleaned)
  } else {
    cleaned
  }
}

#[cfg(test)]
mod tests {
  use super::normalize_phone;

  #[test]
  fn phone_normalisation_rewrites_national_prefixes() {
    assert_eq!(normalize_phone("8 (999) 123-45-67"), "+79991234567");
    assert_eq!(normalize_phone("79991234567"), "+79991234567");
    assert_eq!(normalize_phone(" +7 999 123 45 67 "), "+79991234567");
    assert_eq!(normalize_phone("+44 20 7946 0958"), "+442079460958");
  }
}
