// florist_shop/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use florist_notify::{ChannelId, SchedulerConfig};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for `PAYMENT_OVERDUE_HOURS`: one year.
const MAX_PAYMENT_OVERDUE_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub seed_db: bool,

  pub telegram_token: String,
  pub telegram_api_url: String,
  pub poll_timeout_secs: u64,
  pub gateway_timeout: Duration,

  pub admin_channel_ids: Vec<ChannelId>,
  pub admin_api_token: Option<String>,
  pub shop_name: String,

  pub reminder_interval: Duration,
  pub payment_overdue_hours: i64,

  pub working_hours_start: u32,
  pub working_hours_end: u32,
  pub shop_utc_offset_hours: i32,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any key lookup; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let get_or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var::<u16>("SERVER_PORT", &get_or("SERVER_PORT", "8080"))?;

    let store_backend = get_or("STORE_BACKEND", "postgres").parse::<StoreBackend>()?;
    let database_url = get("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required for STORE_BACKEND=postgres)".to_string(),
      ));
    }
    let seed_db = parse_var::<bool>("SEED_DB", &get_or("SEED_DB", "false"))?;

    let telegram_token =
      get("TELEGRAM_TOKEN").ok_or_else(|| AppError::Config("Missing environment variable 'TELEGRAM_TOKEN'".to_string()))?;
    let telegram_api_url = get_or("TELEGRAM_API_URL", "https://api.telegram.org")
      .trim_end_matches('/')
      .to_string();
    let poll_timeout_secs = parse_var::<u64>("POLL_TIMEOUT_SECS", &get_or("POLL_TIMEOUT_SECS", "30"))?;
    let gateway_timeout = Duration::from_millis(parse_var::<u64>(
      "GATEWAY_TIMEOUT_MS",
      &get_or("GATEWAY_TIMEOUT_MS", "10000"),
    )?);

    let admin_channel_ids = parse_channel_list(&get_or("ADMIN_CHANNEL_IDS", ""))?;
    let admin_api_token = get("ADMIN_API_TOKEN");
    let shop_name = get_or("SHOP_NAME", "Flower Shop");

    let reminder_interval = Duration::from_secs(parse_var::<u64>(
      "REMINDER_INTERVAL_SECS",
      &get_or("REMINDER_INTERVAL_SECS", "10800"),
    )?);
    if reminder_interval.is_zero() {
      return Err(AppError::Config("REMINDER_INTERVAL_SECS must be positive".to_string()));
    }
    let payment_overdue_hours = parse_var::<i64>("PAYMENT_OVERDUE_HOURS", &get_or("PAYMENT_OVERDUE_HOURS", "24"))?;
    if !(1..=MAX_PAYMENT_OVERDUE_HOURS).contains(&payment_overdue_hours) {
      return Err(AppError::Config(format!(
        "PAYMENT_OVERDUE_HOURS must be between 1 and {}",
        MAX_PAYMENT_OVERDUE_HOURS
      )));
    }

    let working_hours_start = parse_var::<u32>("WORKING_HOURS_START", &get_or("WORKING_HOURS_START", "9"))?;
    let working_hours_end = parse_var::<u32>("WORKING_HOURS_END", &get_or("WORKING_HOURS_END", "21"))?;
    if working_hours_start > 23 || working_hours_end > 24 || working_hours_start >= working_hours_end {
      return Err(AppError::Config(format!(
        "Invalid working hours {}..{}: expected 0 <= start < end <= 24",
        working_hours_start, working_hours_end
      )));
    }
    let shop_utc_offset_hours = parse_var::<i32>("SHOP_UTC_OFFSET_HOURS", &get_or("SHOP_UTC_OFFSET_HOURS", "3"))?;

    tracing::info!(backend = ?store_backend, admins = admin_channel_ids.len(), "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      seed_db,
      telegram_token,
      telegram_api_url,
      poll_timeout_secs,
      gateway_timeout,
      admin_channel_ids,
      admin_api_token,
      shop_name,
      reminder_interval,
      payment_overdue_hours,
      working_hours_start,
      working_hours_end,
      shop_utc_offset_hours,
    })
  }

  pub fn scheduler_config(&self) -> SchedulerConfig {
    SchedulerConfig {
      sweep_interval: self.reminder_interval,
      overdue_after: chrono::Duration::hours(self.payment_overdue_hours),
      gateway_timeout: self.gateway_timeout,
      admin_channels: self.admin_channel_ids.clone(),
      shop_name: self.shop_name.clone(),
      ..SchedulerConfig::default()
    }
  }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}

fn parse_channel_list(raw: &str) -> Result<Vec<ChannelId>> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .map(|part| parse_var::<i64>("ADMIN_CHANNEL_IDS", part).map(ChannelId))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    AppConfig::from_lookup(|name| vars.get(name).cloned())
  }

  #[test]
  fn defaults_apply_for_optional_keys() {
    let config = config_from(&[("TELEGRAM_TOKEN", "t"), ("STORE_BACKEND", "memory")]).unwrap();
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.reminder_interval, Duration::from_secs(10800));
    assert_eq!(config.payment_overdue_hours, 24);
    assert_eq!(config.gateway_timeout, Duration::from_millis(10000));
    assert_eq!((config.working_hours_start, config.working_hours_end), (9, 21));
    assert_eq!(config.shop_utc_offset_hours, 3);
    assert!(config.admin_channel_ids.is_empty());
    assert_eq!(config.telegram_api_url, "https://api.telegram.org");
  }

  #[test]
  fn admin_channel_list_is_parsed() {
    let config = config_from(&[
      ("TELEGRAM_TOKEN", "t"),
      ("STORE_BACKEND", "memory"),
      ("ADMIN_CHANNEL_IDS", " 11, -100200 ,,"),
    ])
    .unwrap();
    assert_eq!(config.admin_channel_ids, vec![ChannelId(11), ChannelId(-100200)]);
  }

  #[test]
  fn postgres_backend_requires_database_url() {
    let err = config_from(&[("TELEGRAM_TOKEN", "t")]).unwrap_err();
    assert!(matches!(err, AppError::Config(m) if m.contains("DATABASE_URL")));
  }

  #[test]
  fn malformed_values_are_config_errors() {
    let base = [("TELEGRAM_TOKEN", "t"), ("STORE_BACKEND", "memory")];
    for (key, value) in [
      ("SERVER_PORT", "eighty"),
      ("ADMIN_CHANNEL_IDS", "1,abc"),
      ("REMINDER_INTERVAL_SECS", "0"),
      ("PAYMENT_OVERDUE_HOURS", "0"),
      ("PAYMENT_OVERDUE_HOURS", "-6"),
      ("PAYMENT_OVERDUE_HOURS", "9223372036854775807"),
      ("WORKING_HOURS_START", "22"),
      ("STORE_BACKEND", "redis"),
    ] {
      let mut pairs = base.to_vec();
      pairs.retain(|(k, _)| *k != key);
      pairs.push((key, value));
      assert!(matches!(config_from(&pairs), Err(AppError::Config(_))), "{}={}", key, value);
    }
  }

  #[test]
  fn overdue_threshold_accepts_the_full_year_bound() {
    let config = config_from(&[
      ("TELEGRAM_TOKEN", "t"),
      ("STORE_BACKEND", "memory"),
      ("PAYMENT_OVERDUE_HOURS", "8760"),
    ])
    .unwrap();
    assert_eq!(config.scheduler_config().overdue_after, chrono::Duration::days(365));
    let err = config_from(&[
      ("TELEGRAM_TOKEN", "t"),
      ("STORE_BACKEND", "memory"),
      ("PAYMENT_OVERDUE_HOURS", "8761"),
    ])
    .unwrap_err();
    assert!(matches!(err, AppError::Config(m) if m.contains("PAYMENT_OVERDUE_HOURS")));
  }

  #[test]
  fn scheduler_config_carries_reminder_settings() {
    let config = config_from(&[
      ("TELEGRAM_TOKEN", "t"),
      ("STORE_BACKEND", "memory"),
      ("PAYMENT_OVERDUE_HOURS", "48"),
      ("ADMIN_CHANNEL_IDS", "5"),
    ])
    .unwrap();
    let scheduler = config.scheduler_config();
    assert_eq!(scheduler.overdue_after, chrono::Duration::hours(48));
    assert_eq!(scheduler.admin_channels, vec![ChannelId(5)]);
  }
}
