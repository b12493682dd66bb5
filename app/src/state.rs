// florist_shop/src/state.rs
use crate::config::AppConfig;
use crate::services::OrderService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub orders: Arc<OrderService>,
  pub config: Arc<AppConfig>,
}
