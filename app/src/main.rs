// florist_shop/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, StoreBackend};
use crate::db::Stores;
use crate::errors::{AppError, Result as AppResult};
use crate::services::{OrderService, ShopHours, TelegramGateway, UpdatePoller};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use florist_notify::{Clock, Scheduler, SchedulerPorts, SystemClock};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting flower shop server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  if let Err(e) = run(app_config).await {
    tracing::error!(error = %e, "Flower shop server stopped with an error.");
    return Err(std::io::Error::other(e.to_string()));
  }
  tracing::info!("Flower shop server stopped.");
  Ok(())
}

async fn run(app_config: Arc<AppConfig>) -> AppResult<()> {
  let clock: Arc<dyn Clock> = Arc::new(SystemClock);

  let stores = match app_config.store_backend {
    StoreBackend::Postgres => {
      let url = app_config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      Stores::postgres(url, clock.clone(), app_config.seed_db).await?
    }
    StoreBackend::Memory => Stores::in_memory(clock.clone(), app_config.seed_db),
  };

  let calendar = ShopHours::new(
    app_config.working_hours_start,
    app_config.working_hours_end,
    app_config.shop_utc_offset_hours,
    clock.clone(),
  )?;
  let telegram = Arc::new(TelegramGateway::new(
    &app_config.telegram_api_url,
    &app_config.telegram_token,
  ));

  let scheduler = Scheduler::new(
    SchedulerPorts {
      orders: stores.orders.clone(),
      users: stores.users.clone(),
      log: stores.log.clone(),
      gateway: telegram.clone(),
      calendar: Arc::new(calendar),
      clock,
    },
    app_config.scheduler_config(),
  )
  .start();

  let poller_stop = scheduler.stop_token().child_token();
  let poller = tokio::spawn(
    UpdatePoller::new(telegram, scheduler.publisher(), app_config.poll_timeout_secs).run(poller_stop.clone()),
  );

  let app_state = AppState {
    orders: Arc::new(OrderService::new(
      stores.orders,
      stores.users,
      stores.catalog,
      scheduler.publisher(),
    )),
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  let server = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", server_address, e)))?
  .run();

  let served = server.await;

  // The HTTP side has stopped producing events; stop polling, then drain the scheduler.
  poller_stop.cancel();
  if let Err(e) = poller.await {
    tracing::error!(error = %e, "Update poller task ended abnormally.");
  }
  scheduler.shutdown().await;

  served.map_err(|e| AppError::Internal(format!("HTTP server failed: {}", e)))
}
