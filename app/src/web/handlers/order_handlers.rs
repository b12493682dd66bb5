// florist_shop/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use florist_notify::{OrderId, OrderStatus};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::CheckoutRequest;
use crate::state::AppState;
use crate::web::extract::{AdminToken, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
  pub status: OrderStatus,
}

#[instrument(name = "handler::checkout", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.checkout(auth_user.user_id, body.into_inner()).await?;
  info!(order_id = %order.id, "Checkout completed.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Order placed. Complete the payment to start processing.",
    "order": order,
  })))
}

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_orders(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::cancel_order", skip_all, fields(user_id = %auth_user.user_id, order_id = %path.as_ref()))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = OrderId(path.into_inner());
  let order = app_state.orders.cancel_order(auth_user.user_id, order_id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": format!("Order #{} canceled.", order.id),
    "order": order,
  })))
}

#[instrument(name = "handler::admin_set_status", skip_all, fields(order_id = %path.as_ref()))]
pub async fn admin_set_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminToken,
  path: web::Path<i64>,
  body: web::Json<StatusChangeRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = OrderId(path.into_inner());
  let order = app_state.orders.admin_set_status(order_id, body.status).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}
