// florist_shop/src/web/extract.rs

use actix_web::{web, FromRequest, HttpRequest};
use florist_notify::UserId;
use futures_util::future::{ready, Ready};

use crate::errors::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Caller identity. Session handling lives in front of this service, which forwards the
/// authenticated user's id in a header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: UserId,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let parsed = req
      .headers()
      .get(USER_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.trim().parse::<i64>().ok())
      .map(|id| AuthenticatedUser { user_id: UserId(id) })
      .ok_or_else(|| AppError::Auth(format!("Missing or invalid {} header", USER_ID_HEADER)));
    ready(parsed)
  }
}

/// Proof that the request carries the configured admin API token.
#[derive(Debug, Clone, Copy)]
pub struct AdminToken;

impl FromRequest for AdminToken {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Internal("Application state is not configured".to_string())));
    };
    let Some(expected) = state.config.admin_api_token.as_deref() else {
      return ready(Err(AppError::Auth("Admin API is disabled".to_string())));
    };
    let presented = req.headers().get(ADMIN_TOKEN_HEADER).and_then(|value| value.to_str().ok());
    if presented == Some(expected) {
      ready(Ok(AdminToken))
    } else {
      ready(Err(AppError::Auth("Invalid admin token".to_string())))
    }
  }
}
