// florist_shop/src/web/handlers/profile_handlers.rs

use actix_web::{web, HttpResponse};
use florist_notify::ProfileUpdate;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;

#[instrument(name = "handler::update_profile", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
  let profile = app_state.orders.update_profile(auth_user.user_id, body.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}
