// florist_shop/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{order_handlers, profile_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route("/checkout", web::post().to(order_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
      )
      .service(web::scope("/admin").route(
        "/orders/{order_id}/status",
        web::post().to(order_handlers::admin_set_status_handler),
      ))
      .route("/profile", web::put().to(profile_handlers::update_profile_handler)),
  );
}
