// florist_shop/src/web/tests.rs

use actix_web::{http::StatusCode, test, web, App};
use chrono::{TimeZone, Utc};
use florist_notify::memory::{
  FixedCalendar, FixedClock, InMemoryCatalog, InMemoryNotificationLog, InMemoryOrderStore, InMemoryUserDirectory,
  RecordingGateway,
};
use florist_notify::{
  ChannelId, Flower, FlowerId, OrderId, OrderStatus, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerPorts,
  UserId, UserProfile,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::configure_app_routes;
use crate::config::AppConfig;
use crate::services::OrderService;
use crate::state::AppState;

const ADMIN_TOKEN: &str = "admin-secret";
const CUSTOMER: UserId = UserId(1);
const CUSTOMER_CHAT: ChannelId = ChannelId(501);
const NO_PHONE: UserId = UserId(2);

struct World {
  orders: Arc<InMemoryOrderStore>,
  users: Arc<InMemoryUserDirectory>,
  gateway: Arc<RecordingGateway>,
  scheduler: SchedulerHandle,
  state: AppState,
}

fn world() -> World {
  let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()));
  let orders = Arc::new(InMemoryOrderStore::new(clock.clone()));
  let users = Arc::new(InMemoryUserDirectory::new());
  let catalog = Arc::new(InMemoryCatalog::with_flowers([
    Flower { id: FlowerId(1), name: "Red Rose".into(), price_cents: 35_000 },
    Flower { id: FlowerId(2), name: "Tulip Mix".into(), price_cents: 18_900 },
  ]));
  let gateway = Arc::new(RecordingGateway::new());

  users.insert(UserProfile {
    id: CUSTOMER,
    full_name: "Anna".into(),
    phone: Some("+79990001122".into()),
    address: None,
    channel_id: Some(CUSTOMER_CHAT),
    notified_fallback: false,
  });
  users.insert(UserProfile {
    id: NO_PHONE,
    full_name: "Boris".into(),
    phone: None,
    address: None,
    channel_id: None,
    notified_fallback: false,
  });

  let ports = SchedulerPorts {
    orders: orders.clone(),
    users: users.clone(),
    log: Arc::new(InMemoryNotificationLog::new()),
    gateway: gateway.clone(),
    calendar: Arc::new(FixedCalendar::open()),
    clock,
  };
  let scheduler = Scheduler::new(ports, SchedulerConfig::default()).start();

  let config = AppConfig::from_lookup(|name| match name {
    "STORE_BACKEND" => Some("memory".to_string()),
    "TELEGRAM_TOKEN" => Some("TEST:TOKEN".to_string()),
    "ADMIN_API_TOKEN" => Some(ADMIN_TOKEN.to_string()),
    _ => None,
  })
  .unwrap();
  let service = OrderService::new(orders.clone(), users.clone(), catalog, scheduler.publisher());
  let state = AppState {
    orders: Arc::new(service),
    config: Arc::new(config),
  };

  World {
    orders,
    users,
    gateway,
    scheduler,
    state,
  }
}

macro_rules! app {
  ($world:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($world.state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn checkout_body() -> Value {
  json!({
    "address": "Lenina 1",
    "items": [
      {"flower_id": 1, "quantity": 2},
      {"flower_id": 2, "quantity": 1},
      {"flower_id": 1, "quantity": 1}
    ]
  })
}

#[actix_web::test]
async fn health_reports_ok() {
  let world = world();
  let app = app!(world);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  world.scheduler.shutdown().await;
}

#[actix_web::test]
async fn checkout_creates_order_and_queues_the_summary() {
  let world = world();
  let app = app!(world);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(("X-User-Id", "1"))
    .set_json(checkout_body())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["order"]["status"], "awaiting_payment");
  // 3 roses merged into one line plus the tulips.
  assert_eq!(body["order"]["items"].as_array().unwrap().len(), 2);
  assert_eq!(body["order"]["total_price_cents"], 3 * 35_000 + 18_900);

  // Shutdown drains the queue, so the creation message has been sent by now.
  world.scheduler.shutdown().await;
  let sent = world.gateway.sent_to(CUSTOMER_CHAT);
  assert_eq!(sent.len(), 1);
  assert!(sent[0].text.contains("Order #1"));
  assert_eq!(sent[0].payloads(), vec!["cancel_order_1".to_string()]);
}

#[actix_web::test]
async fn checkout_validates_profile_and_lines() {
  let world = world();
  let app = app!(world);

  let cases = [
    ("2", checkout_body(), StatusCode::BAD_REQUEST),
    ("1", json!({"address": "  ", "items": [{"flower_id": 1, "quantity": 1}]}), StatusCode::BAD_REQUEST),
    ("1", json!({"address": "Lenina 1", "items": []}), StatusCode::BAD_REQUEST),
    ("1", json!({"address": "Lenina 1", "items": [{"flower_id": 1, "quantity": 0}]}), StatusCode::BAD_REQUEST),
    ("1", json!({"address": "Lenina 1", "items": [{"flower_id": 99, "quantity": 1}]}), StatusCode::BAD_REQUEST),
    ("404", checkout_body(), StatusCode::NOT_FOUND),
  ];
  for (user, body, expected) in cases {
    let req = test::TestRequest::post()
      .uri("/api/v1/checkout")
      .insert_header(("X-User-Id", user))
      .set_json(body.clone())
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), expected, "user {} body {}", user, body);
  }
  assert!(world.orders.is_empty());
  world.scheduler.shutdown().await;
}

#[actix_web::test]
async fn requests_without_user_header_are_unauthorized() {
  let world = world();
  let app = app!(world);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/orders").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  world.scheduler.shutdown().await;
}

#[actix_web::test]
async fn user_cancel_is_guarded_by_ownership_and_terminal_status() {
  let world = world();
  let app = app!(world);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(("X-User-Id", "1"))
    .set_json(checkout_body())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  let foreign = test::TestRequest::post()
    .uri("/api/v1/orders/1/cancel")
    .insert_header(("X-User-Id", "2"))
    .to_request();
  assert_eq!(test::call_service(&app, foreign).await.status(), StatusCode::NOT_FOUND);

  let own = test::TestRequest::post()
    .uri("/api/v1/orders/1/cancel")
    .insert_header(("X-User-Id", "1"))
    .to_request();
  let resp = test::call_service(&app, own).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(world.orders.status_of(OrderId(1)), Some(OrderStatus::Canceled));

  let again = test::TestRequest::post()
    .uri("/api/v1/orders/1/cancel")
    .insert_header(("X-User-Id", "1"))
    .to_request();
  assert_eq!(test::call_service(&app, again).await.status(), StatusCode::CONFLICT);

  world.scheduler.shutdown().await;
  let sent = world.gateway.sent_to(CUSTOMER_CHAT);
  assert_eq!(sent.len(), 2, "creation summary and one status change");
  assert!(sent[1].text.contains("Canceled"));
}

#[actix_web::test]
async fn admin_status_changes_require_the_token_and_stop_at_terminal() {
  let world = world();
  let app = app!(world);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(("X-User-Id", "1"))
    .set_json(checkout_body())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  let set_status = |token: &str, status: &str| {
    test::TestRequest::post()
      .uri("/api/v1/admin/orders/1/status")
      .insert_header(("X-Admin-Token", token.to_string()))
      .set_json(json!({ "status": status }))
      .to_request()
  };

  assert_eq!(
    test::call_service(&app, set_status("wrong", "processing")).await.status(),
    StatusCode::UNAUTHORIZED
  );
  assert_eq!(
    test::call_service(&app, set_status(ADMIN_TOKEN, "processing")).await.status(),
    StatusCode::OK
  );
  // Same status again changes nothing and publishes nothing.
  assert_eq!(
    test::call_service(&app, set_status(ADMIN_TOKEN, "processing")).await.status(),
    StatusCode::OK
  );
  assert_eq!(
    test::call_service(&app, set_status(ADMIN_TOKEN, "shipped")).await.status(),
    StatusCode::OK
  );
  assert_eq!(
    test::call_service(&app, set_status(ADMIN_TOKEN, "delivered")).await.status(),
    StatusCode::CONFLICT
  );
  assert_eq!(world.orders.status_of(OrderId(1)), Some(OrderStatus::Shipped));

  let unknown = test::TestRequest::post()
    .uri("/api/v1/admin/orders/77/status")
    .insert_header(("X-Admin-Token", ADMIN_TOKEN))
    .set_json(json!({ "status": "pending" }))
    .to_request();
  assert_eq!(test::call_service(&app, unknown).await.status(), StatusCode::NOT_FOUND);

  world.scheduler.shutdown().await;
  let texts: Vec<String> = world
    .gateway
    .sent_to(CUSTOMER_CHAT)
    .into_iter()
    .map(|sent| sent.text)
    .collect();
  assert_eq!(texts.len(), 3, "summary, processing, shipped: {:?}", texts);
  assert!(texts[1].contains("Processing"));
  assert!(texts[2].contains("Shipped"));
}

#[actix_web::test]
async fn orders_are_listed_newest_first() {
  let world = world();
  let app = app!(world);

  for _ in 0..2 {
    let req = test::TestRequest::post()
      .uri("/api/v1/checkout")
      .insert_header(("X-User-Id", "1"))
      .set_json(checkout_body())
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
  }

  let req = test::TestRequest::get()
    .uri("/api/v1/orders")
    .insert_header(("X-User-Id", "1"))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let ids: Vec<i64> = body["orders"]
    .as_array()
    .unwrap()
    .iter()
    .map(|order| order["id"].as_i64().unwrap())
    .collect();
  assert_eq!(ids, vec![2, 1]);
  world.scheduler.shutdown().await;
}

#[actix_web::test]
async fn profile_update_normalises_phone_and_rejects_taken_numbers() {
  let world = world();
  let app = app!(world);

  let req = test::TestRequest::put()
    .uri("/api/v1/profile")
    .insert_header(("X-User-Id", "2"))
    .set_json(json!({"phone": "8 (999) 000-11-22"}))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

  let req = test::TestRequest::put()
    .uri("/api/v1/profile")
    .insert_header(("X-User-Id", "1"))
    .set_json(json!({"phone": "8 (999) 000-11-22", "address": "Mira 5"}))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["profile"]["phone"], "+79990001122");
  assert_eq!(body["profile"]["address"], "Mira 5");
  assert_eq!(world.users.snapshot(CUSTOMER).unwrap().address.as_deref(), Some("Mira 5"));

  world.scheduler.shutdown().await;
  let sent = world.gateway.sent_to(CUSTOMER_CHAT);
  assert_eq!(sent.len(), 1);
  assert!(sent[0].text.contains("Mira 5"));
}
