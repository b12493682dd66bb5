// florist_shop/src/web/handlers/mod.rs

pub mod order_handlers;
pub mod profile_handlers;
