// florist_shop/src/web/mod.rs

pub mod extract;
pub mod handlers;
pub mod routes;

#[cfg(test)]
mod tests;

pub use routes::configure_app_routes;
