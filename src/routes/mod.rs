pub mod default_route;
pub mod order_route;
pub mod run_route;
