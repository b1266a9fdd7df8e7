pub mod activity;
pub mod route;
pub mod route_id;
