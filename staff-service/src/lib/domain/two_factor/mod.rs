pub mod models;
pub mod ports;
pub mod rate_limit;
pub mod service;
