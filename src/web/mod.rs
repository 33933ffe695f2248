pub mod cors;
pub mod handlers;
pub mod models;
pub mod prompt;
pub mod routes;
