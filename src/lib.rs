pub mod command;
pub mod config;
pub mod engine;
pub mod model;
pub mod notify;
pub mod observability;
pub mod view;
