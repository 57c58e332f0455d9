pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod http_client;
pub mod logging;
pub mod model;
pub mod provider;
pub mod state;
pub mod view;
