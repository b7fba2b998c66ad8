pub mod config;
pub mod custom;
pub mod error;
pub mod http_client;
pub mod matchday;
pub mod outcome;
pub mod predict_api;
pub mod provider;
pub mod state;
pub mod store;
