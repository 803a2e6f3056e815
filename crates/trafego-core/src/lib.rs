//! Core trafego library (API client, session, dashboard state, config).

pub mod api;
pub mod config;
pub mod dashboard;
pub mod gate;
pub mod session;
