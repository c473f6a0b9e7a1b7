//! # Chain payment server
//! This crate hosts the headless service around the chain payment engine. It is responsible for:
//! * Running a reconciliation cycle on a fixed interval, matching on-chain transfers against pending orders.
//! * Delivering signed callbacks to merchants for paid orders, with retries and back-off.
//! * Sending payment alerts to a Telegram chat, if configured.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
pub mod callback_worker;
pub mod cli;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod scan_worker;
pub mod server;
