//! Portfolio forecast engine
//!
//! Batch stages that turn monthly per-product financial facts into seasonality
//! curves, trailing metrics, 12-month forecasts and overstock exposure, rolled
//! up from products to brands and categories.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;

pub use errors::ServiceError;
