//! Commission and settlement ledger for a multi-vendor marketplace.
//!
//! The core computes, distributes, reverses and reconciles money
//! across three parties (platform, sellers, delivery agents) for
//! prepaid and cash-on-delivery orders, including the deferred
//! settlement where an agent collects cash and must remit it before
//! sellers are paid.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod money;
pub mod schema;
pub mod services;
