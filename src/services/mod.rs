//! Settlement services.
//!
//! Dependency order, leaves first: rate resolver, breakdown
//! calculator, wallet writer, commission ledger, COD settlement
//! coordinator, dashboard. Top-level operations own their transaction
//! boundary; leaf helpers only take the connection they are handed.

pub mod breakdown;
pub mod cod_settlement;
pub mod commission_ledger;
pub mod dashboard;
pub mod rate_resolver;
pub mod wallet_writer;
