//! Application layer containing the core business logic orchestration.
//!
//! [`banking::BankingService`] owns the ledger and journal and exposes the
//! propose/confirm protocol. [`executor::BatchExecutor`] confirms batches on a
//! pool of tokio workers, reporting failures through an
//! [`error_collector::ErrorCollector`] instead of propagating them.

pub mod banking;
pub mod error_collector;
pub mod executor;
pub mod seeder;
