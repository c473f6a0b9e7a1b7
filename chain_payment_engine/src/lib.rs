//! Chain Payment Engine
//!
//! The Chain Payment Engine reconciles USDT transfers observed on public blockchains (TRC-20 on Tron, ERC-20 on
//! Ethereum) against pending payment orders, and moves each matched order to `Paid` exactly once.
//!
//! The library is divided into these main sections:
//! 1. The interface contracts ([`traits`]) for the order store, the callback queue, the notification channel and the
//!    chain adapters. The engine only ever talks to these traits.
//! 2. A SQLite backend ([`SqliteDatabase`]) that implements the store and queue traits.
//! 3. The reconciliation pipeline: the [`validator`], the [`matcher`], the explorer-backed [`adapters`] and the
//!    [`reconciler`] that drives them on every cycle.
//! 4. The post-payment side effects: merchant [`callbacks`] and human-readable [`notifier`] alerts.
//!
//! Orders and monitored addresses are provisioned by an external system that writes to the same store. The data types
//! are defined in [`db_types`] and are public.
pub mod adapters;
pub mod callbacks;
pub mod db_types;
pub mod matcher;
pub mod notifier;
pub mod reconciler;
pub mod traits;
pub mod validator;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use reconciler::{CycleReport, ReconcileError, Reconciler, TransferOutcome};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
