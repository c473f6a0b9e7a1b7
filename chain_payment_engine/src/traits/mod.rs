//! # Interface contracts of the reconciliation engine.
//!
//! The engine never talks to a concrete store, queue, explorer or chat service directly. Instead, it depends on the
//! traits in this module, and concrete implementations (e.g. [`crate::SqliteDatabase`],
//! [`crate::adapters::ExplorerAdapter`]) are supplied by the caller.
//!
//! * [`ReconciliationDatabase`] reads monitored addresses and pending orders, and performs the atomic `Pending` to
//!   `Paid` transition.
//! * [`CallbackQueue`] durably enqueues post-payment callbacks. [`CallbackJobManagement`] drains the queue.
//! * [`Notifier`] sends best-effort human-readable alerts.
//! * [`ChainAdapter`] fetches transfers from a chain explorer and applies the chain's acceptance rules.
mod callback_queue;
mod chain_adapter;
mod data_objects;
mod notifier;
mod reconciliation_database;

pub use callback_queue::{CallbackJobManagement, CallbackQueue, EnqueueError};
pub use chain_adapter::ChainAdapter;
pub use data_objects::MarkPaidResult;
pub use notifier::{Notifier, NotifyError};
pub use reconciliation_database::{PaymentGatewayError, ReconciliationDatabase};
