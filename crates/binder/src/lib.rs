//! Snapshot-to-consumer binding.
//!
//! [`ModelBinder::bind_workspace`] copies the [`pagebind_model::SharedModel`]
//! under its lock, splits the copy per consumer into visible and other items,
//! sorts each bucket into reading order and posts the result to the UI
//! executor in a fixed phase order. Every posted unit is stamped with the
//! cycle's generation and becomes a no-op once a newer cycle starts.

mod binder;
pub mod completion;
pub mod config;
pub mod consumer;
pub mod error;
mod hold;
pub mod pages;
pub mod partition;
pub mod scheduler;
pub mod sort;

pub use binder::{BindCycle, ConsumerReport, ModelBinder};
pub use completion::{CompletionSignal, DeferredWork, RunnableList};
pub use config::{BinderConfig, ContractPolicy, DEFAULT_CHUNK_SIZE, DEFAULT_WIDGET_CHUNK_SIZE, UnknownContainerPolicy};
pub use consumer::{Consumer, Materialized, Materializer, SessionSettled};
pub use error::{BindError, ConfigError, Result};
pub use pages::PageSet;
pub use partition::{Partition, partition};
pub use scheduler::{BindPhase, Delivery, DeliveryKind, UnitOutcome};
pub use sort::sort_spatially;
