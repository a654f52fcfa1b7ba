#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

//! Message-dispatch core bridging a remote control plane and local
//! workers: a topic-keyed signal bus sequences lifecycle transitions, a
//! snapshot-isolated record store holds messages and worker
//! registrations, and the dispatcher routes each message to its worker,
//! dereferencing or delivering detached content over mutual-TLS HTTP.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod signal;
pub mod store;
pub mod transport;

pub use config::{DeliveryPolicy, DispatchConfig, TransportConfig};
pub use dispatch::{Dispatcher, DispatcherHandle, topic};
pub use error::{
    ApiResponseError, ConfigError, DispatchError, Result, StoreError, TransportError,
};
pub use signal::{SignalBus, SignalStream};
pub use store::{Message, MessageRole, ReadTxn, Store, Worker, WriteTxn};
pub use transport::{HttpResponse, HttpTransport};
