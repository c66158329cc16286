//! Network core for a wake-triggered station: associate, exchange one request
//! with a fixed endpoint, validate the reply, tear the association down.
//!
//! Platform access goes through two seams: [`StationDriver`] for the radio and
//! [`Dialer`] for name resolution and stream sockets.

#![cfg_attr(not(test), no_std)]

pub mod cycle;
pub mod endpoint;
pub mod error;
pub mod signal;
pub mod station;
pub mod types;

#[cfg(test)]
mod test_support;

pub use cycle::run_wake_cycle;
pub use endpoint::{
    Dialer, EndpointClient, EndpointConfig, RequestDescriptor, ResponseValidator, StreamSocket,
    SuffixMatch,
};
pub use error::{
    ConnectError, ConnectFailure, CycleError, DialError, DriverError, EndpointError,
    NetworkStage, ShutdownError, ValidationError,
};
pub use signal::{ReadySignal, SignalLease, SignalPool};
pub use station::{ConnectionManager, StationConfig, StationDriver, StationSnapshot};
pub use types::{
    ConnectionState, Credentials, InterfaceHandle, Ipv6Scope, StationEvent, StationEvents,
};
