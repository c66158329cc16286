use crate::{
    error::DriverError,
    types::{Credentials, InterfaceHandle},
};

/// Radio operations the connection manager needs from the platform.
///
/// Association is asynchronous: `associate` only issues the request, and the
/// outcome arrives later as [`StationEvent`](crate::StationEvent)s on the
/// event queue the platform feeds.
#[allow(async_fn_in_trait)]
pub trait StationDriver {
    /// One-time bring-up of storage, network interfaces and event delivery.
    /// Must be safe to call on every wake cycle.
    async fn prepare(&self) -> Result<(), DriverError>;

    /// Initializes the radio in station mode.
    async fn init(&self) -> Result<(), DriverError>;

    fn create_interface(
        &self,
        descriptor: &'static str,
        route_priority: u8,
    ) -> Result<InterfaceHandle, DriverError>;

    async fn configure(&self, credentials: &Credentials<'_>) -> Result<(), DriverError>;

    async fn start(&self) -> Result<(), DriverError>;

    async fn associate(&self) -> Result<(), DriverError>;

    async fn create_ipv6_link_local(&self, iface: &InterfaceHandle) -> Result<(), DriverError>;

    async fn disassociate(&self) -> Result<(), DriverError>;

    /// Returns [`DriverError::NotInitialized`] when the radio is already down.
    async fn stop(&self) -> Result<(), DriverError>;

    async fn deinit(&self) -> Result<(), DriverError>;

    fn destroy_interface(&self, iface: InterfaceHandle);
}
