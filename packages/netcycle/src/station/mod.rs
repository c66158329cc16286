mod driver;
mod handlers;

use core::cell::RefCell;

use embassy_futures::join::join;
use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    channel::Receiver,
};
use embassy_time::{with_timeout, Duration};
use log::{debug, error, info, warn};

pub use driver::StationDriver;

use crate::{
    error::{ConnectError, ConnectFailure, DriverError, ShutdownError},
    signal::{ReadySignal, SignalLease, SignalPool},
    types::{
        ConnectionState, Credentials, InterfaceHandle, StationEvent, MAX_ASSOCIATION_RETRIES,
        STATION_EVENT_QUEUE,
    },
};

pub const DEFAULT_ROUTE_PRIORITY: u8 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StationConfig<'a> {
    pub credentials: Credentials<'a>,
    pub interface: &'static str,
    pub route_priority: u8,
    pub max_retries: u8,
    /// `None` waits for addresses indefinitely.
    pub ready_timeout: Option<Duration>,
}

impl<'a> StationConfig<'a> {
    pub const fn new(credentials: Credentials<'a>, interface: &'static str) -> Self {
        Self {
            credentials,
            interface,
            route_priority: DEFAULT_ROUTE_PRIORITY,
            max_retries: MAX_ASSOCIATION_RETRIES,
            ready_timeout: None,
        }
    }

    pub const fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub const fn with_route_priority(mut self, route_priority: u8) -> Self {
        self.route_priority = route_priority;
        self
    }
}

/// Point-in-time copy of the manager's bookkeeping. Signal fields hold the
/// fire count of each leased signal, `None` when no signal is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StationSnapshot {
    pub state: ConnectionState,
    pub retries: u8,
    pub interface: Option<InterfaceHandle>,
    pub observing: bool,
    pub ipv4_ready: Option<u8>,
    pub ipv6_ready: Option<u8>,
}

struct Session<'a, M: RawMutex> {
    state: ConnectionState,
    retries: u8,
    iface: Option<InterfaceHandle>,
    observing: bool,
    /// Disconnect count that crossed the retry bound, latched until shutdown.
    exhausted: Option<u8>,
    reassociation_error: Option<DriverError>,
    ipv4_ready: Option<SignalLease<'a, M>>,
    ipv6_ready: Option<SignalLease<'a, M>>,
}

impl<M: RawMutex> Session<'_, M> {
    const fn idle() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retries: 0,
            iface: None,
            observing: false,
            exhausted: None,
            reassociation_error: None,
            ipv4_ready: None,
            ipv6_ready: None,
        }
    }

    fn release_waiters(&self) {
        if let Some(lease) = &self.ipv4_ready {
            lease.signal().fire();
        }
        if let Some(lease) = &self.ipv6_ready {
            lease.signal().fire();
        }
    }
}

/// Owns the station association for one connect/shutdown cycle at a time.
///
/// `connect` and `shutdown` run on the caller; the event handlers run inside
/// [`ConnectionManager::dispatch`], which the caller polls alongside (see
/// [`run_wake_cycle`](crate::run_wake_cycle)). The two sides only meet through
/// the ready signals.
pub struct ConnectionManager<'a, M: RawMutex, D: StationDriver> {
    driver: &'a D,
    signals: &'a SignalPool<M>,
    config: StationConfig<'a>,
    session: Mutex<M, RefCell<Session<'a, M>>>,
}

impl<'a, M: RawMutex, D: StationDriver> ConnectionManager<'a, M, D> {
    pub fn new(driver: &'a D, signals: &'a SignalPool<M>, config: StationConfig<'a>) -> Self {
        Self {
            driver,
            signals,
            config,
            session: Mutex::new(RefCell::new(Session::idle())),
        }
    }

    pub fn driver(&self) -> &'a D {
        self.driver
    }

    pub fn state(&self) -> ConnectionState {
        self.with_session(|session| session.state)
    }

    pub fn snapshot(&self) -> StationSnapshot {
        self.with_session(|session| StationSnapshot {
            state: session.state,
            retries: session.retries,
            interface: session.iface,
            observing: session.observing,
            ipv4_ready: session.ipv4_ready.as_ref().map(|l| l.signal().fires()),
            ipv6_ready: session.ipv6_ready.as_ref().map(|l| l.signal().fires()),
        })
    }

    pub async fn connect(&self) -> Result<(), ConnectError> {
        let admitted = self.with_session(|session| {
            if session.state != ConnectionState::Disconnected {
                return false;
            }
            session.state = ConnectionState::Connecting;
            session.retries = 0;
            session.exhausted = None;
            session.reassociation_error = None;
            true
        });
        if !admitted {
            warn!("connect refused, station is {}", self.state().as_str());
            return Err(ConnectError::InProgress);
        }

        let result = self.establish().await;
        if let Err(err) = result {
            self.with_session(|session| session.state = ConnectionState::Failed);
            error!("station connect failed: {}", err);
        }
        result
    }

    async fn establish(&self) -> Result<(), ConnectError> {
        self.driver.init().await.map_err(ConnectError::Driver)?;
        let iface = self
            .driver
            .create_interface(self.config.interface, self.config.route_priority)
            .map_err(ConnectError::Driver)?;
        self.with_session(|session| session.iface = Some(iface));
        self.driver
            .configure(&self.config.credentials)
            .await
            .map_err(ConnectError::Driver)?;
        self.driver.start().await.map_err(ConnectError::Driver)?;

        let (ipv4_ready, ipv6_ready) = self.arm_signals()?;

        info!("connecting to {}...", self.config.credentials.ssid);
        self.with_session(|session| session.state = ConnectionState::AwaitingAddresses);
        if let Err(err) = self.driver.associate().await {
            return Err(ConnectError::ConnectFailed(
                ConnectFailure::AssociationRequest(err),
            ));
        }

        info!("waiting for ip(s)");
        let both_ready = join(ipv4_ready.wait(), ipv6_ready.wait());
        match self.config.ready_timeout {
            Some(timeout) => {
                if with_timeout(timeout, both_ready).await.is_err() {
                    return Err(ConnectError::ConnectFailed(ConnectFailure::ReadyTimeout));
                }
            }
            None => {
                both_ready.await;
            }
        }

        let (exhausted, reassociation_error) =
            self.with_session(|session| (session.exhausted, session.reassociation_error));
        if let Some(attempts) = exhausted {
            return Err(ConnectError::ConnectFailed(
                ConnectFailure::RetriesExhausted { attempts },
            ));
        }
        if let Some(err) = reassociation_error {
            return Err(ConnectError::ConnectFailed(
                ConnectFailure::AssociationRequest(err),
            ));
        }

        self.with_session(|session| session.state = ConnectionState::Ready);
        info!("station ready on \"{}\"", iface.descriptor());
        Ok(())
    }

    /// Leases both ready signals and registers the event observers.
    fn arm_signals(&self) -> Result<(&'a ReadySignal<M>, &'a ReadySignal<M>), ConnectError> {
        let ipv4 = self.signals.claim().ok_or(ConnectError::ResourceExhausted)?;
        let Some(ipv6) = self.signals.claim() else {
            drop(ipv4);
            return Err(ConnectError::ResourceExhausted);
        };
        let armed = (ipv4.signal(), ipv6.signal());
        self.with_session(|session| {
            session.ipv4_ready = Some(ipv4);
            session.ipv6_ready = Some(ipv6);
            session.observing = true;
        });
        Ok(armed)
    }

    /// Safe to call repeatedly, with or without a preceding `connect`.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        let leases = self.with_session(|session| {
            session.observing = false;
            session.retries = 0;
            session.exhausted = None;
            session.reassociation_error = None;
            (session.ipv4_ready.take(), session.ipv6_ready.take())
        });
        drop(leases);

        if let Err(err) = self.driver.disassociate().await {
            debug!("disassociate: {}", err);
        }

        match self.driver.stop().await {
            Ok(()) => self.driver.deinit().await.map_err(ShutdownError::Deinit)?,
            Err(DriverError::NotInitialized) => debug!("radio already stopped"),
            Err(err) => return Err(ShutdownError::Stop(err)),
        }

        if let Some(iface) = self.with_session(|session| session.iface.take()) {
            self.driver.destroy_interface(iface);
        }
        self.with_session(|session| session.state = ConnectionState::Disconnected);
        Ok(())
    }

    /// Runs the event handlers for everything the platform queues.
    pub async fn dispatch(&self, events: Receiver<'_, M, StationEvent, STATION_EVENT_QUEUE>) -> ! {
        loop {
            let event = events.receive().await;
            self.handle_event(event).await;
        }
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut Session<'a, M>) -> R) -> R {
        self.session.lock(|cell| f(&mut cell.borrow_mut()))
    }
}
