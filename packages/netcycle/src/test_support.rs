use core::cell::{Cell, RefCell};
use std::{
    collections::VecDeque,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    vec::Vec,
};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

use crate::{
    endpoint::{Dialer, StreamSocket},
    error::{DialError, DriverError},
    station::StationDriver,
    types::{Credentials, InterfaceHandle, StationEvent, StationEvents},
};

pub(crate) type TestMutex = CriticalSectionRawMutex;

pub(crate) const TEST_IFACE: &str = "netcycle_sta";
pub(crate) const LINK_LOCAL: Ipv6Addr = Ipv6Addr::new(0xfe80, 0, 0, 0, 0x1e69, 0x7aff, 0xfe01, 0x2233);
pub(crate) const GLOBAL_V6: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x42);
pub(crate) const LEASE_V4: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);
pub(crate) const SUFFIX: &[u8] = br#"{"status":"disabled"}"#;

pub(crate) fn got_ipv4(interface: &'static str) -> StationEvent {
    StationEvent::GotIpv4 {
        interface,
        address: LEASE_V4,
    }
}

pub(crate) fn got_ipv6(interface: &'static str, address: Ipv6Addr) -> StationEvent {
    StationEvent::GotIpv6 { interface, address }
}

pub(crate) const fn test_credentials() -> Credentials<'static> {
    Credentials {
        ssid: "lab-net",
        password: "hunter22",
    }
}

/// Scripted radio. Each `associate` call queues the next batch of events,
/// mimicking a driver that reports association progress asynchronously.
pub(crate) struct FakeStation<'e> {
    events: &'e StationEvents<TestMutex>,
    on_associate: RefCell<VecDeque<Vec<StationEvent>>>,
    on_link_local: RefCell<Vec<StationEvent>>,
    calls: RefCell<Vec<&'static str>>,
    initialized: Cell<bool>,
    interfaces: Cell<usize>,
    pub(crate) prepare_error: Cell<Option<DriverError>>,
    pub(crate) init_error: Cell<Option<DriverError>>,
    pub(crate) associate_error: Cell<Option<DriverError>>,
    pub(crate) reassociate_error: Cell<Option<DriverError>>,
    pub(crate) stop_error: Cell<Option<DriverError>>,
    pub(crate) deinit_error: Cell<Option<DriverError>>,
}

impl<'e> FakeStation<'e> {
    pub(crate) fn new(events: &'e StationEvents<TestMutex>) -> Self {
        Self {
            events,
            on_associate: RefCell::new(VecDeque::new()),
            on_link_local: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            initialized: Cell::new(false),
            interfaces: Cell::new(0),
            prepare_error: Cell::new(None),
            init_error: Cell::new(None),
            associate_error: Cell::new(None),
            reassociate_error: Cell::new(None),
            stop_error: Cell::new(None),
            deinit_error: Cell::new(None),
        }
    }

    /// Associates first time, leases IPv4 and gets a link-local address once
    /// the station reports connected.
    pub(crate) fn associating(events: &'e StationEvents<TestMutex>) -> Self {
        let station = Self::new(events);
        station.script_associate(&[StationEvent::Connected, got_ipv4(TEST_IFACE)]);
        station.script_link_local(&[got_ipv6(TEST_IFACE, LINK_LOCAL)]);
        station
    }

    pub(crate) fn script_associate(&self, batch: &[StationEvent]) {
        self.on_associate.borrow_mut().push_back(batch.to_vec());
    }

    pub(crate) fn script_link_local(&self, batch: &[StationEvent]) {
        *self.on_link_local.borrow_mut() = batch.to_vec();
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    pub(crate) fn live_interfaces(&self) -> usize {
        self.interfaces.get()
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    fn emit(&self, batch: Vec<StationEvent>) {
        for event in batch {
            self.events
                .try_send(event)
                .expect("station event queue overflow in test");
        }
    }
}

impl StationDriver for FakeStation<'_> {
    async fn prepare(&self) -> Result<(), DriverError> {
        self.record("prepare");
        self.prepare_error.get().map_or(Ok(()), Err)
    }

    async fn init(&self) -> Result<(), DriverError> {
        self.record("init");
        if let Some(err) = self.init_error.get() {
            return Err(err);
        }
        self.initialized.set(true);
        Ok(())
    }

    fn create_interface(
        &self,
        descriptor: &'static str,
        route_priority: u8,
    ) -> Result<InterfaceHandle, DriverError> {
        self.record("create_interface");
        self.interfaces.set(self.interfaces.get() + 1);
        Ok(InterfaceHandle::new(descriptor, route_priority))
    }

    async fn configure(&self, _credentials: &Credentials<'_>) -> Result<(), DriverError> {
        self.record("configure");
        Ok(())
    }

    async fn start(&self) -> Result<(), DriverError> {
        self.record("start");
        Ok(())
    }

    async fn associate(&self) -> Result<(), DriverError> {
        let first = self.count("associate") == 0;
        self.record("associate");
        let scripted_error = if first {
            self.associate_error.get()
        } else {
            self.reassociate_error.get()
        };
        if let Some(err) = scripted_error {
            return Err(err);
        }
        if let Some(batch) = self.on_associate.borrow_mut().pop_front() {
            self.emit(batch);
        }
        Ok(())
    }

    async fn create_ipv6_link_local(&self, _iface: &InterfaceHandle) -> Result<(), DriverError> {
        self.record("create_ipv6_link_local");
        let batch = core::mem::take(&mut *self.on_link_local.borrow_mut());
        self.emit(batch);
        Ok(())
    }

    async fn disassociate(&self) -> Result<(), DriverError> {
        self.record("disassociate");
        Ok(())
    }

    async fn stop(&self) -> Result<(), DriverError> {
        self.record("stop");
        if let Some(err) = self.stop_error.get() {
            return Err(err);
        }
        if !self.initialized.get() {
            return Err(DriverError::NotInitialized);
        }
        Ok(())
    }

    async fn deinit(&self) -> Result<(), DriverError> {
        self.record("deinit");
        if let Some(err) = self.deinit_error.get() {
            return Err(err);
        }
        self.initialized.set(false);
        Ok(())
    }

    fn destroy_interface(&self, _iface: InterfaceHandle) {
        self.record("destroy_interface");
        self.interfaces.set(self.interfaces.get() - 1);
    }
}

#[derive(Clone, Debug)]
pub(crate) enum ReadStep {
    Data(Vec<u8>),
    Fail,
    Stall,
}

/// Scripted peer for the endpoint client.
pub(crate) struct FakeDialer {
    pub(crate) resolved: Result<IpAddr, DialError>,
    pub(crate) connect_error: Option<DialError>,
    pub(crate) write_limit: Option<usize>,
    pub(crate) write_fails: bool,
    pub(crate) reads: VecDeque<ReadStep>,
    pub(crate) sent: Vec<u8>,
    pub(crate) remote: Option<SocketAddr>,
    pub(crate) closed: usize,
}

impl FakeDialer {
    pub(crate) fn replying(chunks: &[&[u8]]) -> Self {
        Self {
            resolved: Ok(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2))),
            connect_error: None,
            write_limit: None,
            write_fails: false,
            reads: chunks.iter().map(|c| ReadStep::Data(c.to_vec())).collect(),
            sent: Vec::new(),
            remote: None,
            closed: 0,
        }
    }
}

pub(crate) struct FakeSocket<'d> {
    dialer: &'d mut FakeDialer,
}

impl Dialer for FakeDialer {
    type Socket<'s> = FakeSocket<'s>;

    async fn resolve(&mut self, _host: &str) -> Result<IpAddr, DialError> {
        self.resolved
    }

    async fn connect(&mut self, remote: SocketAddr) -> Result<FakeSocket<'_>, DialError> {
        if let Some(err) = self.connect_error {
            return Err(err);
        }
        self.remote = Some(remote);
        Ok(FakeSocket { dialer: self })
    }
}

impl ErrorType for FakeSocket<'_> {
    type Error = ErrorKind;
}

impl Read for FakeSocket<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        match self.dialer.reads.pop_front() {
            None => Ok(0),
            Some(ReadStep::Fail) => Err(ErrorKind::TimedOut),
            Some(ReadStep::Stall) => core::future::pending().await,
            Some(ReadStep::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    let rest = data.split_off(n);
                    self.dialer.reads.push_front(ReadStep::Data(rest));
                }
                Ok(n)
            }
        }
    }
}

impl Write for FakeSocket<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        if self.dialer.write_fails {
            return Err(ErrorKind::BrokenPipe);
        }
        let n = self.dialer.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        self.dialer.sent.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    async fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

impl StreamSocket for FakeSocket<'_> {
    async fn close(&mut self) {
        self.dialer.closed += 1;
    }
}
