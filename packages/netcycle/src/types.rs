use core::net::{Ipv4Addr, Ipv6Addr};

use embassy_sync::channel::Channel;

pub const MAX_ASSOCIATION_RETRIES: u8 = 6;
pub const STATION_EVENT_QUEUE: usize = 8;

/// Queue the platform feeds with driver notifications.
pub type StationEvents<M> = Channel<M, StationEvent, STATION_EVENT_QUEUE>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingAddresses,
    Ready,
    Failed,
}

impl ConnectionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingAddresses => "awaiting_addresses",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Identity of the station network interface.
///
/// Address events are multiplexed across every interface the platform has,
/// so events are attributed by descriptor prefix rather than by equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceHandle {
    descriptor: &'static str,
    route_priority: u8,
}

impl InterfaceHandle {
    pub const fn new(descriptor: &'static str, route_priority: u8) -> Self {
        Self {
            descriptor,
            route_priority,
        }
    }

    pub const fn descriptor(&self) -> &'static str {
        self.descriptor
    }

    pub const fn route_priority(&self) -> u8 {
        self.route_priority
    }

    pub fn owns(&self, event_descriptor: &str) -> bool {
        event_descriptor.starts_with(self.descriptor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StationEvent {
    Connected,
    Disconnected {
        reason: u8,
    },
    GotIpv4 {
        interface: &'static str,
        address: Ipv4Addr,
    },
    GotIpv6 {
        interface: &'static str,
        address: Ipv6Addr,
    },
}

impl StationEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "sta_connected",
            Self::Disconnected { .. } => "sta_disconnected",
            Self::GotIpv4 { .. } => "got_ipv4",
            Self::GotIpv6 { .. } => "got_ipv6",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ipv6Scope {
    Unknown,
    Global,
    LinkLocal,
    SiteLocal,
    UniqueLocal,
    Ipv4Mapped,
}

impl Ipv6Scope {
    /// Checked in this order: 2000::/3, fe80::/10, fec0::/10, fc00::/7,
    /// ::ffff:0:0/96.
    pub fn classify(address: Ipv6Addr) -> Self {
        let segments = address.segments();
        let head = segments[0];
        if head & 0xe000 == 0x2000 {
            Self::Global
        } else if head & 0xffc0 == 0xfe80 {
            Self::LinkLocal
        } else if head & 0xffc0 == 0xfec0 {
            Self::SiteLocal
        } else if head & 0xfe00 == 0xfc00 {
            Self::UniqueLocal
        } else if segments[..5] == [0; 5] && segments[5] == 0xffff {
            Self::Ipv4Mapped
        } else {
            Self::Unknown
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Global => "global",
            Self::LinkLocal => "link_local",
            Self::SiteLocal => "site_local",
            Self::UniqueLocal => "unique_local",
            Self::Ipv4Mapped => "ipv4_mapped",
        }
    }
}
