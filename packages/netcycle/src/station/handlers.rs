use core::net::{Ipv4Addr, Ipv6Addr};

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{debug, error, info, trace, warn};

use super::{ConnectionManager, StationDriver};
use crate::{
    error::DriverError,
    types::{ConnectionState, Ipv6Scope, StationEvent},
};

impl<M: RawMutex, D: StationDriver> ConnectionManager<'_, M, D> {
    /// Events arriving while no observers are registered are dropped.
    pub async fn handle_event(&self, event: StationEvent) {
        if !self.with_session(|session| session.observing) {
            trace!("dropping {} event, no observers", event.as_str());
            return;
        }

        match event {
            StationEvent::Connected => self.on_connected().await,
            StationEvent::Disconnected { reason } => self.on_disconnected(reason).await,
            StationEvent::GotIpv4 { interface, address } => self.on_got_ipv4(interface, address),
            StationEvent::GotIpv6 { interface, address } => self.on_got_ipv6(interface, address),
        }
    }

    async fn on_connected(&self) {
        let Some(iface) = self.with_session(|session| session.iface) else {
            return;
        };
        if let Err(err) = self.driver.create_ipv6_link_local(&iface).await {
            warn!("ipv6 link-local setup failed: {}", err);
        }
    }

    async fn on_disconnected(&self, reason: u8) {
        let limit = self.config.max_retries;
        let attempts = self.with_session(|session| {
            if session.state == ConnectionState::Failed {
                return None;
            }
            session.retries = session.retries.saturating_add(1);
            if session.retries > limit {
                session.exhausted = Some(session.retries);
                session.state = ConnectionState::Failed;
                session.release_waiters();
            }
            Some(session.retries)
        });
        let Some(attempts) = attempts else {
            debug!("station already failed, not reconnecting");
            return;
        };
        if attempts > limit {
            error!("wifi connect failed {} times, stop reconnect", attempts);
            return;
        }

        warn!("wifi disconnected (reason {}), trying to reconnect...", reason);
        match self.driver.associate().await {
            Ok(()) | Err(DriverError::NotStarted) => {}
            Err(err) => {
                error!("reconnect request failed: {}", err);
                self.with_session(|session| {
                    session.reassociation_error = Some(err);
                    session.state = ConnectionState::Failed;
                    session.release_waiters();
                });
            }
        }
    }

    fn on_got_ipv4(&self, interface: &str, address: Ipv4Addr) {
        let disposition = self.with_session(|session| {
            if !session.iface.is_some_and(|iface| iface.owns(interface)) {
                return Ipv4Disposition::Foreign;
            }
            if session.state == ConnectionState::Failed {
                return Ipv4Disposition::Late;
            }
            session.retries = 0;
            if let Some(lease) = &session.ipv4_ready {
                lease.signal().fire();
            }
            Ipv4Disposition::Accepted
        });
        match disposition {
            Ipv4Disposition::Accepted => info!(
                "got ipv4 event: interface \"{}\" address: {}",
                interface, address
            ),
            Ipv4Disposition::Late => {
                warn!("ipv4 {} arrived after the station failed", address)
            }
            Ipv4Disposition::Foreign => debug!("ignoring ipv4 event for \"{}\"", interface),
        }
    }

    fn on_got_ipv6(&self, interface: &str, address: Ipv6Addr) {
        let scope = Ipv6Scope::classify(address);
        let ours = self.with_session(|session| {
            if !session.iface.is_some_and(|iface| iface.owns(interface)) {
                return false;
            }
            if scope == Ipv6Scope::LinkLocal {
                if let Some(lease) = &session.ipv6_ready {
                    lease.signal().fire();
                }
            }
            true
        });
        if ours {
            info!(
                "got ipv6 event: interface \"{}\" address: {}, type: {}",
                interface,
                address,
                scope.as_str()
            );
        } else {
            debug!("ignoring ipv6 event for \"{}\"", interface);
        }
    }
}

enum Ipv4Disposition {
    Accepted,
    Late,
    Foreign,
}
