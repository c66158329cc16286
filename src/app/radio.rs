use core::{
    net::{Ipv4Addr, Ipv6Addr},
    sync::atomic::{AtomicBool, Ordering},
};

use embassy_net::{ConfigV6, Ipv6Cidr, Runner, Stack, StackResources, StaticConfigV6};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use embassy_time::Timer;
use esp_hal::rng::Rng;
use esp_println::println;
use esp_radio::wifi::{
    event::{self, EventExt},
    ClientConfig, Config as WifiRuntimeConfig, ModeConfig, WifiController, WifiDevice,
};
use netcycle::{Credentials, DriverError, InterfaceHandle, StationDriver, StationEvent};
use static_cell::StaticCell;

use super::config::{
    ADDRESS_POLL, STATION_EVENTS, STATION_IFACE, WIFI_DYNAMIC_RX_BUF_NUM, WIFI_DYNAMIC_TX_BUF_NUM,
    WIFI_RX_BA_WIN, WIFI_RX_QUEUE_SIZE, WIFI_STATIC_RX_BUF_NUM, WIFI_TX_QUEUE_SIZE,
};

static WIFI_EVENT_HANDLERS_INSTALLED: AtomicBool = AtomicBool::new(false);

pub(crate) struct RadioRuntime {
    pub(crate) station: &'static EspStation,
    pub(crate) net_runner: Runner<'static, WifiDevice<'static>>,
    pub(crate) stack: Stack<'static>,
}

pub(crate) fn setup(
    wifi: esp_hal::peripherals::WIFI<'static>,
) -> Result<RadioRuntime, &'static str> {
    static RADIO_CTRL: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
    static STATION: StaticCell<EspStation> = StaticCell::new();

    let radio_ctrl = esp_radio::init().map_err(|_| "radio: esp_radio::init failed")?;
    let radio_ctrl = RADIO_CTRL.init(radio_ctrl);
    let (controller, ifaces) = esp_radio::wifi::new(radio_ctrl, wifi, wifi_runtime_config())
        .map_err(|_| "radio: wifi init failed")?;
    let mac = ifaces.sta.mac_address();

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let (stack, net_runner) = embassy_net::new(
        ifaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::<3>::new()),
        seed,
    );

    let station = STATION.init(EspStation {
        controller: Mutex::new(controller),
        stack,
        mac,
        initialized: AtomicBool::new(false),
        started: AtomicBool::new(false),
    });

    Ok(RadioRuntime {
        station,
        net_runner,
        stack,
    })
}

/// `esp-radio` station bound to the embassy-net stack it feeds.
pub(crate) struct EspStation {
    controller: Mutex<CriticalSectionRawMutex, WifiController<'static>>,
    stack: Stack<'static>,
    mac: [u8; 6],
    initialized: AtomicBool,
    started: AtomicBool,
}

impl StationDriver for EspStation {
    async fn prepare(&self) -> Result<(), DriverError> {
        install_wifi_event_handlers();
        Ok(())
    }

    async fn init(&self) -> Result<(), DriverError> {
        self.initialized.store(true, Ordering::Release);
        println!("radio: station mode, mac={:02x?}", self.mac);
        Ok(())
    }

    fn create_interface(
        &self,
        descriptor: &'static str,
        route_priority: u8,
    ) -> Result<InterfaceHandle, DriverError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(DriverError::NotInitialized);
        }
        let handle = InterfaceHandle::new(descriptor, route_priority);
        println!(
            "radio: interface \"{}\" route priority {}",
            handle.descriptor(),
            handle.route_priority()
        );
        Ok(handle)
    }

    async fn configure(&self, credentials: &Credentials<'_>) -> Result<(), DriverError> {
        let mode = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(credentials.ssid.into())
                .with_password(credentials.password.into()),
        );
        let mut controller = self.controller.lock().await;
        controller.set_config(&mode).map_err(|err| {
            println!("radio: wifi station config err={:?}", err);
            DriverError::Rejected("wifi station config rejected")
        })
    }

    async fn start(&self) -> Result<(), DriverError> {
        let mut controller = self.controller.lock().await;
        if matches!(controller.is_started(), Ok(true)) {
            self.started.store(true, Ordering::Release);
            return Ok(());
        }
        controller.start_async().await.map_err(|err| {
            println!("radio: wifi start err={:?}", err);
            DriverError::Rejected("wifi start failed")
        })?;
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    async fn associate(&self) -> Result<(), DriverError> {
        if !self.started.load(Ordering::Acquire) {
            return Err(DriverError::NotStarted);
        }
        // Outcome arrives as StaConnected/StaDisconnected events.
        self.controller.lock().await.connect().map_err(|err| {
            println!("radio: wifi connect err={:?}", err);
            DriverError::Rejected("wifi connect request failed")
        })
    }

    async fn create_ipv6_link_local(&self, iface: &InterfaceHandle) -> Result<(), DriverError> {
        let address = link_local_from_mac(self.mac);
        self.stack.set_config_v6(ConfigV6::Static(StaticConfigV6 {
            address: Ipv6Cidr::new(address, 64),
            gateway: None,
            dns_servers: Default::default(),
        }));
        emit(StationEvent::GotIpv6 {
            interface: iface.descriptor(),
            address,
        });
        Ok(())
    }

    async fn disassociate(&self) -> Result<(), DriverError> {
        if !self.started.load(Ordering::Acquire) {
            return Err(DriverError::NotStarted);
        }
        self.controller
            .lock()
            .await
            .disconnect_async()
            .await
            .map_err(|_| DriverError::Unavailable)
    }

    async fn stop(&self) -> Result<(), DriverError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(DriverError::NotInitialized);
        }
        if self.started.swap(false, Ordering::AcqRel) {
            self.controller.lock().await.stop_async().await.map_err(|err| {
                println!("radio: wifi stop err={:?}", err);
                DriverError::Rejected("wifi stop failed")
            })?;
        }
        Ok(())
    }

    async fn deinit(&self) -> Result<(), DriverError> {
        self.stack.set_config_v6(ConfigV6::None);
        self.initialized.store(false, Ordering::Release);
        Ok(())
    }

    fn destroy_interface(&self, iface: InterfaceHandle) {
        println!("radio: released interface \"{}\"", iface.descriptor());
    }
}

#[embassy_executor::task]
pub(crate) async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

/// Reports each new DHCPv4 lease as a got-IPv4 event for the station interface.
#[embassy_executor::task]
pub(crate) async fn address_watch_task(stack: Stack<'static>) {
    let mut reported: Option<Ipv4Addr> = None;
    loop {
        let current = stack.config_v4().map(|cfg| cfg.address.address());
        if current != reported {
            if let Some(address) = current {
                emit(StationEvent::GotIpv4 {
                    interface: STATION_IFACE,
                    address,
                });
            }
            reported = current;
        }
        Timer::after(ADDRESS_POLL).await;
    }
}

fn install_wifi_event_handlers() {
    if WIFI_EVENT_HANDLERS_INSTALLED.swap(true, Ordering::Relaxed) {
        return;
    }

    event::StaConnected::update_handler(|event| {
        println!(
            "radio: event sta_connected channel={} authmode={}",
            event.channel(),
            event.authmode()
        );
        emit(StationEvent::Connected);
    });

    event::StaDisconnected::update_handler(|event| {
        let reason = event.reason();
        println!(
            "radio: event sta_disconnected reason={} ({})",
            reason,
            disconnect_reason_label(reason)
        );
        emit(StationEvent::Disconnected { reason });
    });
}

fn emit(event: StationEvent) {
    if STATION_EVENTS.try_send(event).is_err() {
        println!("radio: station event queue full, dropped {}", event.as_str());
    }
}

fn disconnect_reason_label(reason: u8) -> &'static str {
    match reason {
        200 => "beacon_timeout",
        201 => "no_ap_found",
        202 => "auth_fail",
        203 => "assoc_fail",
        204 => "handshake_timeout",
        205 => "connection_fail",
        _ => "other",
    }
}

/// EUI-64 link-local address derived from the station MAC.
fn link_local_from_mac(mac: [u8; 6]) -> Ipv6Addr {
    Ipv6Addr::new(
        0xfe80,
        0,
        0,
        0,
        u16::from_be_bytes([mac[0] ^ 0x02, mac[1]]),
        u16::from_be_bytes([mac[2], 0xff]),
        u16::from_be_bytes([0xfe, mac[3]]),
        u16::from_be_bytes([mac[4], mac[5]]),
    )
}

fn wifi_runtime_config() -> WifiRuntimeConfig {
    WifiRuntimeConfig::default()
        .with_rx_queue_size(WIFI_RX_QUEUE_SIZE)
        .with_tx_queue_size(WIFI_TX_QUEUE_SIZE)
        .with_static_rx_buf_num(WIFI_STATIC_RX_BUF_NUM)
        .with_dynamic_rx_buf_num(WIFI_DYNAMIC_RX_BUF_NUM)
        .with_dynamic_tx_buf_num(WIFI_DYNAMIC_TX_BUF_NUM)
        .with_ampdu_rx_enable(false)
        .with_ampdu_tx_enable(false)
        .with_rx_ba_win(WIFI_RX_BA_WIN)
}
