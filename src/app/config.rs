use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use netcycle::{Credentials, RequestDescriptor, SignalPool, StationEvents};

mod secrets {
    include!(concat!(env!("OUT_DIR"), "/secrets.rs"));
}

pub(crate) use secrets::API_TOKEN_CONFIGURED;

pub(crate) const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
pub(crate) const HEAP_BYTES: usize = 72 * 1024;

pub(crate) const SUCCESS_HOLD: Duration = Duration::from_secs(59);
pub(crate) const FAILURE_HOLD: Duration = Duration::from_secs(9);
/// Keeps a held-down button from producing back-to-back wakes.
pub(crate) const WAKE_GUARD: Duration = Duration::from_secs(1);

pub(crate) const STATION_IFACE: &str = "blockpause_sta";
pub(crate) const STATION_ROUTE_PRIORITY: u8 = 128;
pub(crate) const READY_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const ADDRESS_POLL: Duration = Duration::from_millis(250);
pub(crate) const WIFI_RX_QUEUE_SIZE: usize = 3;
pub(crate) const WIFI_TX_QUEUE_SIZE: usize = 2;
pub(crate) const WIFI_STATIC_RX_BUF_NUM: u8 = 4;
pub(crate) const WIFI_DYNAMIC_RX_BUF_NUM: u16 = 8;
pub(crate) const WIFI_DYNAMIC_TX_BUF_NUM: u16 = 8;
pub(crate) const WIFI_RX_BA_WIN: u8 = 3;

pub(crate) const SOCKET_RX_BUF: usize = 1536;
pub(crate) const SOCKET_TX_BUF: usize = 512;
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_millis(250);
pub(crate) const EXPECTED_SUFFIX: &[u8] = br#"{"status":"disabled"}"#;

pub(crate) const API_REQUEST: RequestDescriptor<'static> = RequestDescriptor {
    host: secrets::API_HOST,
    port: secrets::API_PORT,
    path: secrets::API_PATH,
    request: secrets::API_REQUEST.as_bytes(),
};

pub(crate) fn wifi_credentials() -> Option<Credentials<'static>> {
    Some(Credentials {
        ssid: secrets::WIFI_SSID?,
        password: secrets::WIFI_PASSWORD,
    })
}

pub(crate) static STATION_EVENTS: StationEvents<CriticalSectionRawMutex> = StationEvents::new();
pub(crate) static READY_SIGNALS: SignalPool<CriticalSectionRawMutex> = SignalPool::new();
