use embassy_net::Stack;
use embassy_time::Timer;
use esp_println::println;
use netcycle::{
    run_wake_cycle, ConnectionManager, CycleError, DriverError, EndpointClient, StationConfig,
    SuffixMatch,
};
use static_cell::StaticCell;

use super::{
    config::{
        wifi_credentials, API_REQUEST, API_TOKEN_CONFIGURED, EXPECTED_SUFFIX, FAILURE_HOLD,
        READY_SIGNALS, READY_TIMEOUT, SOCKET_RX_BUF, SOCKET_TX_BUF, STATION_EVENTS, STATION_IFACE,
        STATION_ROUTE_PRIORITY, SUCCESS_HOLD, WAKE_GUARD,
    },
    dialer::EmbassyDialer,
    indicator::Indicator,
    radio::EspStation,
    sleep::WakeSource,
};

pub(crate) struct NetworkLink {
    pub(crate) station: &'static EspStation,
    pub(crate) stack: Stack<'static>,
}

/// What this wake does before going back to sleep.
pub(crate) enum WakeAction {
    /// Woken by something other than the button (cold boot, reset).
    Skip,
    /// Button wake, but the radio could not be brought up.
    Fail(&'static str),
    Run(NetworkLink),
}

#[embassy_executor::task]
pub(crate) async fn duty_cycle_task(
    mut indicator: Indicator,
    action: WakeAction,
    wake: WakeSource,
) {
    indicator.red_on();
    indicator.green_on();

    let outcome = match action {
        WakeAction::Run(link) => Some(pause_blocking(link).await),
        WakeAction::Fail(reason) => Some(Err(CycleError::Platform(DriverError::Rejected(reason)))),
        WakeAction::Skip => {
            println!("duty_cycle: wake not caused by button, skipping");
            None
        }
    };
    match outcome {
        Some(Ok(())) => {
            println!("duty_cycle: blocking paused");
            indicator.red_off();
            println!("duty_cycle: holding {}s", SUCCESS_HOLD.as_secs());
            Timer::after(SUCCESS_HOLD).await;
        }
        Some(Err(err)) => {
            println!("duty_cycle: failed to pause blocking ({})", err);
            indicator.green_off();
            println!("duty_cycle: holding {}s", FAILURE_HOLD.as_secs());
            Timer::after(FAILURE_HOLD).await;
        }
        None => {}
    }

    Timer::after(WAKE_GUARD).await;
    indicator.green_off();
    indicator.red_off();
    wake.sleep()
}

async fn pause_blocking(link: NetworkLink) -> Result<(), CycleError> {
    static RX_BUFFER: StaticCell<[u8; SOCKET_RX_BUF]> = StaticCell::new();
    static TX_BUFFER: StaticCell<[u8; SOCKET_TX_BUF]> = StaticCell::new();

    let Some(credentials) = wifi_credentials() else {
        return Err(CycleError::Platform(DriverError::Rejected(
            "BLOCKPAUSE_WIFI_SSID not set at build time",
        )));
    };
    if !API_TOKEN_CONFIGURED {
        return Err(CycleError::Platform(DriverError::Rejected(
            "BLOCKPAUSE_API_TOKEN not set at build time",
        )));
    }

    let config = StationConfig::new(credentials, STATION_IFACE)
        .with_route_priority(STATION_ROUTE_PRIORITY)
        .with_ready_timeout(READY_TIMEOUT);
    let station = ConnectionManager::new(link.station, &READY_SIGNALS, config);

    let dialer = EmbassyDialer::new(
        link.stack,
        RX_BUFFER.init([0; SOCKET_RX_BUF]),
        TX_BUFFER.init([0; SOCKET_TX_BUF]),
    );
    let mut endpoint: EndpointClient<'_, EmbassyDialer, SuffixMatch<'_>> =
        EndpointClient::new(dialer, API_REQUEST, SuffixMatch::new(EXPECTED_SUFFIX));

    run_wake_cycle(&station, &mut endpoint, STATION_EVENTS.receiver()).await
}
