pub(crate) mod config;
mod dialer;
mod duty_cycle;
mod indicator;
mod radio;
mod sleep;

use esp_hal::{
    gpio::{Level, Output, OutputConfig},
    rtc_cntl::Rtc,
    timer::timg::TimerGroup,
};
use esp_println::println;

use self::{
    config::{HEAP_BYTES, LOG_LEVEL},
    duty_cycle::{duty_cycle_task, NetworkLink, WakeAction},
    indicator::Indicator,
    radio::{address_watch_task, net_task},
    sleep::WakeSource,
};

pub(crate) fn run() -> ! {
    esp_println::logger::init_logger(LOG_LEVEL);
    println!("main: wakeup");

    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_alloc::heap_allocator!(size: HEAP_BYTES);
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let indicator = Indicator::new(
        Output::new(peripherals.GPIO22, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO23, Level::Low, OutputConfig::default()),
    );
    let wake = WakeSource::new(Rtc::new(peripherals.LPWR), peripherals.GPIO4);

    let radio = if sleep::woke_from_button() {
        Some(radio::setup(peripherals.WIFI))
    } else {
        None
    };

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        let action = match radio {
            Some(Ok(radio)) => {
                spawner.must_spawn(net_task(radio.net_runner));
                spawner.must_spawn(address_watch_task(radio.stack));
                WakeAction::Run(NetworkLink {
                    station: radio.station,
                    stack: radio.stack,
                })
            }
            Some(Err(reason)) => WakeAction::Fail(reason),
            None => WakeAction::Skip,
        };
        spawner.must_spawn(duty_cycle_task(indicator, action, wake));
    });
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}
