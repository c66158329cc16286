use esp_hal::{
    gpio::RtcPin,
    peripherals::GPIO4,
    rtc_cntl::{
        sleep::{Ext1WakeupSource, WakeupLevel},
        wakeup_cause, Rtc, SleepSource,
    },
};
use esp_println::println;

pub(crate) fn woke_from_button() -> bool {
    let cause = wakeup_cause();
    println!("sleep: wakeup_cause={:?}", cause);
    cause == SleepSource::Ext1
}

/// EXT1 wake source on the button pin, armed right before deep sleep.
pub(crate) struct WakeSource {
    rtc: Rtc<'static>,
    button: GPIO4<'static>,
}

impl WakeSource {
    pub(crate) fn new(rtc: Rtc<'static>, button: GPIO4<'static>) -> Self {
        Self { rtc, button }
    }

    pub(crate) fn sleep(mut self) -> ! {
        println!("sleep: enabling EXT1 wakeup on GPIO4 (all low)");
        let mut pins: [&mut dyn RtcPin; 1] = [&mut self.button];
        let ext1 = Ext1WakeupSource::new(&mut pins, WakeupLevel::Low);
        println!("sleep: entering deep sleep");
        self.rtc.sleep_deep(&[&ext1])
    }
}
