use esp_hal::gpio::Output;
use esp_println::println;

/// Green and red status LEDs.
pub(crate) struct Indicator {
    green: Output<'static>,
    red: Output<'static>,
}

impl Indicator {
    pub(crate) fn new(green: Output<'static>, red: Output<'static>) -> Self {
        println!("led: configured green/red outputs");
        Self { green, red }
    }

    pub(crate) fn green_on(&mut self) {
        println!("led: green on");
        self.green.set_high();
    }

    pub(crate) fn green_off(&mut self) {
        println!("led: green off");
        self.green.set_low();
    }

    pub(crate) fn red_on(&mut self) {
        println!("led: red on");
        self.red.set_high();
    }

    pub(crate) fn red_off(&mut self) {
        println!("led: red off");
        self.red.set_low();
    }
}
