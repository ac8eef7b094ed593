use display_interface_spi::SPIInterface;
use embassy_embedded_hal::shared_bus::blocking::spi::SpiDevice;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::saadc;
use embassy_nrf::spim::Spim;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Duration, Timer};
use mipidsi::models::ST7789;

pub type Display<'a> = mipidsi::Display<
    SPIInterface<SpiDevice<'a, NoopRawMutex, Spim<'a, TWISPI0>, Output<'a>>, Output<'a>>,
    ST7789,
    Output<'a>,
>;

pub struct Button {
    pin: Input<'static>,
}

impl Button {
    pub fn new(pin: Input<'static>) -> Self {
        Self { pin }
    }

    /// Completes on a button press. Holding the button for 8 seconds resets
    /// the watch.
    pub async fn wait(&mut self) {
        self.pin.wait_for_any_edge().await;
        if self.pin.is_high() {
            match select(Timer::after(Duration::from_secs(8)), self.pin.wait_for_falling_edge()).await {
                Either::First(_) => {
                    if self.pin.is_high() {
                        cortex_m::peripheral::SCB::sys_reset();
                    }
                }
                Either::Second(_) => {}
            }
        }
    }
}

pub struct Battery<'a> {
    charging: Input<'a>,
    adc: saadc::Saadc<'a, 1>,
}

impl<'a> Battery<'a> {
    pub fn new(adc: saadc::Saadc<'a, 1>, charging: Input<'a>) -> Self {
        Self { adc, charging }
    }

    /// Sample the battery voltage and map it to a percentage.
    pub async fn measure(&mut self) -> u8 {
        let mut buf = [0i16; 1];
        self.adc.sample(&mut buf).await;
        let voltage = buf[0] as u32 * (8 * 600) / 1024;
        approximate_charge(voltage) as u8
    }

    pub fn is_charging(&mut self) -> bool {
        self.charging.is_low()
    }
}

// Measured discharge curve, (millivolts, percent).
const CHARGE_CURVE: [(u32, u32); 6] = [(3500, 0), (3616, 3), (3723, 22), (3776, 48), (3979, 79), (4180, 100)];

fn approximate_charge(voltage_millis: u32) -> u32 {
    let mut prev = CHARGE_CURVE[0];
    if voltage_millis < prev.0 {
        return prev.1;
    }
    for point in CHARGE_CURVE.into_iter().skip(1) {
        if voltage_millis < point.0 {
            return prev.1 + (voltage_millis - prev.0) * (point.1 - prev.1) / (point.0 - prev.0);
        }
        prev = point;
    }
    prev.1
}

/// Vibration motor, driven active low.
pub struct Vibrator {
    motor: Output<'static>,
}

impl Vibrator {
    pub fn new(motor: Output<'static>) -> Self {
        Self { motor }
    }

    /// Two short buzzes, used when the phone link drops.
    pub async fn double_pulse(&mut self) {
        for _ in 0..2 {
            self.motor.set_low();
            Timer::after(Duration::from_millis(150)).await;
            self.motor.set_high();
            Timer::after(Duration::from_millis(150)).await;
        }
    }
}

pub enum BacklightLevel {
    Low,
    Medium,
    High,
}

pub struct Backlight<'a> {
    low: Output<'a>,
    med: Output<'a>,
    high: Output<'a>,
    level: BacklightLevel,
}

impl<'a> Backlight<'a> {
    pub fn new(low_pin: AnyPin, med_pin: AnyPin, high_pin: AnyPin) -> Self {
        let backlight_low = Output::new(low_pin, Level::High, OutputDrive::Standard);
        let backlight_med = Output::new(med_pin, Level::High, OutputDrive::Standard);
        let backlight_high = Output::new(high_pin, Level::High, OutputDrive::Standard);
        Self {
            low: backlight_low,
            med: backlight_med,
            high: backlight_high,
            level: BacklightLevel::Medium,
        }
    }

    fn set_level(&mut self, level: BacklightLevel) {
        self.level = level;
        self.on();
    }

    fn on(&mut self) {
        match self.level {
            BacklightLevel::Low => self.set_low(),
            BacklightLevel::Medium => self.set_medium(),
            BacklightLevel::High => self.set_high(),
        }
    }

    fn set_low(&mut self) {
        self.low.set_low();
        self.med.set_high();
        self.high.set_high();
    }

    fn set_medium(&mut self) {
        self.low.set_high();
        self.med.set_low();
        self.high.set_high();
    }

    fn set_high(&mut self) {
        self.low.set_high();
        self.med.set_high();
        self.high.set_low();
    }
}

pub struct Screen<'a> {
    display: Display<'a>,
    backlight: Backlight<'a>,
}

impl<'a> Screen<'a> {
    pub fn new(display: Display<'a>, backlight: Backlight<'a>) -> Self {
        Self { display, backlight }
    }

    pub fn display(&mut self) -> &mut Display<'a> {
        &mut self.display
    }

    pub fn on(&mut self) {
        self.backlight.on();
    }

    pub fn change_brightness(&mut self) {
        match self.backlight.level {
            BacklightLevel::Low => self.backlight.set_level(BacklightLevel::Medium),
            BacklightLevel::Medium => self.backlight.set_level(BacklightLevel::High),
            BacklightLevel::High => self.backlight.set_level(BacklightLevel::Low),
        }
    }
}
