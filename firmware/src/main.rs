#![cfg_attr(not(test), no_std)]
#![feature(impl_trait_in_assoc_type)]
#![no_main]

use core::cell::RefCell;

use defmt::{info, unwrap};
use defmt_rtt as _;
use display_interface_spi::SPIInterface;
use embassy_embedded_hal::shared_bus::blocking::spi::SpiDevice;
use embassy_executor::Spawner;
use embassy_futures::select::{select3, Either3};
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pin, Pull};
use embassy_nrf::interrupt::Priority;
use embassy_nrf::peripherals::{RNG, TWISPI0};
use embassy_nrf::spim::Spim;
use embassy_nrf::spis::MODE_3;
use embassy_nrf::{bind_interrupts, peripherals, rng, saadc, spim};
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::blocking_mutex::Mutex as BMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration, Timer};
use healthful_ui::{format, Watchface};
use mipidsi::options::Orientation;
use nrf_sdc::{self as sdc, mpsl};
#[cfg(feature = "panic-probe")]
use panic_probe as _;
use static_cell::StaticCell;

mod ble;
mod clock;
mod device;
mod flash;
mod settings;

use crate::ble::{Event, SettingChange};
use crate::device::{Backlight, Battery, Button, Screen, Vibrator};
use crate::flash::XtFlash;
use crate::settings::SettingsStore;

bind_interrupts!(struct Irqs {
    TWISPI0 => spim::InterruptHandler<peripherals::TWISPI0>;
    SAADC => saadc::InterruptHandler;
    RNG => rng::InterruptHandler<RNG>;
    EGU0_SWI0 => mpsl::LowPrioInterruptHandler;
    CLOCK_POWER => mpsl::ClockInterruptHandler;
    RADIO => mpsl::HighPrioInterruptHandler;
    TIMER0 => mpsl::HighPrioInterruptHandler;
    RTC0 => mpsl::HighPrioInterruptHandler;
});

static CLOCK: clock::Clock = clock::Clock::new();
static EVENTS: Channel<CriticalSectionRawMutex, Event, 4> = Channel::new();

static SPI_BUS: StaticCell<BMutex<NoopRawMutex, RefCell<Spim<'static, TWISPI0>>>> = StaticCell::new();

#[cfg(not(feature = "panic-probe"))]
#[inline(never)]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    cortex_m::peripheral::SCB::sys_reset();
}

#[embassy_executor::task]
async fn mpsl_task(mpsl: &'static mpsl::MultiprotocolServiceLayer<'static>) -> ! {
    mpsl.run().await
}

fn build_sdc<'d, const N: usize>(
    p: sdc::Peripherals<'d>,
    rng: &'d mut rng::Rng<RNG>,
    mpsl: &'d mpsl::MultiprotocolServiceLayer,
    mem: &'d mut sdc::Mem<N>,
) -> Result<sdc::SoftdeviceController<'d>, sdc::Error> {
    sdc::Builder::new()?
        .support_adv()?
        .support_peripheral()?
        .peripheral_count(1)?
        .buffer_cfg(
            ble::L2CAP_MTU as u8,
            ble::L2CAP_MTU as u8,
            ble::L2CAP_TXQ,
            ble::L2CAP_RXQ,
        )?
        .build(p, rng, mpsl, mem)
}

#[embassy_executor::main]
async fn main(s: Spawner) {
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let mpsl_p = mpsl::Peripherals::new(p.RTC0, p.TIMER0, p.TEMP, p.PPI_CH19, p.PPI_CH30, p.PPI_CH31);
    let lfclk_cfg = mpsl::raw::mpsl_clock_lfclk_cfg_t {
        source: mpsl::raw::MPSL_CLOCK_LF_SRC_RC as u8,
        rc_ctiv: mpsl::raw::MPSL_RECOMMENDED_RC_CTIV as u8,
        rc_temp_ctiv: mpsl::raw::MPSL_RECOMMENDED_RC_TEMP_CTIV as u8,
        accuracy_ppm: mpsl::raw::MPSL_DEFAULT_CLOCK_ACCURACY_PPM as u16,
        skip_wait_lfclk_started: mpsl::raw::MPSL_DEFAULT_SKIP_WAIT_LFCLK_STARTED != 0,
    };
    static MPSL: StaticCell<mpsl::MultiprotocolServiceLayer> = StaticCell::new();
    static SESSION_MEM: StaticCell<mpsl::SessionMem<1>> = StaticCell::new();
    let mpsl = MPSL.init(unwrap!(mpsl::MultiprotocolServiceLayer::with_timeslots(
        mpsl_p,
        Irqs,
        lfclk_cfg,
        SESSION_MEM.init(mpsl::SessionMem::new())
    )));
    s.must_spawn(mpsl_task(&*mpsl));
    s.must_spawn(watchdog_task());

    let sdc_p = sdc::Peripherals::new(
        p.PPI_CH17, p.PPI_CH18, p.PPI_CH20, p.PPI_CH21, p.PPI_CH22, p.PPI_CH23, p.PPI_CH24, p.PPI_CH25, p.PPI_CH26,
        p.PPI_CH27, p.PPI_CH28, p.PPI_CH29,
    );

    let rng = rng::Rng::new(p.RNG, Irqs);

    static SDC_MEM: StaticCell<sdc::Mem<4096>> = StaticCell::new();
    let sdc_mem = SDC_MEM.init(sdc::Mem::new());

    static RNG: StaticCell<rng::Rng<'static, RNG>> = StaticCell::new();
    let rng = RNG.init(rng);

    let sdc = unwrap!(build_sdc(sdc_p, rng, mpsl, sdc_mem));

    // Battery measurement
    let mut bat_config = saadc::ChannelConfig::single_ended(p.P0_31);
    bat_config.gain = saadc::Gain::GAIN1_4;
    bat_config.resistor = saadc::Resistor::BYPASS;
    bat_config.reference = saadc::Reference::INTERNAL;
    bat_config.time = saadc::Time::_40US;
    let mut adc_config = saadc::Config::default();
    adc_config.resolution = saadc::Resolution::_10BIT;
    let saadc = saadc::Saadc::new(p.SAADC, Irqs, adc_config, [bat_config]);
    let mut battery = Battery::new(saadc, Input::new(p.P0_12.degrade(), Pull::Up));

    // Button enable
    let _btn_enable = Output::new(p.P0_15, Level::High, OutputDrive::Standard);

    let mut button = Button::new(Input::new(p.P0_13.degrade(), Pull::Down));

    let mut vibrator = Vibrator::new(Output::new(p.P0_16.degrade(), Level::High, OutputDrive::Standard));

    let mut default_config = spim::Config::default();
    default_config.frequency = spim::Frequency::M8;
    default_config.mode = MODE_3;

    let spim = spim::Spim::new(p.TWISPI0, Irqs, p.P0_02, p.P0_04, p.P0_03, default_config);
    let spi_bus = SPI_BUS.init(BMutex::new(RefCell::new(spim)));

    // External flash holds the persisted display settings
    let flash_cs = Output::new(p.P0_05, Level::High, OutputDrive::Standard);
    let flash_spi = SpiDevice::new(spi_bus, flash_cs);
    let xt_flash = XtFlash::new(flash_spi).unwrap();
    let mut store = SettingsStore::new(xt_flash, settings::SETTINGS_OFFSET);
    let mut options = store.load();
    info!("Loaded settings: {:?}", options);

    // BLE
    ble::start(s, sdc);

    // Display
    let backlight = Backlight::new(p.P0_14.degrade(), p.P0_22.degrade(), p.P0_23.degrade());
    let rst = Output::new(p.P0_26, Level::Low, OutputDrive::Standard);
    let display_cs = Output::new(p.P0_25, Level::High, OutputDrive::Standard); // Keep low while driving display
    let display_spi = SpiDevice::new(spi_bus, display_cs);
    let dc = Output::new(p.P0_18, Level::Low, OutputDrive::Standard); // Data/clock
    let di = SPIInterface::new(display_spi, dc);
    let mut display = mipidsi::Builder::new(mipidsi::models::ST7789, di)
        .display_size(240, 240)
        .invert_colors(mipidsi::options::ColorInversion::Inverted)
        .reset_pin(rst)
        .init(&mut Delay)
        .unwrap();
    display.set_orientation(Orientation::new()).unwrap();

    let mut screen = Screen::new(display, backlight);

    let mut face = Watchface::new(CLOCK.get(), &options, battery.measure().await, battery.is_charging(), false);
    face.draw(screen.display()).unwrap();
    screen.on();

    loop {
        match select3(Timer::after(Duration::from_secs(2)), EVENTS.receive(), button.wait()).await {
            Either3::First(_) => {
                let now = CLOCK.get();
                let percent = battery.measure().await;
                let charging = battery.is_charging();
                if !format::same_face_minute(now, face.time)
                    || percent != face.battery_percent
                    || charging != face.charging
                {
                    face.time = now;
                    face.battery_percent = percent;
                    face.charging = charging;
                    face.draw(screen.display()).unwrap();
                }
            }
            Either3::Second(event) => {
                match event {
                    // Both link transitions get the double buzz.
                    Event::Connected => {
                        vibrator.double_pulse().await;
                        face.connected = true;
                    }
                    Event::Disconnected => {
                        vibrator.double_pulse().await;
                        face.connected = false;
                    }
                    Event::Setting(change) => {
                        match change {
                            SettingChange::TimeStyle(style) => options.time_style = style,
                            SettingChange::DateStyle(style) => options.date_style = style,
                            SettingChange::Heart(enabled) => options.heart = enabled,
                        }
                        store.save(&options);
                        face.time_style = options.time_style;
                        face.date_style = options.date_style;
                    }
                }
                face.time = CLOCK.get();
                face.draw(screen.display()).unwrap();
            }
            Either3::Third(_) => {
                screen.change_brightness();
            }
        }
    }
}

// Keeps our system alive
#[embassy_executor::task]
async fn watchdog_task() {
    let mut handle = unsafe { embassy_nrf::wdt::WatchdogHandle::steal(0) };
    loop {
        handle.pet();
        Timer::after(Duration::from_secs(4)).await;
    }
}
