use embedded_graphics::pixelcolor::Rgb565 as Rgb;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, Window};
use healthful_ui::{DateStyle, Settings, TimeStyle, Watchface};

fn main() -> Result<(), core::convert::Infallible> {
    let output_settings = OutputSettingsBuilder::new().scale(2).build();

    let t = time::OffsetDateTime::now_utc();
    let now = time::PrimitiveDateTime::new(t.date(), t.time());

    let mut display = SimulatorDisplay::<Rgb>::new(Size::new(240, 240));
    let face = Watchface::new(now, &Settings::default(), 78, false, true);
    face.draw(&mut display)?;
    Window::new("Healthful", &output_settings).show_static(&display);

    let mut display = SimulatorDisplay::<Rgb>::new(Size::new(240, 240));
    let twelve = Settings {
        time_style: TimeStyle::H12,
        date_style: DateStyle::MonthDay,
        heart: false,
    };
    let mut face = Watchface::new(now, &twelve, 33, true, false);
    face.metrics.steps = 12345;
    face.draw(&mut display)?;
    Window::new("Healthful (12h, charging, no phone)", &output_settings).show_static(&display);

    Ok(())
}
