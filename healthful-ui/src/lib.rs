#![cfg_attr(not(test), no_std)]

use embedded_graphics::pixelcolor::Rgb565 as Rgb;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, Line, PrimitiveStyle, Rectangle, RoundedRectangle,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_text::alignment::{HorizontalAlignment, VerticalAlignment};
use embedded_text::style::TextBoxStyleBuilder;
use embedded_text::TextBox;
use time::PrimitiveDateTime;
use u8g2_fonts::{fonts, U8g2TextStyle};

pub mod format;
pub mod settings;

pub use settings::{DateStyle, Settings, TimeStyle};

fn time_text_style(color: Rgb) -> U8g2TextStyle<Rgb> {
    U8g2TextStyle::new(fonts::u8g2_font_spleen32x64_mu, color)
}

fn label_text_style(color: Rgb) -> U8g2TextStyle<Rgb> {
    U8g2TextStyle::new(fonts::u8g2_font_unifont_t_symbols, color)
}

/// Synthetic health metrics shown on the face. Placeholder values until the
/// on-board sensors feed real data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthMetrics {
    pub sleep_minutes: u16,
    pub heart_bpm: u8,
    pub steps: u32,
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self {
            sleep_minutes: 450,
            heart_bpm: 60,
            steps: 8000,
        }
    }
}

/// The always-on face: day, time, date, health panels, battery level and
/// Bluetooth state. All geometry is derived from the target's centre so the
/// face stays centred on any screen size.
pub struct Watchface {
    pub time: PrimitiveDateTime,
    pub time_style: TimeStyle,
    pub date_style: DateStyle,
    pub battery_percent: u8,
    pub charging: bool,
    pub connected: bool,
    pub metrics: HealthMetrics,
}

impl Watchface {
    pub fn new(
        time: PrimitiveDateTime,
        settings: &Settings,
        battery_percent: u8,
        charging: bool,
        connected: bool,
    ) -> Self {
        Self {
            time,
            time_style: settings.time_style,
            date_style: settings.date_style,
            battery_percent,
            charging,
            connected,
            metrics: HealthMetrics::default(),
        }
    }

    pub fn draw<D: DrawTarget<Color = Rgb>>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear(Rgb::BLACK)?;
        let c = display.bounding_box().center();

        let panel = PrimitiveStyle::with_fill(Rgb::WHITE);
        let punch = PrimitiveStyle::with_fill(Rgb::BLACK);

        let header = face_rect(c, -100, -116, 200, 32);
        let footer = face_rect(c, -100, 84, 200, 32);
        let sleep_panel = face_rect(c, -100, -80, 136, 34);
        let heart_panel = face_rect(c, -100, 46, 82, 34);
        let steps_panel = face_rect(c, -8, 46, 108, 34);
        let battery_body = face_rect(c, 48, -72, 52, 30);
        let battery_nub = face_rect(c, 40, -65, 8, 14);
        let time_panel = face_rect(c, -100, -40, 200, 80);
        let time_inner = face_rect(c, -92, -33, 184, 66);

        for band in [header, footer, sleep_panel, heart_panel, steps_panel, battery_body] {
            RoundedRectangle::with_equal_corners(band, Size::new(3, 3))
                .into_styled(panel)
                .draw(display)?;
        }
        battery_nub.into_styled(panel).draw(display)?;
        RoundedRectangle::with_equal_corners(time_panel, Size::new(6, 6))
            .into_styled(panel)
            .draw(display)?;
        RoundedRectangle::with_equal_corners(time_inner, Size::new(4, 4))
            .into_styled(punch)
            .draw(display)?;

        // Dots punched into the band corners.
        for (dx, dy) in [(-88, -100), (88, -100), (-88, 100), (88, 100)] {
            Circle::with_center(c + Point::new(dx, dy), 10)
                .into_styled(punch)
                .draw(display)?;
        }

        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        let band_style = TextBoxStyleBuilder::new()
            .alignment(HorizontalAlignment::Center)
            .vertical_alignment(VerticalAlignment::Middle)
            .build();

        TextBox::with_textbox_style(
            format::weekday_name(self.time.weekday()),
            header,
            label_text_style(Rgb::BLACK),
            band_style,
        )
        .draw(display)?;

        let date = format::date_text(self.time.date(), self.date_style);
        TextBox::with_textbox_style(&date, footer, label_text_style(Rgb::BLACK), band_style)
            .draw(display)?;

        let hhmm = format::time_text(&self.time, self.time_style);
        Text::with_text_style(&hhmm, time_inner.center(), time_text_style(Rgb::WHITE), centered)
            .draw(display)?;

        let sleep = format::sleep_text(self.metrics.sleep_minutes);
        Text::with_text_style(
            &sleep,
            sleep_panel.center(),
            label_text_style(Rgb::BLACK),
            centered,
        )
        .draw(display)?;
        let heart = format::heart_text(self.metrics.heart_bpm);
        Text::with_text_style(
            &heart,
            heart_panel.center(),
            label_text_style(Rgb::BLACK),
            centered,
        )
        .draw(display)?;
        let steps = format::steps_text(self.metrics.steps);
        Text::with_text_style(
            &steps,
            steps_panel.center(),
            label_text_style(Rgb::BLACK),
            centered,
        )
        .draw(display)?;

        // The battery outline doubles as the Bluetooth indicator: the rune
        // covers the percentage while the phone is out of reach.
        if self.connected {
            let battery = format::battery_text(self.battery_percent);
            Text::with_text_style(
                &battery,
                battery_body.center(),
                label_text_style(Rgb::BLACK),
                centered,
            )
            .draw(display)?;
        } else {
            bluetooth_rune(display, battery_body.center(), 20)?;
        }
        if self.charging {
            RoundedRectangle::with_equal_corners(battery_body, Size::new(3, 3))
                .into_styled(PrimitiveStyle::with_stroke(Rgb::YELLOW, 2))
                .draw(display)?;
        }

        Ok(())
    }
}

fn face_rect(c: Point, dx: i32, dy: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(c + Point::new(dx, dy), Size::new(w, h))
}

fn bluetooth_rune<D: DrawTarget<Color = Rgb>>(
    display: &mut D,
    center: Point,
    height: i32,
) -> Result<(), D::Error> {
    let style = PrimitiveStyle::with_stroke(Rgb::BLACK, 2);
    let half = height / 2;
    let wing = height / 4;
    let top = center + Point::new(0, -half);
    let bottom = center + Point::new(0, half);
    let upper = center + Point::new(wing, -wing);
    let lower = center + Point::new(wing, wing);
    let left_up = center + Point::new(-wing, -wing);
    let left_down = center + Point::new(-wing, wing);
    for (a, b) in [
        (top, bottom),
        (top, upper),
        (upper, left_down),
        (bottom, lower),
        (lower, left_up),
    ] {
        Line::new(a, b).into_styled(style).draw(display)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use embedded_graphics_simulator::SimulatorDisplay;
    use time::macros::datetime;

    use super::*;

    fn face() -> Watchface {
        Watchface::new(
            datetime!(2026-08-26 14:05),
            &Settings::default(),
            78,
            false,
            true,
        )
    }

    fn render(face: &Watchface) -> SimulatorDisplay<Rgb> {
        let mut display = SimulatorDisplay::<Rgb>::new(Size::new(240, 240));
        face.draw(&mut display).unwrap();
        display
    }

    #[test]
    fn chrome_is_centred_on_240() {
        let display = render(&face());
        // Background outside the chrome.
        assert_eq!(display.get_pixel(Point::new(4, 4)), Rgb::BLACK);
        // Header band.
        assert_eq!(display.get_pixel(Point::new(60, 20)), Rgb::WHITE);
        // Dot punched into the header corner.
        assert_eq!(display.get_pixel(Point::new(32, 20)), Rgb::BLACK);
        // White ring of the time panel around the inverted inner box.
        assert_eq!(display.get_pixel(Point::new(24, 120)), Rgb::WHITE);
        // Inverted inner box, left of the digits.
        assert_eq!(display.get_pixel(Point::new(34, 120)), Rgb::BLACK);
        // Footer band.
        assert_eq!(display.get_pixel(Point::new(60, 220)), Rgb::WHITE);
    }

    #[test]
    fn draws_on_other_screen_sizes() {
        for size in [Size::new(180, 180), Size::new(320, 240)] {
            let mut display = SimulatorDisplay::<Rgb>::new(size);
            assert!(face().draw(&mut display).is_ok());
        }
    }

    #[test]
    fn bluetooth_rune_covers_battery_readout() {
        let connected = render(&face());
        let mut dropped_face = face();
        dropped_face.connected = false;
        let dropped = render(&dropped_face);

        // Battery outline region.
        let differs = (168..220).any(|x| {
            (48..78).any(|y| {
                connected.get_pixel(Point::new(x, y)) != dropped.get_pixel(Point::new(x, y))
            })
        });
        assert!(differs);
    }

    #[test]
    fn time_style_changes_rendering() {
        let h24 = render(&face());
        let mut twelve = face();
        twelve.time_style = TimeStyle::H12;
        let h12 = render(&twelve);

        // 14:05 vs 02:05 must differ inside the time box.
        let differs = (30..210).any(|x| {
            (90..150).any(|y| h24.get_pixel(Point::new(x, y)) != h12.get_pixel(Point::new(x, y)))
        });
        assert!(differs);
    }

    #[test]
    fn charging_highlights_battery_outline() {
        let mut charging_face = face();
        charging_face.charging = true;
        let display = render(&charging_face);

        let highlighted = (0..240).any(|x| {
            (0..240).any(|y| display.get_pixel(Point::new(x, y)) == Rgb::YELLOW)
        });
        assert!(highlighted);

        let plain = render(&face());
        let any_yellow = (0..240)
            .any(|x| (0..240).any(|y| plain.get_pixel(Point::new(x, y)) == Rgb::YELLOW));
        assert!(!any_yellow);
    }
}
