//! User-facing display settings and their persisted record format.
//!
//! The watch stores three flags: 12/24-hour time, date ordering, and a
//! heart-rate toggle that is persisted and relayed but not consumed by any
//! display path yet. Companion apps write the flags over GATT as the string
//! literals `"true"`/`"false"`.

/// How the hour is rendered on the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeStyle {
    /// 24-hour, `13:05`.
    #[default]
    H24,
    /// 12-hour, `01:05`. No am/pm suffix.
    H12,
}

/// Ordering of day and month in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateStyle {
    /// `28 August`
    #[default]
    DayMonth,
    /// `August 28`
    MonthDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub time_style: TimeStyle,
    pub date_style: DateStyle,
    /// Stored third flag, currently unused by the face.
    pub heart: bool,
}

/// Size of the encoded settings record.
pub const SETTINGS_LEN: usize = 4;

const MAGIC: u16 = 0xFACE;
const VERSION: u8 = 1;

const FLAG_H12: u8 = 1 << 0;
const FLAG_MONTH_DAY: u8 = 1 << 1;
const FLAG_HEART: u8 = 1 << 2;

impl Settings {
    /// Encode into the fixed-size flash record.
    pub fn encode(&self) -> [u8; SETTINGS_LEN] {
        let mut flags = 0;
        if self.time_style == TimeStyle::H12 {
            flags |= FLAG_H12;
        }
        if self.date_style == DateStyle::MonthDay {
            flags |= FLAG_MONTH_DAY;
        }
        if self.heart {
            flags |= FLAG_HEART;
        }
        let magic = MAGIC.to_be_bytes();
        [magic[0], magic[1], VERSION, flags]
    }

    /// Decode a flash record. Returns `None` when the record was never
    /// written (erased flash), or carries an unknown magic or version; the
    /// caller falls back to [`Settings::default`].
    pub fn decode(raw: &[u8]) -> Option<Self> {
        if raw.len() < SETTINGS_LEN {
            return None;
        }
        if u16::from_be_bytes([raw[0], raw[1]]) != MAGIC || raw[2] != VERSION {
            return None;
        }
        let flags = raw[3];
        Some(Self {
            time_style: if flags & FLAG_H12 != 0 {
                TimeStyle::H12
            } else {
                TimeStyle::H24
            },
            date_style: if flags & FLAG_MONTH_DAY != 0 {
                DateStyle::MonthDay
            } else {
                DateStyle::DayMonth
            },
            heart: flags & FLAG_HEART != 0,
        })
    }
}

/// Parse one of the wire literals sent by the companion app. Anything other
/// than `"true"` or `"false"` is ignored by the caller.
pub fn parse_flag(raw: &[u8]) -> Option<bool> {
    match raw {
        b"true" => Some(true),
        b"false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_24h_day_month() {
        let settings = Settings::default();
        assert_eq!(settings.time_style, TimeStyle::H24);
        assert_eq!(settings.date_style, DateStyle::DayMonth);
        assert!(!settings.heart);
    }

    #[test]
    fn record_roundtrip() {
        let all = [
            Settings::default(),
            Settings {
                time_style: TimeStyle::H12,
                date_style: DateStyle::MonthDay,
                heart: true,
            },
            Settings {
                time_style: TimeStyle::H24,
                date_style: DateStyle::MonthDay,
                heart: false,
            },
        ];
        for settings in all {
            assert_eq!(Settings::decode(&settings.encode()), Some(settings));
        }
    }

    #[test]
    fn erased_flash_decodes_to_none() {
        assert_eq!(Settings::decode(&[0xFF; SETTINGS_LEN]), None);
        assert_eq!(Settings::decode(&[]), None);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut raw = Settings::default().encode();
        raw[2] = VERSION + 1;
        assert_eq!(Settings::decode(&raw), None);
    }

    #[test]
    fn flag_literals() {
        assert_eq!(parse_flag(b"true"), Some(true));
        assert_eq!(parse_flag(b"false"), Some(false));
        assert_eq!(parse_flag(b"TRUE"), None);
        assert_eq!(parse_flag(b""), None);
        assert_eq!(parse_flag(b"1"), None);
    }
}
