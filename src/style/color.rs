//! Hex colour parsing and perceived brightness.

/// Luma above which a label colour counts as "light text on a dark page",
/// in thousandths of a channel unit.
pub const DARK_WIDGET_LUMA_MILLI: u32 = 150_000;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Opaque white.
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Parse `rgb` or `rrggbb`, with or without leading `#`.
    pub fn from_hex(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|c| c.to_string().repeat(2));
                Some(Self {
                    r: channel(&digits.next()?)?,
                    g: channel(&digits.next()?)?,
                    b: channel(&digits.next()?)?,
                })
            }
            6 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            _ => None,
        }
    }

    /// Rec. 601 luma scaled by 1000: `299R + 587G + 114B`.
    ///
    /// Integer so threshold comparisons are exact.
    pub fn luma_milli(&self) -> u32 {
        299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b)
    }

    /// Luma on the usual 0..=255 scale.
    pub fn luma(&self) -> f64 {
        f64::from(self.luma_milli()) / 1000.0
    }
}

/// `true` when a label colour is bright enough that the page behind it is
/// probably dark. Unparseable colours read as light pages.
pub fn prefers_dark_widget(label_text_color: &str) -> bool {
    Rgb::from_hex(label_text_color)
        .map(|c| c.luma_milli() > DARK_WIDGET_LUMA_MILLI)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(
            Rgb::from_hex("#1e90ff"),
            Some(Rgb {
                r: 0x1e,
                g: 0x90,
                b: 0xff
            })
        );
        assert_eq!(
            Rgb::from_hex("fa0"),
            Some(Rgb {
                r: 0xff,
                g: 0xaa,
                b: 0x00
            })
        );
        assert_eq!(Rgb::from_hex("#FFF"), Some(Rgb::WHITE));
        assert!(Rgb::from_hex("#12345").is_none());
        assert!(Rgb::from_hex("#ggg").is_none());
        assert!(Rgb::from_hex("").is_none());
    }

    #[test]
    fn test_luma() {
        assert_eq!(Rgb::WHITE.luma_milli(), 255_000);
        assert_eq!(Rgb::from_hex("#000").unwrap().luma(), 0.0);
    }

    #[test]
    fn test_prefers_dark_widget() {
        assert!(prefers_dark_widget("#ffffff"));
        assert!(prefers_dark_widget("#e2e8f0"));
        assert!(!prefers_dark_widget("#3c434a"));
        assert!(!prefers_dark_widget("not a colour"));
    }

    #[test]
    fn test_threshold_is_strict() {
        // 0x96 grey sits exactly on the threshold.
        assert_eq!(Rgb::from_hex("#969696").unwrap().luma_milli(), 150_000);
        assert!(!prefers_dark_widget("#969696"));
        assert!(prefers_dark_widget("#979797"));
    }
}
