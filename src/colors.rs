/*!
 # Color presets for the bulb

 This module defines the HSBK color type understood by LIFX bulbs and the
 palette of named presets the time blocks pick from.
*/

use std::fmt;

/// A LIFX color: hue, saturation and brightness on the full `u16` scale plus
/// a white point in Kelvin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Hue (0-65535 maps to 0-360 degrees)
    pub hue: u16,
    /// Saturation (0-65535)
    pub saturation: u16,
    /// Brightness (0-65535)
    pub brightness: u16,
    /// Color temperature in Kelvin (2500-9000)
    pub kelvin: u16,
}

impl Color {
    pub const fn new(hue: u16, saturation: u16, brightness: u16, kelvin: u16) -> Self {
        Self {
            hue,
            saturation,
            brightness,
            kelvin,
        }
    }
}

impl From<Color> for lifx_core::HSBK {
    fn from(color: Color) -> Self {
        lifx_core::HSBK {
            hue: color.hue,
            saturation: color.saturation,
            brightness: color.brightness,
            kelvin: color.kelvin,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HSBK({}, {}, {}, {}K)",
            self.hue, self.saturation, self.brightness, self.kelvin
        )
    }
}

/// Named color presets
#[derive(Debug, Clone, Copy)]
pub struct Colors {
    /// Full red
    pub red: Color,
    /// Dimmed red
    pub red2: Color,
    /// Full green
    pub green: Color,
    /// Dimmed green
    pub green_soft: Color,
    /// Full cyan
    pub cyan: Color,
    /// Dimmed cyan
    pub cyan_soft: Color,
    /// Full blue
    pub blue: Color,
    /// Full purple
    pub purple: Color,
    /// Dimmed purple
    pub purple_soft: Color,
    /// Pink
    pub pink: Color,
    /// Orange
    pub orange: Color,
    /// Yellow
    pub yellow: Color,
    /// Neutral white (5500K)
    pub white: Color,
    /// Cold white (9000K)
    pub cold_white: Color,
    /// Warm white (3000K)
    pub warm_white: Color,
    /// Gold (2500K)
    pub gold: Color,
}

/// Predefined colors with their HSBK values
pub const COLORS: Colors = Colors {
    red: Color::new(65535, 65535, 65535, 3500),
    red2: Color::new(65535, 65535, 30000, 3500),
    green: Color::new(16173, 65535, 65535, 3500),
    green_soft: Color::new(16173, 65535, 40000, 3500),
    cyan: Color::new(29814, 65535, 65535, 3500),
    cyan_soft: Color::new(29814, 65535, 30000, 3500),
    blue: Color::new(43634, 65535, 65535, 3500),
    purple: Color::new(50486, 65535, 65535, 3500),
    purple_soft: Color::new(50486, 65535, 30000, 3500),
    pink: Color::new(58275, 65535, 47142, 3500),
    orange: Color::new(6500, 65535, 65535, 3500),
    yellow: Color::new(9000, 65535, 65535, 3500),
    white: Color::new(58275, 0, 65535, 5500),
    cold_white: Color::new(58275, 0, 65535, 9000),
    warm_white: Color::new(65535, 262, 60000, 3000),
    gold: Color::new(58275, 0, 65535, 2500),
};
