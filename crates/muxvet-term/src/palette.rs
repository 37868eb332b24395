//! Indexed-to-RGB color resolution.
//!
//! The emulator reports cell colors exactly as the application set them:
//! default, palette index, or direct RGB. Comparisons work on concrete RGB
//! values, so indexed colors resolve through the fixed 256-entry palette
//! below and defaults resolve to [`DEFAULT_FG`] / [`DEFAULT_BG`].

use muxvet_types::Rgb;

/// Foreground used when the application never set a color.
pub const DEFAULT_FG: Rgb = Rgb(240, 240, 240);

/// Background used when the application never set a color.
pub const DEFAULT_BG: Rgb = Rgb(0, 0, 0);

/// The 16 base ANSI colors.
const ANSI: [Rgb; 16] = [
    Rgb(0, 0, 0),
    Rgb(224, 0, 0),
    Rgb(0, 224, 0),
    Rgb(224, 224, 0),
    Rgb(0, 0, 224),
    Rgb(224, 0, 224),
    Rgb(0, 224, 224),
    Rgb(224, 224, 224),
    Rgb(128, 128, 128),
    Rgb(255, 64, 64),
    Rgb(64, 255, 64),
    Rgb(255, 255, 64),
    Rgb(64, 64, 255),
    Rgb(255, 64, 255),
    Rgb(64, 255, 255),
    Rgb(255, 255, 255),
];

/// Resolve an emulator color report to concrete RGB.
pub fn resolve(color: vt100::Color, default: Rgb) -> Rgb {
    match color {
        vt100::Color::Default => default,
        vt100::Color::Idx(idx) => indexed(idx),
        vt100::Color::Rgb(r, g, b) => Rgb(r, g, b),
    }
}

/// RGB value of palette index `idx`.
///
/// Indices 16-231 form a 6x6x6 cube with component levels at multiples of
/// 51; 232-255 are a 24-step grayscale ramp at `i * 255 / 23`.
pub fn indexed(idx: u8) -> Rgb {
    match idx {
        0..=15 => ANSI[idx as usize],
        16..=231 => {
            let i = u32::from(idx) - 16;
            let r = (i / 36) % 6;
            let g = (i / 6) % 6;
            let b = i % 6;
            Rgb((r * 51) as u8, (g * 51) as u8, (b * 51) as u8)
        }
        232..=255 => {
            let level = ((u32::from(idx) - 232) * 255 / 23) as u8;
            Rgb(level, level, level)
        }
    }
}
