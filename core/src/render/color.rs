//! Palette & color model (C1).
//!
//! CD+G colors are packed 12-bit RGB (4 bits per channel). This module holds
//! the 8-bit-to-4-bit packing rule, the wire encoding for `LOAD_COLOR_LOW`/
//! `LOAD_COLOR_HIGH` packets, and the default 16-entry palette.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// A 12-bit RGB color, stored as `(r4 << 8) | (g4 << 4) | b4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb12(pub u16);

impl Rgb12 {
    #[must_use]
    pub fn red(self) -> u8 {
        self.0.get_bits(8..=11) as u8
    }

    #[must_use]
    pub fn green(self) -> u8 {
        self.0.get_bits(4..=7) as u8
    }

    #[must_use]
    pub fn blue(self) -> u8 {
        self.0.get_bits(0..=3) as u8
    }
}

/// Packs an 8-bit-per-channel RGB color into the 12-bit CD+G representation.
///
/// `n4 = n8 / 17`, which round-trips exactly because `17 * 15 == 255`.
#[must_use]
pub fn rgb_to_cdg(r8: u8, g8: u8, b8: u8) -> Rgb12 {
    let r4 = u16::from(r8 / 17);
    let g4 = u16::from(g8 / 17);
    let b4 = u16::from(b8 / 17);
    Rgb12((r4 << 8) | (g4 << 4) | b4)
}

/// Packs 8 palette colors into the 16-byte `LOAD_COLOR_LOW`/`LOAD_COLOR_HIGH`
/// data payload: each color becomes a `(byte1, byte2)` pair of 6-bit-significant
/// bytes, per §4.1 of the wire format.
#[must_use]
pub fn pack_load_data(colors: [Rgb12; 8]) -> [u8; 16] {
    let mut data = [0u8; 16];
    for (i, color) in colors.into_iter().enumerate() {
        let r4 = color.red();
        let g4 = color.green();
        let b4 = color.blue();

        let byte1 = (r4 << 2) | (g4 >> 2);
        let byte2 = ((g4 & 0x3) << 4) | b4;

        data[i * 2] = byte1;
        data[i * 2 + 1] = byte2;
    }
    data
}

/// The default 16-color CD+G karaoke palette.
#[must_use]
pub fn default_palette() -> [Rgb12; 16] {
    [
        rgb_to_cdg(0, 0, 0),       // 0 black
        rgb_to_cdg(255, 255, 0),   // 1 yellow
        rgb_to_cdg(204, 204, 204), // 2 light gray
        rgb_to_cdg(255, 255, 255), // 3 white
        rgb_to_cdg(0, 0, 153),     // 4 dark blue
        rgb_to_cdg(102, 153, 255), // 5 light blue
        rgb_to_cdg(153, 153, 153), // 6 medium gray
        rgb_to_cdg(68, 68, 68),    // 7 dark gray
        rgb_to_cdg(204, 0, 0),     // 8 red
        rgb_to_cdg(0, 204, 0),     // 9 green
        rgb_to_cdg(0, 0, 255),     // 10 blue
        rgb_to_cdg(204, 0, 204),   // 11 magenta
        rgb_to_cdg(0, 204, 204),   // 12 cyan
        rgb_to_cdg(255, 153, 0),   // 13 orange
        rgb_to_cdg(153, 0, 204),   // 14 purple
        rgb_to_cdg(0, 102, 0),     // 15 dark green
    ]
}

/// The three logical colors the core resolves through the palette manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalColor {
    Background,
    ActiveText,
    TransitionText,
}
