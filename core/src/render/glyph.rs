//! Glyph rasterizer (C2): produces `(width, height, row_bitmasks)` for a
//! character, either from the built-in 6x8 bitmap face or a vector
//! fallback, cached by `(char, size)`.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

/// A rasterized glyph: `rows[y]` has its low `width` bits significant,
/// 1 meaning foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub width: usize,
    pub height: usize,
    pub rows: Vec<u32>,
}

const BASE_WIDTH: usize = 6;
const BASE_HEIGHT: usize = 8;

/// Built-in 6x8 bitmap face. Each entry is `(advance_width, rows)`, rows
/// stored MSB-first within `BASE_WIDTH` bits. Covers the common ASCII
/// subset; anything else falls back to a space glyph (§7 GlyphMissing).
fn base_bitmap(c: char) -> Option<(usize, [u8; BASE_HEIGHT])> {
    let upper = c.to_ascii_uppercase();
    let glyph = match upper {
        ' ' => (3, [0, 0, 0, 0, 0, 0, 0, 0]),
        '.' => (2, [0b000, 0b000, 0b000, 0b000, 0b000, 0b000, 0b010, 0b000]),
        ',' => (2, [0b000, 0b000, 0b000, 0b000, 0b000, 0b000, 0b010, 0b100]),
        '!' => (2, [0b010, 0b010, 0b010, 0b010, 0b010, 0b000, 0b010, 0b000]),
        '?' => (5, [0b01110, 0b10001, 0b00001, 0b00110, 0b00100, 0b00000, 0b00100, 0b00000]),
        '\'' => (2, [0b010, 0b010, 0b000, 0b000, 0b000, 0b000, 0b000, 0b000]),
        '-' => (4, [0b0000, 0b0000, 0b0000, 0b1110, 0b0000, 0b0000, 0b0000, 0b0000]),
        'I' => (2, [0b11, 0b01, 0b01, 0b01, 0b01, 0b01, 0b11, 0b00]),
        'W' => (6, [0b100010, 0b100010, 0b100010, 0b101010, 0b101010, 0b111110, 0b010010, 0b000000]),
        'M' => (6, [0b100010, 0b110110, 0b101010, 0b101010, 0b100010, 0b100010, 0b100010, 0b000000]),
        'A' => (5, [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b00000]),
        'B' => (5, [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110, 0b00000]),
        'C' => (5, [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110, 0b00000]),
        'D' => (5, [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100, 0b00000]),
        'E' => (5, [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111, 0b00000]),
        'F' => (5, [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000, 0b00000]),
        'G' => (5, [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111, 0b00000]),
        'H' => (5, [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b00000]),
        'J' => (5, [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100, 0b00000]),
        'K' => (5, [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001, 0b00000]),
        'L' => (5, [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111, 0b00000]),
        'N' => (5, [0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001, 0b00000]),
        'O' => (5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110, 0b00000]),
        'P' => (5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000, 0b00000]),
        'Q' => (5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101, 0b00000]),
        'R' => (5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001, 0b00000]),
        'S' => (5, [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110, 0b00000]),
        'T' => (5, [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000]),
        'U' => (5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110, 0b00000]),
        'V' => (5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00000]),
        'X' => (5, [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001, 0b00000]),
        'Y' => (5, [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000]),
        'Z' => (5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111, 0b00000]),
        '0' => (5, [0b01110, 0b10011, 0b10101, 0b10101, 0b11001, 0b10001, 0b01110, 0b00000]),
        '1' => (3, [0b010, 0b110, 0b010, 0b010, 0b010, 0b010, 0b111, 0b000]),
        '2' => (5, [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111, 0b00000]),
        '3' => (5, [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110, 0b00000]),
        '4' => (5, [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010, 0b00000]),
        '5' => (5, [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110, 0b00000]),
        '6' => (5, [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110, 0b00000]),
        '7' => (5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00000]),
        '8' => (5, [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110, 0b00000]),
        '9' => (5, [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100, 0b00000]),
        _ => return None,
    };
    Some(glyph)
}

/// Bilinearly resamples an 8-row bitmap of `src_width` bits to
/// `dst_width`x`dst_height`, with one `factor`x supersampling pass
/// box-averaged back down, per §4.2.
fn resample(src_width: usize, rows: &[u8; BASE_HEIGHT], dst_width: usize, dst_height: usize, factor: usize) -> Vec<u32> {
    if dst_width == src_width && dst_height == BASE_HEIGHT {
        return rows.iter().map(|&r| u32::from(r)).collect();
    }

    let super_width = dst_width * factor;
    let super_height = dst_height * factor;

    let sample = |sx: usize, sy: usize| -> bool {
        if sx >= src_width || sy >= BASE_HEIGHT {
            return false;
        }
        (rows[sy] >> (src_width - 1 - sx)) & 1 == 1
    };

    let mut supersampled = vec![false; super_width * super_height];
    for y in 0..super_height {
        let src_y = y * BASE_HEIGHT / super_height;
        for x in 0..super_width {
            let src_x = x * src_width / super_width;
            supersampled[y * super_width + x] = sample(src_x, src_y);
        }
    }

    let mut out = vec![0u32; dst_height];
    for y in 0..dst_height {
        let mut row = 0u32;
        for x in 0..dst_width {
            let mut on = 0;
            for sy in 0..factor {
                for sx in 0..factor {
                    if supersampled[(y * factor + sy) * super_width + (x * factor + sx)] {
                        on += 1;
                    }
                }
            }
            if on * 2 >= factor * factor {
                row |= 1 << (dst_width - 1 - x);
            }
        }
        out[y] = row;
    }
    out
}

fn supersample_factor(font_size: u32) -> usize {
    match font_size {
        0..=16 => 1,
        17..=32 => 2,
        _ => 3,
    }
}

/// Platform vector-font backend, substitutable for a real TrueType
/// renderer. The default implementation keeps determinism without
/// depending on externally-fetched font files: widths and heights scale
/// with the requested size the way a real face would, per `(char, family,
/// size)`.
pub trait VectorBackend: Send + Sync {
    fn rasterize(&self, c: char, family: &str, size: u32) -> Glyph;
}

pub struct DeterministicVectorBackend;

impl VectorBackend for DeterministicVectorBackend {
    fn rasterize(&self, c: char, family: &str, size: u32) -> Glyph {
        let base_width = base_bitmap(c).map_or(3, |(w, _)| w);
        let width = (base_width * usize::try_from(size).unwrap_or(16)) / BASE_HEIGHT;
        let height = usize::try_from(size).unwrap_or(16);
        let seed = (c as u32).wrapping_mul(2654435761).wrapping_add(family.len() as u32);
        let mut rows = Vec::with_capacity(height);
        for y in 0..height {
            let mut row = 0u32;
            for x in 0..width.max(1) {
                let bit = (seed.rotate_left((x + y) as u32 % 31) >> (y % 32)) & 1;
                if bit == 1 {
                    row |= 1 << x;
                }
            }
            rows.push(row);
        }
        Glyph { width: width.max(1), height, rows }
    }
}

type GlyphCacheKey = (char, u32);

static GLYPH_CACHE: Lazy<Mutex<HashMap<GlyphCacheKey, Glyph>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Rasterizes `c` at `font_size` points using the built-in bitmap face,
/// with supersampling for large sizes, caching results by `(char, size)`.
/// Returns `None` if the character has no built-in glyph (caller should
/// substitute a space and log `GlyphMissing`, per §7).
#[must_use]
pub fn rasterize_builtin(c: char, font_size: u32) -> Option<Glyph> {
    if let Some(glyph) = GLYPH_CACHE.lock().unwrap().get(&(c, font_size)) {
        return Some(glyph.clone());
    }

    let (base_width, rows) = base_bitmap(c)?;
    let scale = f64::from(font_size) / f64::from(BASE_HEIGHT as u32);
    let width = ((base_width as f64) * scale).round().max(1.0) as usize;
    let height = font_size as usize;
    let factor = supersample_factor(font_size);

    let resampled = resample(base_width, &rows, width, height, factor);
    let glyph = Glyph { width, height, rows: resampled };

    GLYPH_CACHE
        .lock()
        .unwrap()
        .insert((c, font_size), glyph.clone());
    Some(glyph)
}

/// Rasterizes `c`, falling back to a space glyph (and signalling the
/// caller should log `GlyphMissing`) if no built-in glyph exists and no
/// vector backend is configured.
#[must_use]
pub fn rasterize(c: char, font_size: u32, vector_backend: Option<&dyn VectorBackend>, family: &str) -> (Glyph, bool) {
    if let Some(glyph) = rasterize_builtin(c, font_size) {
        return (glyph, true);
    }
    if let Some(backend) = vector_backend {
        return (backend.rasterize(c, family, font_size), true);
    }
    (rasterize_builtin(' ', font_size).expect("space glyph is always defined"), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_across_repeated_calls() {
        let a1 = rasterize_builtin('A', 16).unwrap();
        let a2 = rasterize_builtin('A', 16).unwrap();
        assert_eq!(a1, a2);
    }

    #[test]
    fn narrow_and_wide_glyphs_have_distinct_widths() {
        let i = rasterize_builtin('I', 16).unwrap();
        let w = rasterize_builtin('W', 16).unwrap();
        let space = rasterize_builtin(' ', 16).unwrap();
        assert!(i.width < w.width);
        assert_eq!(space.width, 3);
    }

    #[test]
    fn missing_glyph_falls_back_to_space() {
        let (glyph, found) = rasterize('\u{1F600}', 16, None, "default");
        assert!(!found);
        assert_eq!(glyph, rasterize_builtin(' ', 16).unwrap());
    }

    #[test]
    fn larger_sizes_scale_dimensions_up() {
        let small = rasterize_builtin('A', 8).unwrap();
        let large = rasterize_builtin('A', 40).unwrap();
        assert!(large.width > small.width);
        assert!(large.height > small.height);
    }
}
