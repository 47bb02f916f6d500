//! Tile-block encoder (C4): converts a dirty 6x12 pixel region into 1-4
//! CD+G tile-draw packets, choosing the COPY/XOR variant by color
//! cardinality.

use super::vram::Vram;
use super::{TILE_HEIGHT, TILE_WIDTH};
use crate::packet::{Instruction, Packet};

pub type Block = [[u8; TILE_WIDTH]; TILE_HEIGHT];

/// Builds the 16-byte data payload for a tile-block packet (§4.4).
fn build_tile_data(color_0: u8, color_1: u8, x_block: usize, y_block: usize, row_masks: [u8; TILE_HEIGHT]) -> [u8; 16] {
    const CHANNEL: u8 = 0;
    let mut data = [0u8; 16];
    data[0] = (color_0 & 0x0F) | ((CHANNEL << 2) & 0x30);
    data[1] = (color_1 & 0x0F) | ((CHANNEL << 4) & 0x30);
    data[2] = (y_block as u8) & 0x3F;
    data[3] = (x_block as u8) & 0x3F;
    data[4..16].copy_from_slice(&row_masks);
    data
}

fn mask_rows(block: &Block, mut predicate: impl FnMut(u8) -> bool) -> [u8; TILE_HEIGHT] {
    let mut rows = [0u8; TILE_HEIGHT];
    for (row, line) in block.iter().enumerate() {
        let mut bits = 0u8;
        for (col, &pixel) in line.iter().enumerate() {
            if predicate(pixel) {
                bits |= 1 << (TILE_WIDTH - 1 - col);
            }
        }
        rows[row] = bits;
    }
    rows
}

/// Resolves a `transparent`-marked target block against the current VRAM
/// contents: a transparent pixel keeps whatever is already on screen, so
/// the rest of the encoder only ever deals in concrete colors.
fn resolve_transparency(target: &Block, current: &Block, transparent: Option<u8>) -> Block {
    match transparent {
        None => *target,
        Some(t) => {
            let mut resolved = *target;
            for (row, line) in resolved.iter_mut().enumerate() {
                for (col, pixel) in line.iter_mut().enumerate() {
                    if *pixel == t {
                        *pixel = current[row][col];
                    }
                }
            }
            resolved
        }
    }
}

/// Distinct colors present in `block`, in descending frequency order, ties
/// broken by the lower palette index.
fn color_frequencies(block: &Block) -> Vec<(u8, usize)> {
    let mut counts = [0usize; 16];
    for line in block {
        for &pixel in line {
            counts[pixel as usize] += 1;
        }
    }
    let mut frequencies: Vec<(u8, usize)> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(idx, &count)| (idx as u8, count))
        .collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    frequencies
}

/// Encodes the transition from the VRAM's current content of
/// `(block_x, block_y)` to `target`, mutating VRAM to match and returning
/// the packets needed to drive a real player to the same state. Returns an
/// empty list (and leaves VRAM untouched) if the block is already correct.
#[must_use]
pub fn encode_tile(
    vram: &mut Vram,
    block_x: usize,
    block_y: usize,
    target: &Block,
    transparent: Option<u8>,
) -> Vec<Packet> {
    let current = vram.read_block(block_x, block_y);
    let resolved = resolve_transparency(target, &current, transparent);

    if resolved == current {
        return Vec::new();
    }

    let frequencies = color_frequencies(&resolved);
    let packets = match frequencies.len() {
        0 => Vec::new(),
        1 => {
            let c = frequencies[0].0;
            let rows = [0x3F; TILE_HEIGHT];
            vec![Packet::new(
                Instruction::TileBlock,
                build_tile_data(c, c, block_x, block_y, rows),
            )]
        }
        2 => {
            let c0 = frequencies[0].0;
            let c1 = frequencies[1].0;
            let rows = mask_rows(&resolved, |p| p == c1);
            vec![Packet::new(
                Instruction::TileBlock,
                build_tile_data(c0, c1, block_x, block_y, rows),
            )]
        }
        3 => {
            let c0 = frequencies[0].0;
            let c1 = frequencies[1].0;
            let c2 = frequencies[2].0;

            let first_rows = mask_rows(&resolved, |p| p == c0 || p == c2);
            let first = Packet::new(
                Instruction::TileBlock,
                build_tile_data(c1, c0, block_x, block_y, first_rows),
            );

            let second_rows = mask_rows(&resolved, |p| p == c2);
            let second = Packet::new(
                Instruction::TileBlockXor,
                build_tile_data(0, c0 ^ c2, block_x, block_y, second_rows),
            );

            vec![first, second]
        }
        _ => encode_bitplanes(&resolved, block_x, block_y),
    };

    vram.write_block(block_x, block_y, &resolved);
    packets
}

/// `>=4` colors: the bitplane method. One packet per palette bit that
/// varies across the colors present, first COPY then XOR.
fn encode_bitplanes(resolved: &Block, block_x: usize, block_y: usize) -> Vec<Packet> {
    let distinct: Vec<u8> = color_frequencies(resolved).into_iter().map(|(c, _)| c).collect();
    let or_colors = distinct.iter().fold(0u8, |acc, &c| acc | c);
    let and_colors = distinct.iter().fold(0xFu8, |acc, &c| acc & c);

    let mut packets = Vec::new();
    let mut first = true;
    for bit in (0..4).rev() {
        let varies = (or_colors >> bit) & 1 == 1 && (and_colors >> bit) & 1 == 0;
        if !varies {
            continue;
        }

        let rows = mask_rows(resolved, |p| (p >> bit) & 1 == 1);
        if first {
            let c0 = and_colors;
            let c1 = (1 << bit) | and_colors;
            packets.push(Packet::new(
                Instruction::TileBlock,
                build_tile_data(c0, c1, block_x, block_y, rows),
            ));
            first = false;
        } else {
            packets.push(Packet::new(
                Instruction::TileBlockXor,
                build_tile_data(0, 1 << bit, block_x, block_y, rows),
            ));
        }
    }
    packets
}

/// Wipes a tile to a solid background color with an all-zero row mask,
/// the dedicated `remove_text` teardown packet (§4.8) rather than the
/// general cardinality-driven algorithm above.
#[must_use]
pub fn clear_tile(vram: &mut Vram, block_x: usize, block_y: usize, background: u8) -> Packet {
    vram.write_block(block_x, block_y, &[[background; TILE_WIDTH]; TILE_HEIGHT]);
    Packet::new(
        Instruction::TileBlock,
        build_tile_data(background, background, block_x, block_y, [0u8; TILE_HEIGHT]),
    )
}

/// XOR-only mode (used for highlight overlays): a single `XOR_FONT` with
/// `(0, 1)` whose mask is every non-background pixel. Empty if there is no
/// such pixel.
#[must_use]
pub fn encode_tile_xor_highlight(
    vram: &mut Vram,
    block_x: usize,
    block_y: usize,
    target: &Block,
    background: u8,
) -> Vec<Packet> {
    let rows = mask_rows(target, |p| p != background);
    if rows.iter().all(|&r| r == 0) {
        return Vec::new();
    }

    let data = build_tile_data(0, 1, block_x, block_y, rows);
    let current = vram.read_block(block_x, block_y);
    let mut next = current;
    for (row, line) in next.iter_mut().enumerate() {
        for (col, pixel) in line.iter_mut().enumerate() {
            if target[row][col] != background {
                *pixel ^= 1;
            }
        }
    }
    vram.write_block(block_x, block_y, &next);

    vec![Packet::new(Instruction::TileBlockXor, data)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block_of(colors: [u8; TILE_HEIGHT * TILE_WIDTH]) -> Block {
        let mut block = [[0u8; TILE_WIDTH]; TILE_HEIGHT];
        for (i, &c) in colors.iter().enumerate() {
            block[i / TILE_WIDTH][i % TILE_WIDTH] = c;
        }
        block
    }

    #[test]
    fn idempotence_fast_path() {
        let mut vram = Vram::new();
        let target = block_of([1; 72]);
        let packets = encode_tile(&mut vram, 0, 0, &target, None);
        assert_eq!(packets.len(), 1);

        let packets_again = encode_tile(&mut vram, 0, 0, &target, None);
        assert!(packets_again.is_empty());
        assert_eq!(vram.read_block(0, 0), target);
    }

    #[test]
    fn single_color_emits_one_copy_packet() {
        let mut vram = Vram::new();
        let target = block_of([4; 72]);
        let packets = encode_tile(&mut vram, 1, 2, &target, None);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].instruction, Some(Instruction::TileBlock));
        assert_eq!(packets[0].data[0] & 0x0F, 4);
        assert_eq!(packets[0].data[1] & 0x0F, 4);
        assert!(packets[0].data[4..16].iter().all(|&b| b == 0x3F));
    }

    #[test]
    fn two_color_block_masks_the_second_color() {
        let mut vram = Vram::new();
        // 48 pixels idx 1, 24 pixels idx 2 (S3).
        let mut colors = [1u8; 72];
        for c in colors.iter_mut().take(72).skip(48) {
            *c = 2;
        }
        let target = block_of(colors);

        let packets = encode_tile(&mut vram, 0, 0, &target, None);
        assert_eq!(packets.len(), 1);
        let p = packets[0];
        assert_eq!(p.instruction, Some(Instruction::TileBlock));
        assert_eq!(p.data[0] & 0x0F, 1);
        assert_eq!(p.data[1] & 0x0F, 2);
        assert_eq!(vram.read_block(0, 0), target);
    }

    #[test]
    fn three_color_block_matches_s4_scenario() {
        let mut vram = Vram::new();
        // frequencies: idx3 x40, idx5 x20, idx7 x12.
        let mut colors = [3u8; 72];
        for c in colors.iter_mut().take(60).skip(40) {
            *c = 5;
        }
        for c in colors.iter_mut().take(72).skip(60) {
            *c = 7;
        }
        let target = block_of(colors);

        let packets = encode_tile(&mut vram, 0, 0, &target, None);
        assert_eq!(packets.len(), 2);

        assert_eq!(packets[0].instruction, Some(Instruction::TileBlock));
        assert_eq!(packets[0].data[0] & 0x0F, 5);
        assert_eq!(packets[0].data[1] & 0x0F, 3);

        assert_eq!(packets[1].instruction, Some(Instruction::TileBlockXor));
        assert_eq!(packets[1].data[0] & 0x0F, 0);
        assert_eq!(packets[1].data[1] & 0x0F, 3 ^ 7);

        assert_eq!(vram.read_block(0, 0), target);
    }

    #[test]
    fn four_plus_colors_uses_bitplane_method() {
        let mut vram = Vram::new();
        let mut colors = [0u8; 72];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = (i % 5) as u8; // 5 distinct colors: 0..=4
        }
        let target = block_of(colors);

        let packets = encode_tile(&mut vram, 0, 0, &target, None);
        assert!(!packets.is_empty());
        assert_eq!(packets[0].instruction, Some(Instruction::TileBlock));
        for p in &packets[1..] {
            assert_eq!(p.instruction, Some(Instruction::TileBlockXor));
        }
        assert_eq!(vram.read_block(0, 0), target);
    }

    #[test]
    fn transparent_pixels_keep_existing_vram_content() {
        let mut vram = Vram::new();
        vram.write_block(0, 0, &block_of([9; 72]));

        let mut colors = [2u8; 72];
        colors[0] = 250; // sentinel marking "transparent"
        let target = block_of(colors);

        let packets = encode_tile(&mut vram, 0, 0, &target, Some(250));
        assert!(!packets.is_empty());
        let result = vram.read_block(0, 0);
        assert_eq!(result[0][0], 9); // untouched, still background
        assert_eq!(result[0][1], 2);
    }

    #[test]
    fn clear_tile_zeroes_the_row_mask() {
        let mut vram = Vram::new();
        vram.write_block(0, 0, &block_of([5; 72]));

        let packet = clear_tile(&mut vram, 0, 0, 2);
        assert_eq!(packet.instruction, Some(Instruction::TileBlock));
        assert_eq!(packet.data[0] & 0x0F, 2);
        assert_eq!(packet.data[1] & 0x0F, 2);
        assert!(packet.data[4..16].iter().all(|&b| b == 0));
        assert_eq!(vram.read_block(0, 0), block_of([2; 72]));
    }

    #[test]
    fn xor_highlight_marks_only_non_background_pixels() {
        let mut vram = Vram::new();
        let mut colors = [0u8; 72];
        colors[0] = 1;
        let target = block_of(colors);

        let packets = encode_tile_xor_highlight(&mut vram, 0, 0, &target, 0);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].instruction, Some(Instruction::TileBlockXor));
        assert_eq!(packets[0].data[0] & 0x0F, 0);
        assert_eq!(packets[0].data[1] & 0x0F, 1);
    }

    #[test]
    fn xor_highlight_empty_when_no_foreground_pixels() {
        let mut vram = Vram::new();
        let target = block_of([0; 72]);
        let packets = encode_tile_xor_highlight(&mut vram, 0, 0, &target, 0);
        assert!(packets.is_empty());
    }
}
