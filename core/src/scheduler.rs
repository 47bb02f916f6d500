//! Scheduler / renderer core (C8): drives the VRAM, palette manager, and
//! tracked text over the command timeline, emitting a deterministic
//! packet stream.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::compiler::{Align, CommandKind, Position, PresentationCommand};
use crate::config::Config;
use crate::error::Error;
use crate::lease::palette::PaletteManager;
use crate::packet::Packet;
use crate::prelude;
use crate::render::color::LogicalColor;
use crate::render::glyph::{self, Glyph};
use crate::render::tile;
use crate::render::vram::Vram;
use crate::render::{BLOCKS_X, BLOCKS_Y, SCREEN_WIDTH, TILE_HEIGHT, TILE_WIDTH};

/// Preferred palette slots for the three logical colors, chosen to match
/// `Config::default()`'s RGB values against `default_palette()` so the
/// synthesized prelude's two load packets need no extra flush.
const BACKGROUND_SLOT: usize = 0;
const ACTIVE_SLOT: usize = 1;
const TRANSITION_SLOT: usize = 3;

struct GlyphPlacement {
    glyph: Glyph,
    x: usize,
    y: usize,
}

struct TrackedText {
    placements: Vec<GlyphPlacement>,
    tiles: Vec<(usize, usize)>,
}

pub struct Scheduler {
    vram: Vram,
    palette: PaletteManager,
    texts: HashMap<u64, TrackedText>,
    packets: Vec<Packet>,
    packets_emitted: u64,
    pps: u32,
    guard_limit: u64,
    background_slot: usize,
    active_slot: usize,
    transition_slot: usize,
    font_size: u32,
    missing_glyphs_logged: HashSet<char>,
}

fn target_packet(t_ms: u64, pps: u32) -> u64 {
    t_ms * u64::from(pps) / 1000
}

fn pixel_writes_for_glyph(glyph: &Glyph, origin_x: usize, origin_y: usize, fg: u8) -> Vec<(usize, usize, u8)> {
    let mut writes = Vec::new();
    for (row, &bits) in glyph.rows.iter().enumerate() {
        for col in 0..glyph.width {
            if (bits >> (glyph.width - 1 - col)) & 1 == 1 {
                writes.push((origin_x + col, origin_y + row, fg));
            }
        }
    }
    writes
}

impl Scheduler {
    #[must_use]
    pub fn new(config: &Config, duration_ms: u64) -> Self {
        let mut palette = PaletteManager::new();
        let background_slot = palette.lease(config.background_color, None, "background", Some(BACKGROUND_SLOT)).unwrap_or_else(|| {
            logger::log(Error::PaletteExhausted);
            TRANSITION_SLOT
        });
        let active_slot = palette.lease(config.active_color, None, "active-text", Some(ACTIVE_SLOT)).unwrap_or_else(|| {
            logger::log(Error::PaletteExhausted);
            TRANSITION_SLOT
        });
        let transition_slot = palette.lease(config.transition_color, None, "transition-text", Some(TRANSITION_SLOT)).unwrap_or_else(|| {
            logger::log(Error::PaletteExhausted);
            TRANSITION_SLOT
        });

        let target = target_packet(duration_ms, config.pps);
        let guard_limit = (target as f64 * 1.1).ceil() as u64;

        Self {
            vram: Vram::new(),
            palette,
            texts: HashMap::new(),
            packets: Vec::new(),
            packets_emitted: 0,
            pps: config.pps,
            guard_limit,
            background_slot,
            active_slot,
            transition_slot,
            font_size: config.font_size,
            missing_glyphs_logged: HashSet::new(),
        }
    }

    fn resolve(&self, color: LogicalColor) -> usize {
        match color {
            LogicalColor::Background => self.background_slot,
            LogicalColor::ActiveText => self.active_slot,
            LogicalColor::TransitionText => self.transition_slot,
        }
    }

    fn push(&mut self, packet: Packet) {
        self.packets.push(packet);
        self.packets_emitted += 1;
    }

    fn pad_to(&mut self, target: u64) {
        while self.packets_emitted < target {
            if self.packets_emitted >= self.guard_limit {
                logger::log(Error::GuardLimitReached);
                break;
            }
            self.push(Packet::empty());
        }
    }

    pub fn run_prelude(&mut self, config: &Config) {
        let packets = match config.prelude_mode {
            crate::config::PreludeMode::Synthesize => prelude::synthesize(&mut self.palette, self.background_slot),
            crate::config::PreludeMode::CopyReference => config
                .reference_cdg_path
                .as_deref()
                .and_then(|path| std::fs::read(path).ok())
                .and_then(|bytes| prelude::copy_reference(&bytes))
                .unwrap_or_else(|| {
                    let path = config.reference_cdg_path.clone().unwrap_or_default();
                    logger::log(Error::ReferencePreludeUnreadable(path));
                    prelude::synthesize(&mut self.palette, self.background_slot)
                }),
        };
        for packet in packets {
            self.push(packet);
        }
    }

    /// Executes the fully-ordered command stream, returning the final
    /// packet buffer. `duration_ms` bounds the trailing padding.
    pub fn run(mut self, commands: &[PresentationCommand], duration_ms: u64) -> Vec<Packet> {
        for command in commands {
            self.pad_to(target_packet(command.timestamp_ms, self.pps));
            self.execute(command);
        }
        self.pad_to(target_packet(duration_ms, self.pps));
        self.packets
    }

    fn execute(&mut self, command: &PresentationCommand) {
        match &command.kind {
            CommandKind::ClearScreen { color } => self.handle_clear_screen(*color),
            CommandKind::ShowText { text_id, text, position, color, align } => {
                self.handle_show_text(*text_id, text, *position, *color, *align);
            }
            CommandKind::ChangeColor { text_id, start_char, end_char, color } => {
                self.handle_change_color(*text_id, *start_char, *end_char, *color);
            }
            CommandKind::RemoveText { text_id } => self.handle_remove_text(*text_id),
        }
    }

    fn handle_clear_screen(&mut self, color: LogicalColor) {
        let slot = self.resolve(color);
        for packet in self.palette.get_pending_load_packets() {
            self.push(packet);
        }
        let mut data = [0u8; 16];
        data[0] = (slot as u8) & 0x0F;
        self.push(Packet::new(crate::packet::Instruction::MemoryPreset, data));
        self.vram.clear(slot as u8);
        self.texts.clear();
    }

    fn handle_show_text(&mut self, text_id: u64, text: &str, position: Position, color: LogicalColor, align: Align) {
        let fg_slot = self.resolve(color) as u8;
        let font_size = self.font_size;
        let char_spacing = ((f64::from(font_size) * 0.15).ceil() as usize).max(1);

        let mut glyphs = Vec::with_capacity(text.chars().count());
        for c in text.chars() {
            let (glyph, found) = glyph::rasterize(c, font_size, None, "default");
            if !found && self.missing_glyphs_logged.insert(c) {
                logger::log(Error::GlyphMissing(c));
            }
            glyphs.push(glyph);
        }

        let total_width: usize = glyphs.iter().map(|g| g.width).sum::<usize>() + char_spacing * glyphs.len().saturating_sub(1);
        let pixel_y = ((f64::from(position.y) * 216.0 / 1000.0).round() as usize).min(crate::render::SCREEN_HEIGHT - 1);
        let pixel_x = match align {
            Align::Center => SCREEN_WIDTH.saturating_sub(total_width) / 2,
            Align::Left => 4,
            Align::Right => SCREEN_WIDTH.saturating_sub(total_width + 4),
        };

        let mut writes = Vec::new();
        let mut placements = Vec::with_capacity(glyphs.len());
        let mut cursor_x = pixel_x;
        for glyph in glyphs {
            writes.extend(pixel_writes_for_glyph(&glyph, cursor_x, pixel_y, fg_slot));
            let width = glyph.width;
            placements.push(GlyphPlacement { glyph, x: cursor_x, y: pixel_y });
            cursor_x += width + char_spacing;
        }

        let (packets, tiles) = self.apply_writes(&writes);
        for packet in packets {
            self.push(packet);
        }
        self.texts.insert(text_id, TrackedText { placements, tiles });
    }

    fn handle_change_color(&mut self, text_id: u64, start_char: usize, end_char: usize, color: LogicalColor) {
        let fg_slot = self.resolve(color) as u8;
        let Some(tracked) = self.texts.get(&text_id) else { return };

        let mut writes = Vec::new();
        for placement in tracked.placements.iter().skip(start_char).take(end_char.saturating_sub(start_char)) {
            writes.extend(pixel_writes_for_glyph(&placement.glyph, placement.x, placement.y, fg_slot));
        }

        let (packets, mut new_tiles) = self.apply_writes(&writes);
        for packet in packets {
            self.push(packet);
        }
        if let Some(tracked) = self.texts.get_mut(&text_id) {
            tracked.tiles.append(&mut new_tiles);
            tracked.tiles.sort_unstable();
            tracked.tiles.dedup();
        }
    }

    fn handle_remove_text(&mut self, text_id: u64) {
        let Some(tracked) = self.texts.remove(&text_id) else { return };
        let background = self.background_slot as u8;
        for &(tile_x, tile_y) in &tracked.tiles {
            let packet = tile::clear_tile(&mut self.vram, tile_x, tile_y, background);
            self.push(packet);
        }
    }

    /// Groups pixel writes by the tile they land in (row-major order),
    /// overlays each tile's current content with the writes, and encodes
    /// the diff through C4.
    fn apply_writes(&mut self, writes: &[(usize, usize, u8)]) -> (Vec<Packet>, Vec<(usize, usize)>) {
        let mut by_tile: BTreeMap<(usize, usize), Vec<(usize, usize, u8)>> = BTreeMap::new();
        for &(x, y, c) in writes {
            let tile_x = x / TILE_WIDTH;
            let tile_y = y / TILE_HEIGHT;
            if tile_x < BLOCKS_X && tile_y < BLOCKS_Y {
                by_tile.entry((tile_y, tile_x)).or_default().push((x, y, c));
            }
        }

        let mut packets = Vec::new();
        let mut tiles = Vec::new();
        for ((tile_y, tile_x), tile_writes) in by_tile {
            let mut target = self.vram.read_block(tile_x, tile_y);
            for (x, y, c) in tile_writes {
                let local_x = x - tile_x * TILE_WIDTH;
                let local_y = y - tile_y * TILE_HEIGHT;
                target[local_y][local_x] = c;
            }
            packets.extend(tile::encode_tile(&mut self.vram, tile_x, tile_y, &target, None));
            tiles.push((tile_x, tile_y));
        }
        (packets, tiles)
    }
}
