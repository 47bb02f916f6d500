//! Palette manager (C6): leases 16 palette slots to logical colors over
//! packet-indexed time ranges and tracks which half of the table needs a
//! `LOAD_COLOR_LOW`/`LOAD_COLOR_HIGH` flush.

use crate::packet::{Instruction, Packet};
use crate::render::color::{default_palette, pack_load_data, Rgb12};
use crate::render::PALETTE_SIZE;

const LOWER_HALF: std::ops::Range<usize> = 0..8;
const UPPER_HALF: std::ops::Range<usize> = 8..16;

#[derive(Debug, Clone)]
struct Lease {
    start_packet: u64,
    end_packet: Option<u64>,
    color: Rgb12,
    #[allow(dead_code)]
    label: String,
}

impl Lease {
    fn active_at(&self, packet: u64) -> bool {
        self.start_packet <= packet && self.end_packet.is_none_or(|end| packet < end)
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    leases: Vec<Lease>,
}

impl Slot {
    fn active(&self, packet: u64) -> Option<&Lease> {
        self.leases.iter().rev().find(|l| l.active_at(packet))
    }
}

pub struct PaletteManager {
    slots: [Slot; PALETTE_SIZE],
    /// The color shown in a slot before any lease has ever claimed it.
    default_colors: [Rgb12; PALETTE_SIZE],
    current_packet: u64,
    lower_dirty: bool,
    upper_dirty: bool,
}

impl Default for PaletteManager {
    fn default() -> Self {
        let mut default_colors = [Rgb12::default(); PALETTE_SIZE];
        default_colors.copy_from_slice(&default_palette());
        Self {
            slots: Default::default(),
            default_colors,
            current_packet: 0,
            lower_dirty: true,
            upper_dirty: true,
        }
    }
}

impl PaletteManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_to(&mut self, packet: u64) {
        self.current_packet = self.current_packet.max(packet);
    }

    #[must_use]
    pub fn current_packet(&self) -> u64 {
        self.current_packet
    }

    #[must_use]
    pub fn color_in_slot(&self, slot: usize) -> Rgb12 {
        self.slots[slot]
            .active(self.current_packet)
            .map_or(self.default_colors[slot], |l| l.color)
    }

    /// Leases a slot for `color`, preferring `preferred_slot` if given,
    /// otherwise reusing a slot that already shows `color`, otherwise
    /// allocating fresh per the persistent/bounded split. Returns `None`
    /// (PaletteExhausted, §7) if no slot can satisfy the request.
    pub fn lease(&mut self, color: Rgb12, duration_packets: Option<u64>, label: &str, preferred_slot: Option<usize>) -> Option<usize> {
        let start = self.current_packet;
        let end = duration_packets.map(|d| start + d);

        if let Some(slot) = preferred_slot {
            let reusable = self.slots[slot].active(start).is_none_or(|l| l.color == color);
            if reusable {
                self.assign(slot, color, start, end, label);
                return Some(slot);
            }
        }

        if let Some(slot) = (0..PALETTE_SIZE).find(|&i| {
            self.slots[i]
                .active(start)
                .is_some_and(|l| l.color == color && l.end_packet.is_none_or(|e| e >= end.unwrap_or(u64::MAX)))
        }) {
            self.assign(slot, color, start, end, label);
            return Some(slot);
        }

        let halves: [std::ops::Range<usize>; 2] = if duration_packets.is_none() {
            [LOWER_HALF, UPPER_HALF]
        } else {
            [UPPER_HALF, LOWER_HALF]
        };

        for half in halves {
            if let Some(slot) = half.clone().find(|&i| self.slots[i].active(start).is_none()) {
                self.assign(slot, color, start, end, label);
                return Some(slot);
            }
        }

        None
    }

    fn assign(&mut self, slot: usize, color: Rgb12, start: u64, end: Option<u64>, label: &str) {
        let changed = self.color_in_slot(slot) != color;
        self.slots[slot].leases.push(Lease {
            start_packet: start,
            end_packet: end,
            color,
            label: label.to_string(),
        });
        if changed {
            if LOWER_HALF.contains(&slot) {
                self.lower_dirty = true;
            } else {
                self.upper_dirty = true;
            }
        }
    }

    /// Returns the `LOAD_COLOR_LOW`/`HIGH` packets needed to materialize
    /// any dirty half of the table, resetting the dirty marks.
    pub fn get_pending_load_packets(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        if self.lower_dirty {
            let colors = self.half_colors(LOWER_HALF);
            packets.push(Packet::new(Instruction::LoadColorLow, pack_load_data(colors)));
            self.lower_dirty = false;
        }
        if self.upper_dirty {
            let colors = self.half_colors(UPPER_HALF);
            packets.push(Packet::new(Instruction::LoadColorHigh, pack_load_data(colors)));
            self.upper_dirty = false;
        }
        packets
    }

    fn half_colors(&self, half: std::ops::Range<usize>) -> [Rgb12; 8] {
        let mut colors = [Rgb12::default(); 8];
        for (out, slot) in half.enumerate() {
            colors[out] = self.color_in_slot(slot);
        }
        colors
    }

    /// True iff, at every packet index, each slot has at most one active
    /// lease (true by construction; exposed for property tests).
    #[must_use]
    pub fn no_overlaps_at(&self, packet: u64) -> bool {
        self.slots.iter().all(|slot| slot.leases.iter().filter(|l| l.active_at(packet)).count() <= 1)
    }
}
