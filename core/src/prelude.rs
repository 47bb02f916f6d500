//! Prelude builder (C9): the deterministic initialization sequence
//! emitted before any score-driven commands.

use crate::lease::palette::PaletteManager;
use crate::packet::{Instruction, Packet};

const SIGNATURE: &[u8] = b"cdgen-core";

fn memory_preset(color_index: u8, repeat: u8, signature: Option<&[u8]>) -> Packet {
    let mut data = [0u8; 16];
    data[0] = color_index & 0x0F;
    data[1] = repeat & 0x0F;
    if let Some(signature) = signature {
        for (slot, &byte) in data[2..16].iter_mut().zip(signature) {
            *slot = byte.wrapping_sub(0x20) & 0x3F;
        }
    }
    Packet::new(Instruction::MemoryPreset, data)
}

/// Builds the synthesized prelude: palette load, border, then 16
/// memory-preset packets (the second 8 carrying an ASCII signature).
#[must_use]
pub fn synthesize(palette: &mut PaletteManager, background_slot: usize) -> Vec<Packet> {
    let mut packets = palette.get_pending_load_packets();

    let mut border_data = [0u8; 16];
    border_data[0] = (background_slot as u8) & 0x0F;
    packets.push(Packet::new(Instruction::BorderPreset, border_data));

    for repeat in 0u8..8 {
        packets.push(memory_preset(background_slot as u8, repeat, None));
    }
    for repeat in 0u8..8 {
        packets.push(memory_preset(background_slot as u8, repeat, Some(SIGNATURE)));
    }

    packets
}

/// Copies a reference stream's leading palette/border/memory-preset
/// packets verbatim, per §4.9's optional path. Returns `None` if the
/// bytes cannot be parsed as a CD+G stream (`ReferencePreludeUnreadable`,
/// §7 — caller falls back to `synthesize`).
#[must_use]
pub fn copy_reference(bytes: &[u8]) -> Option<Vec<Packet>> {
    if bytes.len() % 24 != 0 {
        return None;
    }

    let mut packets = Vec::new();
    for chunk in bytes.chunks_exact(24) {
        let mut record = [0u8; 24];
        record.copy_from_slice(chunk);
        let packet = Packet::from_bytes(&record)?;
        if !packet.is_prelude_kind() {
            break;
        }
        packets.push(packet);
    }
    Some(packets)
}
