//! File writer (C10): concatenates packets in emission order with no
//! framing or header.

use std::io::Write;

use crate::error::Error;
use crate::packet::Packet;

#[must_use]
pub fn packets_to_bytes(packets: &[Packet]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(packets.len() * 24);
    for packet in packets {
        bytes.extend_from_slice(&packet.to_bytes());
    }
    bytes
}

pub fn write_to_path(packets: &[Packet], path: &std::path::Path) -> Result<(), Error> {
    let bytes = packets_to_bytes(packets);
    let mut file = std::fs::File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}
