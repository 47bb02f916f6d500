//! Pure rendering engine: compiles a scored song into a CD+G packet
//! stream. No I/O; the `cdgen` binary owns file access and CLI parsing.

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

pub mod compiler;
pub mod config;
pub mod error;
pub mod lease;
pub mod packet;
pub mod prelude;
pub mod render;
pub mod score;
pub mod scheduler;
pub mod writer;

use config::Config;
use error::Error;
use scheduler::Scheduler;
use score::Score;

/// Renders a validated score to a complete CD+G byte stream (§6.3).
/// `duration_ms` bounds the output length; `InvalidScore` is the only
/// fatal error (§7) — everything else is recovered and logged.
pub fn render_to_bytes(score: &Score, config: &Config, duration_ms: u64) -> Result<Vec<u8>, Error> {
    score.validate()?;

    let commands = compiler::compile(score, config.lead_in_ms);
    let mut scheduler = Scheduler::new(config, duration_ms);
    scheduler.run_prelude(config);
    let packets = scheduler.run(&commands, duration_ms);
    Ok(writer::packets_to_bytes(&packets))
}

/// Renders a validated score, handing each packet-chunk to `sink` as it
/// becomes available, per the incremental mode of §5. This reference
/// implementation renders the whole stream up front and chunks it on
/// the way out; a streaming scheduler would yield mid-flight instead.
pub fn render_incremental(score: &Score, config: &Config, duration_ms: u64, chunk_packets: usize, mut sink: impl FnMut(&[u8])) -> Result<(), Error> {
    let bytes = render_to_bytes(score, config, duration_ms)?;
    let chunk_bytes = chunk_packets.max(1) * 24;
    for chunk in bytes.chunks(chunk_bytes) {
        sink(chunk);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_score_produces_prelude_plus_padding() {
        let score = Score::default();
        let bytes = render_to_bytes(&score, &Config::default(), 1000).unwrap();
        assert_eq!(bytes.len(), 300 * 24);
        assert_eq!(bytes[0], packet::SUBCHANNEL_COMMAND);
        assert_eq!(bytes[1], 30);
        assert_eq!(bytes[24 + 1], 31);
        assert_eq!(bytes[48 + 1], 2);
        for i in 3..19 {
            assert_eq!(bytes[i * 24 + 1], 1);
        }
    }

    #[test]
    fn invalid_score_is_rejected_before_any_rendering() {
        let score = Score {
            lines: vec![score::Line {
                text: "x".into(),
                start_ms: 0,
                words: vec![score::Word {
                    start_ms: 0,
                    syllables: vec![
                        score::Syllable { start_ms: 200, end_ms: None },
                        score::Syllable { start_ms: 100, end_ms: None },
                    ],
                }],
            }],
            ..Default::default()
        };
        let result = render_to_bytes(&score, &Config::default(), 1000);
        assert!(matches!(result, Err(Error::InvalidScore(_))));
    }

    #[test]
    fn incremental_rendering_yields_byte_identical_chunks() {
        let score = Score::default();
        let config = Config::default();
        let whole = render_to_bytes(&score, &config, 1000).unwrap();

        let mut reassembled = Vec::new();
        render_incremental(&score, &config, 1000, 10, |chunk| reassembled.extend_from_slice(chunk)).unwrap();
        assert_eq!(whole, reassembled);
    }
}
