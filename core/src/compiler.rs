//! Presentation compiler (C7): turns a scored song into a totally
//! ordered list of presentation commands.

use crate::lease::line::LineLeaseAllocator;
use crate::render::color::LogicalColor;
use crate::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    ClearScreen { color: LogicalColor },
    ShowText { text_id: u64, text: String, position: Position, color: LogicalColor, align: Align },
    ChangeColor { text_id: u64, start_char: usize, end_char: usize, color: LogicalColor },
    RemoveText { text_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationCommand {
    pub timestamp_ms: u64,
    pub kind: CommandKind,
}

impl PresentationCommand {
    /// Ordering priority at identical timestamps (§4.7's closing
    /// paragraph): `clear_screen < show_metadata < show_text <
    /// change_color < transition < remove_text`. `show_metadata` lowers
    /// to `show_text` before this point, so it shares that rank.
    fn priority(&self) -> u8 {
        match self.kind {
            CommandKind::ClearScreen { .. } => 0,
            CommandKind::ShowText { .. } => 1,
            CommandKind::ChangeColor { .. } => 2,
            CommandKind::RemoveText { .. } => 3,
        }
    }
}

fn cmp_commands(a: &PresentationCommand, b: &PresentationCommand) -> std::cmp::Ordering {
    a.timestamp_ms.cmp(&b.timestamp_ms).then(a.priority().cmp(&b.priority()))
}

/// Compiles a validated `Score` into the ordered command stream C8 will
/// execute. Assumes `score.validate()` already passed.
#[must_use]
pub fn compile(score: &Score, lead_in_ms: u64) -> Vec<PresentationCommand> {
    let mut commands = Vec::new();
    let mut next_text_id = 0u64;
    let mut line_positions = LineLeaseAllocator::default();

    let line_highlights: Vec<(u64, u64)> = score
        .lines
        .iter()
        .map(|line| {
            let starts = line.words.iter().flat_map(|w| w.syllables.iter().map(|s| s.start_ms));
            let ends = line.words.iter().flat_map(|w| w.syllables.iter().map(|s| s.end_ms.unwrap_or(s.start_ms)));
            let highlight_start = starts.min().unwrap_or(line.start_ms);
            let highlight_end = ends.max().unwrap_or(line.start_ms);
            (highlight_start, highlight_end)
        })
        .collect();

    if let Some(title) = &score.title {
        let first_highlight = line_highlights.first().map_or(0, |&(start, _)| start);
        let remove_at = (first_highlight.saturating_sub(500)).max(500);
        let text_id = next_text_id;
        next_text_id += 1;
        commands.push(PresentationCommand {
            timestamp_ms: 0,
            kind: CommandKind::ShowText {
                text_id,
                text: title.clone(),
                position: Position { x: 500, y: 400 },
                color: LogicalColor::TransitionText,
                align: Align::Center,
            },
        });
        commands.push(PresentationCommand { timestamp_ms: remove_at, kind: CommandKind::RemoveText { text_id } });

        if let Some(artist) = &score.artist {
            let text_id = next_text_id;
            next_text_id += 1;
            commands.push(PresentationCommand {
                timestamp_ms: 0,
                kind: CommandKind::ShowText {
                    text_id,
                    text: artist.clone(),
                    position: Position { x: 500, y: 500 },
                    color: LogicalColor::TransitionText,
                    align: Align::Center,
                },
            });
            commands.push(PresentationCommand { timestamp_ms: remove_at, kind: CommandKind::RemoveText { text_id } });
        }
    }

    for (idx, line) in score.lines.iter().enumerate() {
        let (highlight_start, highlight_end) = line_highlights[idx];
        let show_time = highlight_start.saturating_sub(lead_in_ms);

        let hide_time = if let Some((next_start, _)) = line_highlights.get(idx + 1) {
            let next_show_time = next_start.saturating_sub(lead_in_ms);
            (highlight_end + 300).max(next_show_time.saturating_sub(100)).min(highlight_end + 1500)
        } else {
            highlight_end + 2000
        };

        let text_id = next_text_id;
        next_text_id += 1;

        // Each line claims one of the pool's abstract Y rows for its
        // visible window, so lines that are co-visible (the common case
        // given the show/hide timing above) land on distinct rows
        // instead of overwriting one another.
        let y = line_positions.lease(text_id, show_time as i64, hide_time as i64);

        commands.push(PresentationCommand {
            timestamp_ms: show_time,
            kind: CommandKind::ShowText {
                text_id,
                text: line.text.clone(),
                position: Position { x: 500, y },
                color: LogicalColor::TransitionText,
                align: Align::Center,
            },
        });

        // Syllables carry no text of their own (§3), so the line's
        // characters are divided evenly across them in order, remainder
        // going to the earlier syllables.
        let char_count = line.text.chars().count();
        let syllable_count = line.words.iter().map(|w| w.syllables.len()).sum::<usize>().max(1);
        let base_len = char_count / syllable_count;
        let remainder = char_count % syllable_count;

        let mut char_offset = 0usize;
        let mut syllable_idx = 0usize;
        for word in &line.words {
            for syllable in &word.syllables {
                let len = base_len + usize::from(syllable_idx < remainder);
                commands.push(PresentationCommand {
                    timestamp_ms: syllable.start_ms,
                    kind: CommandKind::ChangeColor {
                        text_id,
                        start_char: char_offset,
                        end_char: char_offset + len,
                        color: LogicalColor::ActiveText,
                    },
                });
                char_offset += len;
                syllable_idx += 1;
            }
        }

        commands.push(PresentationCommand { timestamp_ms: hide_time, kind: CommandKind::RemoveText { text_id } });
    }

    if let Some(credit) = &score.credit {
        let last_hide = commands
            .iter()
            .filter(|c| matches!(c.kind, CommandKind::RemoveText { .. }))
            .map(|c| c.timestamp_ms)
            .max()
            .unwrap_or(0);
        let text_id = next_text_id;
        commands.push(PresentationCommand {
            timestamp_ms: last_hide,
            kind: CommandKind::ShowText {
                text_id,
                text: credit.clone(),
                position: Position { x: 500, y: 500 },
                color: LogicalColor::TransitionText,
                align: Align::Center,
            },
        });
        commands.push(PresentationCommand { timestamp_ms: last_hide + 2000, kind: CommandKind::RemoveText { text_id } });
    }

    commands.sort_by(cmp_commands);
    commands
}
