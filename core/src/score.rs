//! Score data model (§3): the timestamped lyric input consumed by the
//! presentation compiler.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Syllable {
    pub start_ms: u64,
    pub end_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Word {
    pub start_ms: u64,
    pub syllables: Vec<Syllable>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Line {
    pub text: String,
    pub start_ms: u64,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Score {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub credit: Option<String>,
    pub lines: Vec<Line>,
}

impl Score {
    /// Enforces the one validation boundary of §3: syllable start times
    /// within a word must be monotonically non-decreasing, and no
    /// timestamp may be negative (unrepresentable here, so this also
    /// rejects an end time earlier than its start).
    pub fn validate(&self) -> Result<(), Error> {
        for (line_idx, line) in self.lines.iter().enumerate() {
            for (word_idx, word) in line.words.iter().enumerate() {
                let mut last_start = None;
                for syllable in &word.syllables {
                    if let Some(last) = last_start {
                        if syllable.start_ms < last {
                            return Err(Error::InvalidScore(format!(
                                "line {line_idx} word {word_idx}: syllable start {} precedes prior syllable start {last}",
                                syllable.start_ms
                            )));
                        }
                    }
                    if let Some(end) = syllable.end_ms {
                        if end < syllable.start_ms {
                            return Err(Error::InvalidScore(format!(
                                "line {line_idx} word {word_idx}: syllable end {end} precedes its own start {}",
                                syllable.start_ms
                            )));
                        }
                    }
                    last_start = Some(syllable.start_ms);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn word(starts: &[u64]) -> Word {
        Word {
            start_ms: starts.first().copied().unwrap_or(0),
            syllables: starts.iter().map(|&s| Syllable { start_ms: s, end_ms: None }).collect(),
        }
    }

    #[test]
    fn monotone_syllables_validate() {
        let score = Score {
            lines: vec![Line { text: "hi".into(), start_ms: 0, words: vec![word(&[100, 200, 300])] }],
            ..Default::default()
        };
        assert!(score.validate().is_ok());
    }

    #[test]
    fn regressing_syllable_start_is_rejected() {
        let score = Score {
            lines: vec![Line { text: "hi".into(), start_ms: 0, words: vec![word(&[200, 100])] }],
            ..Default::default()
        };
        let err = score.validate().unwrap_err();
        assert_eq!(matches!(err, Error::InvalidScore(_)), true);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let score = Score {
            lines: vec![Line {
                text: "hi".into(),
                start_ms: 0,
                words: vec![Word { start_ms: 0, syllables: vec![Syllable { start_ms: 500, end_ms: Some(100) }] }],
            }],
            ..Default::default()
        };
        assert!(score.validate().is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{"title":"Song","lines":[{"text":"la","start_ms":0,"words":[{"start_ms":0,"syllables":[{"start_ms":0,"end_ms":500}]}]}]}"#;
        let score: Score = serde_json::from_str(json).unwrap();
        assert_eq!(score.lines.len(), 1);
        assert_eq!(score.lines[0].words[0].syllables[0].end_ms, Some(500));
    }
}
