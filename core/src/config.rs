//! Render configuration (§6.2).

use serde::{Deserialize, Serialize};

use crate::render::color::Rgb12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreludeMode {
    Synthesize,
    CopyReference,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub font_family: Option<String>,
    pub font_size: u32,
    pub pps: u32,
    pub background_color: Rgb12,
    pub active_color: Rgb12,
    pub transition_color: Rgb12,
    pub prelude_mode: PreludeMode,
    pub reference_cdg_path: Option<String>,
    /// Lead-in before a line's first highlight, default 1000ms (§4.7).
    pub lead_in_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        use crate::render::color::rgb_to_cdg;
        Self {
            font_family: None,
            font_size: 16,
            pps: 300,
            background_color: rgb_to_cdg(0, 0, 0),
            active_color: rgb_to_cdg(255, 255, 0),
            transition_color: rgb_to_cdg(255, 255, 255),
            prelude_mode: PreludeMode::Synthesize,
            reference_cdg_path: None,
            lead_in_ms: 1000,
        }
    }
}
