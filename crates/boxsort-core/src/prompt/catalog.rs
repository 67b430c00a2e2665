//! Prompt texts, audio clip ids and display timing

use crate::types::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-side audio clip identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line the robot can say, with an optional voice clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptLine {
    pub text: String,
    #[serde(default)]
    pub clip: Option<ClipId>,
}

impl PromptLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clip: None,
        }
    }

    #[must_use]
    pub fn with_clip(mut self, clip: impl Into<String>) -> Self {
        self.clip = Some(ClipId::new(clip));
        self
    }
}

/// Every text the robot can display during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptCatalog {
    /// Suggestions for ambiguous boxes, shown in order and cycled by count
    pub ambiguous: Vec<PromptLine>,
    /// Encouragement shown after a correctly sorted cycle
    pub positive: Vec<PromptLine>,
    pub cooperation_start: PromptLine,
    pub coexistence_start: PromptLine,
    /// Announces that all boxes were handed out
    pub pre_end_shift: PromptLine,
    /// Farewell shown right before the session ends
    pub end_shift: PromptLine,
    /// Yes/no question about the boxes left in the scene
    pub discard_leftovers: PromptLine,
    /// Played when the next-box button is accepted
    pub next_button_clip: Option<ClipId>,
    /// Played when the compressor button is accepted
    pub compressor_clip: Option<ClipId>,
}

impl PromptCatalog {
    #[must_use]
    pub fn start_message(&self, condition: Condition) -> &PromptLine {
        match condition {
            Condition::Cooperation => &self.cooperation_start,
            Condition::Coexistence => &self.coexistence_start,
        }
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            ambiguous: vec![
                PromptLine::new("I would put this box on the table behind you for now.")
                    .with_clip("ambiguous_table"),
                PromptLine::new(
                    "I would hide this box in that yellow cabin next to the table.",
                )
                .with_clip("ambiguous_drawer"),
                PromptLine::new(
                    "I would throw this box in the green compressor next to the table \
                     and push the button to get rid of it.",
                )
                .with_clip("ambiguous_compressor"),
            ],
            positive: vec![
                PromptLine::new("You\u{2019}re doing well\u{2014}keep going.").with_clip("positive_0"),
                PromptLine::new("Nice work so far.").with_clip("positive_1"),
                PromptLine::new("You\u{2019}ve got this.").with_clip("positive_2"),
                PromptLine::new("Good job, keep it up.").with_clip("positive_3"),
                PromptLine::new("You\u{2019}re doing a good job.").with_clip("positive_4"),
                PromptLine::new("Looking good so far, keep it up.").with_clip("positive_5"),
            ],
            cooperation_start: PromptLine::new(
                "Hello. I am a warehouse robot. I am here to help you with sorting the boxes.",
            )
            .with_clip("start_cooperation"),
            coexistence_start: PromptLine::new(
                "Hello. I am a warehouse robot. I will be over here working in this area.",
            )
            .with_clip("start_coexistence"),
            pre_end_shift: PromptLine::new(
                "That was all the boxes we were supposed to sort today.",
            )
            .with_clip("pre_end_shift"),
            end_shift: PromptLine::new(
                "The shift is now over. Thank you for your participation.",
            )
            .with_clip("end_shift"),
            discard_leftovers: PromptLine::new(
                "We should throw the remaining boxes in the compressor.",
            )
            .with_clip("discard_leftovers"),
            next_button_clip: Some(ClipId::new("button_click")),
            compressor_clip: Some(ClipId::new("compressor_move")),
        }
    }
}

/// Display duration parameters, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTiming {
    pub base_display_time: f64,
    pub per_character_time: f64,
    /// Length multiplier applied to the start message
    pub start_multiplier: f64,
    /// Delay between session start and the start message
    pub start_delay: f64,
    /// Fixed duration of ambiguous-box suggestions
    pub ambiguous_duration: f64,
    /// Duration of the pre-end and farewell messages
    pub end_message_duration: f64,
}

impl PromptTiming {
    /// `base + per_character * chars * multiplier`
    #[must_use]
    pub fn duration_for(&self, text: &str, multiplier: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let chars = text.chars().count() as f64;
        self.base_display_time + self.per_character_time * chars * multiplier
    }

    /// Iterate over every field as `(name, value)`, for validation
    pub(crate) fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("base_display_time", self.base_display_time),
            ("per_character_time", self.per_character_time),
            ("start_multiplier", self.start_multiplier),
            ("start_delay", self.start_delay),
            ("ambiguous_duration", self.ambiguous_duration),
            ("end_message_duration", self.end_message_duration),
        ]
    }
}

impl Default for PromptTiming {
    fn default() -> Self {
        Self {
            base_display_time: 1.0,
            per_character_time: 0.03,
            start_multiplier: 2.5,
            start_delay: 2.0,
            ambiguous_duration: 6.0,
            end_message_duration: 5.0,
        }
    }
}
