//! Inbound events and outbound commands
//!
//! The host reports what happened in the scene as [`Event`]s and executes the
//! [`Command`]s the core returns.

use crate::error::ParseTagError;
use crate::prompt::ClipId;
use crate::types::{Answer, Area, BoxColor, BoxId};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Something the host observed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    BoxPickedUp(BoxId),
    BoxEnteredArea { id: BoxId, area: Area },
    BoxExitedArea { id: BoxId, area: Area },
    NextBoxPressed,
    CompressorButtonPressed,
    /// Reported separately by hosts that track ambiguous pickups themselves
    AmbiguousBoxPicked(BoxId),
    Answered(Answer),
}

impl FromStr for Event {
    type Err = ParseTagError;

    /// Parse a driver line such as `pickup 3`, `enter 3 red` or `yes`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let event = match words.as_slice() {
            ["next"] => Event::NextBoxPressed,
            ["compressor"] => Event::CompressorButtonPressed,
            ["yes"] => Event::Answered(Answer::Agree),
            ["no"] => Event::Answered(Answer::Disagree),
            ["pickup", id] => Event::BoxPickedUp(id.parse()?),
            ["ambiguous", id] => Event::AmbiguousBoxPicked(id.parse()?),
            ["enter", id, area] => Event::BoxEnteredArea {
                id: id.parse()?,
                area: area.parse()?,
            },
            ["exit", id, area] => Event::BoxExitedArea {
                id: id.parse()?,
                area: area.parse()?,
            },
            _ => return Err(ParseTagError::new("event", line)),
        };
        Ok(event)
    }
}

/// How long a prompt stays up
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PromptDisplay {
    /// Hidden automatically after this many seconds
    Timed(f64),
    /// Stays until the participant answers yes or no
    Blocking,
}

/// Something the host must do
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    ShowPrompt {
        text: String,
        display: PromptDisplay,
        clip: Option<ClipId>,
    },
    HidePrompt,
    PlayClip(ClipId),
    SpawnBox { id: BoxId, color: BoxColor },
    DestroyBox(BoxId),
    /// Boxes sorted into a colored bin so far
    SortedCount(usize),
    EndSession,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ShowPrompt {
                text,
                display: PromptDisplay::Timed(secs),
                ..
            } => write!(f, "show ({secs:.1}s): {text}"),
            Command::ShowPrompt {
                text,
                display: PromptDisplay::Blocking,
                ..
            } => write!(f, "ask (yes/no): {text}"),
            Command::HidePrompt => f.write_str("hide prompt"),
            Command::PlayClip(clip) => write!(f, "play {clip}"),
            Command::SpawnBox { id, color } => write!(f, "spawn box {id} ({color})"),
            Command::DestroyBox(id) => write!(f, "destroy box {id}"),
            Command::SortedCount(count) => write!(f, "sorted {count}"),
            Command::EndSession => f.write_str("end session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_driver_lines() {
        assert_eq!("next".parse::<Event>().unwrap(), Event::NextBoxPressed);
        assert_eq!(
            "pickup 3".parse::<Event>().unwrap(),
            Event::BoxPickedUp(BoxId(3))
        );
        assert_eq!(
            "enter 3 red".parse::<Event>().unwrap(),
            Event::BoxEnteredArea {
                id: BoxId(3),
                area: Area::RedBin
            }
        );
        assert_eq!(
            "exit 2 table".parse::<Event>().unwrap(),
            Event::BoxExitedArea {
                id: BoxId(2),
                area: Area::Table
            }
        );
        assert_eq!(
            "no".parse::<Event>().unwrap(),
            Event::Answered(Answer::Disagree)
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!("enter x red".parse::<Event>().is_err());
        assert!("enter 1 attic".parse::<Event>().is_err());
        assert!("dance".parse::<Event>().is_err());
    }
}
