//! Core domain types
//!
//! Defines the vocabulary shared by every component:
//! - Box identity and color
//! - Placement tags recorded in the experiment log
//! - Trigger areas reported by the host scene
//! - Experiment condition and end-of-shift answers

use crate::error::ParseTagError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Session-scoped box identifier, assigned monotonically at spawn time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoxId(pub u32);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BoxId {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(BoxId)
            .map_err(|_| ParseTagError::new("box id", s))
    }
}

/// Box color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxColor {
    Green,
    Blue,
    Red,
    AmbiguousCyan,
    AmbiguousPink,
    AmbiguousPurple,
}

impl BoxColor {
    /// Colors with a matching bin
    pub const PLAIN: [BoxColor; 3] = [BoxColor::Blue, BoxColor::Red, BoxColor::Green];

    /// Colors without a matching bin
    pub const AMBIGUOUS: [BoxColor; 3] = [
        BoxColor::AmbiguousCyan,
        BoxColor::AmbiguousPink,
        BoxColor::AmbiguousPurple,
    ];

    #[inline]
    #[must_use]
    pub fn is_ambiguous(self) -> bool {
        matches!(
            self,
            BoxColor::AmbiguousCyan | BoxColor::AmbiguousPink | BoxColor::AmbiguousPurple
        )
    }

    /// Bin this color belongs in, if any
    #[inline]
    #[must_use]
    pub fn target_area(self) -> Option<Area> {
        match self {
            BoxColor::Green => Some(Area::GreenBin),
            BoxColor::Blue => Some(Area::BlueBin),
            BoxColor::Red => Some(Area::RedBin),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BoxColor::Green => "Green",
            BoxColor::Blue => "Blue",
            BoxColor::Red => "Red",
            BoxColor::AmbiguousCyan => "AmbiguousCyan",
            BoxColor::AmbiguousPink => "AmbiguousPink",
            BoxColor::AmbiguousPurple => "AmbiguousPurple",
        }
    }
}

impl fmt::Display for BoxColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoxColor {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(BoxColor::Green),
            "blue" => Ok(BoxColor::Blue),
            "red" => Ok(BoxColor::Red),
            "cyan" | "ambiguouscyan" => Ok(BoxColor::AmbiguousCyan),
            "pink" | "ambiguouspink" => Ok(BoxColor::AmbiguousPink),
            "purple" | "ambiguouspurple" => Ok(BoxColor::AmbiguousPurple),
            _ => Err(ParseTagError::new("color", s)),
        }
    }
}

/// Placement tag as written to the placement history
///
/// `final_placement` only ever holds the first eight variants.
/// `CompressorWithoutButton` and `SomewhereElse` appear in the history only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Placement {
    GreenBin,
    BlueBin,
    RedBin,
    Compressor,
    YellowDrawer,
    Table,
    Floor,
    #[default]
    Other,
    /// Box left resting in the compressor without the button being pressed
    CompressorWithoutButton,
    /// Box never entered any tracked area
    SomewhereElse,
}

impl Placement {
    /// Placements the next-box cycle treats as terminal
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Placement::GreenBin
                | Placement::BlueBin
                | Placement::RedBin
                | Placement::Floor
                | Placement::Table
                | Placement::YellowDrawer
                | Placement::Compressor
        )
    }

    /// Colored bins counted by the sorted-cart counter
    #[inline]
    #[must_use]
    pub fn is_color_bin(self) -> bool {
        matches!(
            self,
            Placement::GreenBin | Placement::BlueBin | Placement::RedBin
        )
    }

    /// Unresolved placements (no terminal location recorded)
    #[inline]
    #[must_use]
    pub fn is_unresolved(self) -> bool {
        matches!(self, Placement::Other | Placement::SomewhereElse)
    }

    /// Whether a history entry tagged `logged` already records this placement.
    ///
    /// A box resting in the compressor is logged as `CompressorWithoutButton`,
    /// so both tags count as the same location.
    #[inline]
    #[must_use]
    pub fn matches_logged(self, logged: Placement) -> bool {
        logged == self
            || (self == Placement::Compressor && logged == Placement::CompressorWithoutButton)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Placement::GreenBin => "GreenBin",
            Placement::BlueBin => "BlueBin",
            Placement::RedBin => "RedBin",
            Placement::Compressor => "Compressor",
            Placement::YellowDrawer => "YellowDrawer",
            Placement::Table => "Table",
            Placement::Floor => "Floor",
            Placement::Other => "Other",
            Placement::CompressorWithoutButton => "CompressorWithoutButton",
            Placement::SomewhereElse => "SomewhereElse",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trigger area reported by the host scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Area {
    GreenBin,
    BlueBin,
    RedBin,
    Compressor,
    YellowDrawer,
    Table,
    Floor,
}

impl Area {
    pub const ALL: [Area; 7] = [
        Area::GreenBin,
        Area::BlueBin,
        Area::RedBin,
        Area::Compressor,
        Area::YellowDrawer,
        Area::Table,
        Area::Floor,
    ];

    #[must_use]
    pub fn placement(self) -> Placement {
        match self {
            Area::GreenBin => Placement::GreenBin,
            Area::BlueBin => Placement::BlueBin,
            Area::RedBin => Placement::RedBin,
            Area::Compressor => Placement::Compressor,
            Area::YellowDrawer => Placement::YellowDrawer,
            Area::Table => Placement::Table,
            Area::Floor => Placement::Floor,
        }
    }

    /// Boxes finalized in this area are removed from the scene
    #[inline]
    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            Area::GreenBin | Area::BlueBin | Area::RedBin | Area::Compressor
        )
    }

    /// Whether `color` is correctly sorted when it lands here
    #[inline]
    #[must_use]
    pub fn accepts(self, color: BoxColor) -> bool {
        matches!(
            (self, color),
            (Area::GreenBin, BoxColor::Green)
                | (Area::BlueBin, BoxColor::Blue)
                | (Area::RedBin, BoxColor::Red)
        )
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placement().as_str())
    }
}

impl FromStr for Area {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" | "greenbin" => Ok(Area::GreenBin),
            "blue" | "bluebin" => Ok(Area::BlueBin),
            "red" | "redbin" => Ok(Area::RedBin),
            "compressor" => Ok(Area::Compressor),
            "drawer" | "yellowdrawer" => Ok(Area::YellowDrawer),
            "table" | "tablearea" => Ok(Area::Table),
            "floor" => Ok(Area::Floor),
            _ => Err(ParseTagError::new("area", s)),
        }
    }
}

/// Robot behavior condition of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Condition {
    /// Robot hands boxes to the participant
    Cooperation,
    /// Robot works on an unrelated task nearby
    #[default]
    Coexistence,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Cooperation => f.write_str("Cooperation"),
            Condition::Coexistence => f.write_str("Coexistence"),
        }
    }
}

impl FromStr for Condition {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cooperation" => Ok(Condition::Cooperation),
            "coexistence" => Ok(Condition::Coexistence),
            _ => Err(ParseTagError::new("condition", s)),
        }
    }
}

/// Participant's answer to the leftover-boxes question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Agree,
    Disagree,
}

impl Answer {
    #[inline]
    #[must_use]
    pub fn from_yes(yes: bool) -> Self {
        if yes {
            Answer::Agree
        } else {
            Answer::Disagree
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Agree => "Agree",
            Answer::Disagree => "Disagree",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
