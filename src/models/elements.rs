//! Element types and enumerations for numeric notation
//!
//! A measure is a flat array of [`Element`]s. The variants are a tagged union
//! keyed by the `type` field so that documents round-trip through JSON in a
//! single pass and position-indexed arrays stay uniform.

use serde::{Deserialize, Serialize};

/// Scale degree of a note (1-7 in numeric notation)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Degree {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
}

impl Degree {
    /// Parse a degree from its digit ("1".."7")
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "1" => Some(Degree::One),
            "2" => Some(Degree::Two),
            "3" => Some(Degree::Three),
            "4" => Some(Degree::Four),
            "5" => Some(Degree::Five),
            "6" => Some(Degree::Six),
            "7" => Some(Degree::Seven),
            _ => None,
        }
    }

    /// The digit drawn as the primary glyph
    pub fn glyph(&self) -> &'static str {
        match self {
            Degree::One => "1",
            Degree::Two => "2",
            Degree::Three => "3",
            Degree::Four => "4",
            Degree::Five => "5",
            Degree::Six => "6",
            Degree::Seven => "7",
        }
    }
}

/// Duration class, serialized as the fraction of a whole note
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Duration {
    #[serde(rename = "1")]
    Whole,
    #[serde(rename = "1/2")]
    Half,
    #[default]
    #[serde(rename = "1/4")]
    Quarter,
    #[serde(rename = "1/8")]
    Eighth,
    #[serde(rename = "1/16")]
    Sixteenth,
    #[serde(rename = "1/32")]
    ThirtySecond,
}

impl Duration {
    /// Parse from the fraction notation used by the palette buttons
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "1" => Some(Duration::Whole),
            "1/2" => Some(Duration::Half),
            "1/4" => Some(Duration::Quarter),
            "1/8" => Some(Duration::Eighth),
            "1/16" => Some(Duration::Sixteenth),
            "1/32" => Some(Duration::ThirtySecond),
            _ => None,
        }
    }

    /// Number of extension cells that follow a primary element of this duration
    pub fn extension_count(&self) -> usize {
        match self {
            Duration::Whole => 3,
            Duration::Half => 1,
            _ => 0,
        }
    }

    /// Number of underlines drawn beneath the glyph (0 for quarter and longer)
    pub fn beam_count(&self) -> u8 {
        match self {
            Duration::Eighth => 1,
            Duration::Sixteenth => 2,
            Duration::ThirtySecond => 3,
            _ => 0,
        }
    }

    /// CSS class of the duration marker, if one is drawn
    pub fn marker_class(&self) -> Option<&'static str> {
        match self {
            Duration::Eighth => Some("eighth-note"),
            Duration::Sixteenth => Some("sixteenth-note"),
            Duration::ThirtySecond => Some("thirty-second-note"),
            _ => None,
        }
    }
}

/// Accidental and augmentation modifiers
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Sharp,
    Flat,
    Natural,
    Dot,
}

impl Modifier {
    /// Sharp, flat and natural exclude each other; dot stands alone
    pub fn is_accidental(&self) -> bool {
        !matches!(self, Modifier::Dot)
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Modifier::Sharp => "♯",
            Modifier::Flat => "♭",
            Modifier::Natural => "♮",
            Modifier::Dot => "·",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Modifier::Sharp => "sharp",
            Modifier::Flat => "flat",
            Modifier::Natural => "natural",
            Modifier::Dot => "dot",
        }
    }
}

/// Octave dot above (high) or below (low) the glyph
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Octave {
    High,
    Low,
}

/// Marks the cells of a multi-cell rest so they render as one group
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RestGroup {
    Full,
    Half,
}

/// Structural markers
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialKind {
    Bar,
    RepeatStart,
    RepeatEnd,
}

impl SpecialKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "bar" => Some(SpecialKind::Bar),
            "repeat-start" => Some(SpecialKind::RepeatStart),
            "repeat-end" => Some(SpecialKind::RepeatEnd),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialKind::Bar => "bar",
            SpecialKind::RepeatStart => "repeat-start",
            SpecialKind::RepeatEnd => "repeat-end",
        }
    }

    /// Text content for the symbol; the bar line is drawn with a border only
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            SpecialKind::Bar => None,
            SpecialKind::RepeatStart => Some(":|"),
            SpecialKind::RepeatEnd => Some("|:"),
        }
    }
}

fn rest_glyph() -> String {
    "0".to_string()
}

fn extension_glyph() -> String {
    "-".to_string()
}

/// The smallest placed unit in a measure
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Note {
        #[serde(rename = "value")]
        degree: Degree,
        #[serde(default)]
        duration: Duration,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        modifiers: Vec<Modifier>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        octave: Option<Octave>,
    },
    Rest {
        #[serde(default = "rest_glyph")]
        value: String,
        #[serde(default)]
        duration: Duration,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        modifiers: Vec<Modifier>,
        #[serde(rename = "restGroup", default, skip_serializing_if = "Option::is_none")]
        rest_group: Option<RestGroup>,
    },
    Extension {
        #[serde(default = "extension_glyph")]
        value: String,
        #[serde(default)]
        duration: Duration,
    },
    Special {
        #[serde(rename = "value")]
        kind: SpecialKind,
    },
}

impl Element {
    /// A quarter note of the given degree, as added by the note palette
    pub fn note(degree: Degree) -> Self {
        Element::Note {
            degree,
            duration: Duration::Quarter,
            modifiers: Vec::new(),
            octave: None,
        }
    }

    pub fn rest(duration: Duration, rest_group: Option<RestGroup>) -> Self {
        Element::Rest {
            value: rest_glyph(),
            duration,
            modifiers: Vec::new(),
            rest_group,
        }
    }

    pub fn extension() -> Self {
        Element::Extension {
            value: extension_glyph(),
            duration: Duration::Quarter,
        }
    }

    pub fn special(kind: SpecialKind) -> Self {
        Element::Special { kind }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, Element::Note { .. })
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Element::Rest { .. })
    }

    pub fn is_extension(&self) -> bool {
        matches!(self, Element::Extension { .. })
    }

    /// Notes and rests can carry a lyric (and therefore a lyric field)
    pub fn accepts_lyric(&self) -> bool {
        self.is_note() || self.is_rest()
    }

    /// Discriminant as written on the wire
    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Note { .. } => "note",
            Element::Rest { .. } => "rest",
            Element::Extension { .. } => "extension",
            Element::Special { .. } => "special",
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Element::Note { duration, .. } | Element::Rest { duration, .. } => Some(*duration),
            _ => None,
        }
    }

    /// Modifiers of a note or rest (empty for the other variants)
    pub fn modifiers(&self) -> &[Modifier] {
        match self {
            Element::Note { modifiers, .. } | Element::Rest { modifiers, .. } => modifiers,
            _ => &[],
        }
    }

    /// Apply a modifier, clearing any conflicting accidental first.
    ///
    /// Returns false when the element does not take modifiers or already has it.
    pub fn apply_modifier(&mut self, modifier: Modifier) -> bool {
        let modifiers = match self {
            Element::Note { modifiers, .. } | Element::Rest { modifiers, .. } => modifiers,
            _ => return false,
        };

        if modifiers.contains(&modifier) {
            return false;
        }

        if modifier.is_accidental() {
            modifiers.retain(|m| !m.is_accidental());
        }
        modifiers.push(modifier);
        true
    }

    /// Toggle an octave marker on a note; choosing the current marker clears it
    pub fn toggle_octave(&mut self, marker: Octave) -> bool {
        match self {
            Element::Note { octave, .. } => {
                *octave = if *octave == Some(marker) { None } else { Some(marker) };
                true
            }
            _ => false,
        }
    }

    /// Set the duration class of a note or rest (extension cells are managed by the model)
    pub fn set_duration(&mut self, value: Duration) -> bool {
        match self {
            Element::Note { duration, .. } | Element::Rest { duration, .. } => {
                *duration = value;
                true
            }
            _ => false,
        }
    }
}
