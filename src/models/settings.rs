//! Score-level settings: key, meter, tempo, skin and display toggles

use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPO: u16 = 120;
pub const MIN_TEMPO: u16 = 40;
pub const MAX_TEMPO: u16 = 300;

/// Key signatures offered by the editor
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum KeySignature {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
    Bb,
    Eb,
}

impl KeySignature {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "C" => Some(KeySignature::C),
            "D" => Some(KeySignature::D),
            "E" => Some(KeySignature::E),
            "F" => Some(KeySignature::F),
            "G" => Some(KeySignature::G),
            "A" => Some(KeySignature::A),
            "B" => Some(KeySignature::B),
            "Bb" => Some(KeySignature::Bb),
            "Eb" => Some(KeySignature::Eb),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeySignature::C => "C",
            KeySignature::D => "D",
            KeySignature::E => "E",
            KeySignature::F => "F",
            KeySignature::G => "G",
            KeySignature::A => "A",
            KeySignature::B => "B",
            KeySignature::Bb => "Bb",
            KeySignature::Eb => "Eb",
        }
    }
}

/// Meters offered by the editor
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TimeSignature {
    #[serde(rename = "2/4")]
    TwoFour,
    #[serde(rename = "3/4")]
    ThreeFour,
    #[default]
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "6/8")]
    SixEight,
    #[serde(rename = "9/8")]
    NineEight,
    #[serde(rename = "12/8")]
    TwelveEight,
}

impl TimeSignature {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "2/4" => Some(TimeSignature::TwoFour),
            "3/4" => Some(TimeSignature::ThreeFour),
            "4/4" => Some(TimeSignature::FourFour),
            "6/8" => Some(TimeSignature::SixEight),
            "9/8" => Some(TimeSignature::NineEight),
            "12/8" => Some(TimeSignature::TwelveEight),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSignature::TwoFour => "2/4",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::FourFour => "4/4",
            TimeSignature::SixEight => "6/8",
            TimeSignature::NineEight => "9/8",
            TimeSignature::TwelveEight => "12/8",
        }
    }
}

/// Presentational background theme
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Skin {
    #[default]
    White,
    LightBeige,
    LightBlue,
}

impl Skin {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "white" => Some(Skin::White),
            "light-beige" => Some(Skin::LightBeige),
            "light-blue" => Some(Skin::LightBlue),
            _ => None,
        }
    }

    /// Class applied to the score container
    pub fn class_name(&self) -> &'static str {
        match self {
            Skin::White => "skin-white",
            Skin::LightBeige => "skin-light-beige",
            Skin::LightBlue => "skin-light-blue",
        }
    }
}

/// Clamp a tempo into the supported range
pub fn clamp_tempo(tempo: i64) -> u16 {
    tempo.clamp(MIN_TEMPO as i64, MAX_TEMPO as i64) as u16
}

/// Live settings held by the document model
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub key_signature: KeySignature,
    pub time_signature: TimeSignature,
    pub tempo: u16,
    pub skin: Skin,
    pub show_lyrics: bool,
    pub show_fingering: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_signature: KeySignature::default(),
            time_signature: TimeSignature::default(),
            tempo: DEFAULT_TEMPO,
            skin: Skin::default(),
            show_lyrics: false,
            show_fingering: false,
        }
    }
}
