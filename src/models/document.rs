//! Serialized ScoreDocument, the unit exchanged with the host and the
//! persistence API

use serde::{Deserialize, Serialize};

use super::elements::Element;
use super::notation::{Lyric, Tie};
use super::serde_helpers;
use super::settings::{KeySignature, Skin, TimeSignature, DEFAULT_TEMPO};

pub const DOCUMENT_VERSION: &str = "1.0";
pub const DEFAULT_TITLE: &str = "未命名简谱";

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_measures() -> Vec<Vec<Element>> {
    vec![Vec::new()]
}

fn default_tempo() -> u16 {
    DEFAULT_TEMPO
}

/// Settings block of a serialized document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    #[serde(default, deserialize_with = "serde_helpers::lenient")]
    pub key_signature: KeySignature,
    #[serde(default, deserialize_with = "serde_helpers::lenient")]
    pub time_signature: TimeSignature,
    #[serde(default = "default_tempo", deserialize_with = "serde_helpers::tempo")]
    pub tempo: u16,
    #[serde(default, deserialize_with = "serde_helpers::lenient")]
    pub skin: Skin,
    #[serde(default, deserialize_with = "serde_helpers::lenient")]
    pub show_lyrics: bool,
    /// Accepted on load, never written by the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_fingering: Option<bool>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            key_signature: KeySignature::default(),
            time_signature: TimeSignature::default(),
            tempo: DEFAULT_TEMPO,
            skin: Skin::default(),
            show_lyrics: false,
            show_fingering: None,
        }
    }
}

/// The persisted score
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDocument {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub score_id: String,

    #[serde(
        default,
        deserialize_with = "serde_helpers::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_user_id: Option<String>,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_measures", deserialize_with = "serde_helpers::measures")]
    pub measures: Vec<Vec<Element>>,

    #[serde(default, deserialize_with = "serde_helpers::null_as_empty")]
    pub ties: Vec<Tie>,

    #[serde(default, deserialize_with = "serde_helpers::null_as_empty")]
    pub lyrics: Vec<Lyric>,

    #[serde(default, deserialize_with = "serde_helpers::lenient")]
    pub settings: DocumentSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ScoreDocument {
    /// A blank document as created by the host: one empty measure, C, 4/4, 120
    pub fn blank(score_id: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            score_id: score_id.into(),
            owner_user_id: None,
            title: default_title(),
            measures: default_measures(),
            ties: Vec::new(),
            lyrics: Vec::new(),
            settings: DocumentSettings::default(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: ScoreDocument = serde_json::from_str(json)?;
        Ok(doc.normalized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore the non-empty `measures` invariant after construction from any source
    pub fn normalized(mut self) -> Self {
        if self.measures.is_empty() {
            self.measures = default_measures();
        }
        if self.title.is_empty() {
            self.title = default_title();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Degree, Duration, Modifier, SpecialKind};

    #[test]
    fn test_missing_fields_take_defaults() {
        let doc = ScoreDocument::from_json(r#"{"scoreId":"abc","settings":{"keySignature":"G"}}"#).unwrap();

        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.measures, vec![Vec::<Element>::new()]);
        assert_eq!(doc.settings.key_signature, KeySignature::G);
        assert_eq!(doc.settings.tempo, 120);
        assert_eq!(doc.settings.time_signature, TimeSignature::FourFour);
    }

    #[test]
    fn test_nulls_and_unknown_values() {
        let doc = ScoreDocument::from_json(
            r#"{"measures":[null,[]],"ties":null,"settings":{"keySignature":"H","tempo":"fast","skin":null}}"#,
        )
        .unwrap();

        assert_eq!(doc.measures.len(), 2);
        assert!(doc.measures[0].is_empty());
        assert!(doc.ties.is_empty());
        assert_eq!(doc.settings.key_signature, KeySignature::C);
        assert_eq!(doc.settings.tempo, 120);
        assert_eq!(doc.settings.skin, Skin::White);
    }

    #[test]
    fn test_unknown_element_attributes_do_not_reject_document() {
        let doc = ScoreDocument::from_json(
            r#"{"title":"x","measures":[[
                {"type":"note","value":"1"},
                {"type":"note","value":"1","modifiers":["double-sharp","dot"],"octave":"middle"},
                {"type":"rest","duration":"1/64"},
                {"type":"glissando","value":"up"},
                {"type":"note","value":"9"},
                {"type":"special","value":"bar"}
            ]]}"#,
        )
        .unwrap();

        assert_eq!(doc.title, "x");
        assert_eq!(
            doc.measures[0],
            vec![
                Element::note(Degree::One),
                Element::Note {
                    degree: Degree::One,
                    duration: Duration::Quarter,
                    modifiers: vec![Modifier::Dot],
                    octave: None,
                },
                Element::rest(Duration::Quarter, None),
                Element::special(SpecialKind::Bar),
            ]
        );
    }

    #[test]
    fn test_empty_measures_become_one() {
        let doc = ScoreDocument::from_json(r#"{"measures":[]}"#).unwrap();
        assert_eq!(doc.measures.len(), 1);
    }

    #[test]
    fn test_show_fingering_omitted_when_unset() {
        let doc = ScoreDocument::blank("id-1");
        let json = doc.to_json().unwrap();
        assert!(!json.contains("showFingering"));
        assert!(!json.contains("ownerUserId"));
        assert!(json.contains(r#""showLyrics":false"#));
    }

    #[test]
    fn test_empty_owner_is_none() {
        let doc = ScoreDocument::from_json(r#"{"ownerUserId":""}"#).unwrap();
        assert_eq!(doc.owner_user_id, None);
    }
}
