//! Ocarina fingering diagrams by (key signature, degree, octave marker)
//!
//! Format: (key, degree, octave) → image resource
//!
//! Example:
//!   (C, 1, none)  → "./static/C-graph/1.png"
//!   (C, 1, high)  → "./static/C-graph/1h.png"
//!   (G, 2, low)   → "./static/G-graph/2l.png"
//!
//! Only C, F and G have diagram sets. Any other combination is a miss and the
//! caller omits the image slot.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::{Degree, KeySignature, Octave};

type CatalogKey = (KeySignature, Degree, Option<Octave>);

static CATALOG: Lazy<HashMap<CatalogKey, String>> = Lazy::new(build_lookup_table);

/// Resolve the fingering diagram for a note, if the catalog has one
pub fn fingering_for(key: KeySignature, degree: Degree, octave: Option<Octave>) -> Option<&'static str> {
    CATALOG.get(&(key, degree, octave)).map(String::as_str)
}

/// Number of diagrams in the catalog
pub fn catalog_size() -> usize {
    CATALOG.len()
}

fn build_lookup_table() -> HashMap<CatalogKey, String> {
    use Degree::*;

    let mut table = HashMap::new();

    // C: full middle register, 1-4 upper, 6-7 lower
    add_key(
        &mut table,
        KeySignature::C,
        &[One, Two, Three, Four],
        &[Six, Seven],
    );

    // F: 1 upper, 3-7 lower
    add_key(
        &mut table,
        KeySignature::F,
        &[One],
        &[Three, Four, Five, Six, Seven],
    );

    // G: no upper register, 2-7 lower
    add_key(
        &mut table,
        KeySignature::G,
        &[],
        &[Two, Three, Four, Five, Six, Seven],
    );

    table
}

fn add_key(
    table: &mut HashMap<CatalogKey, String>,
    key: KeySignature,
    high: &[Degree],
    low: &[Degree],
) {
    use Degree::*;

    let dir = format!("./static/{}-graph", key.as_str());
    for degree in [One, Two, Three, Four, Five, Six, Seven] {
        table.insert((key, degree, None), format!("{}/{}.png", dir, degree.glyph()));
    }
    for degree in high {
        table.insert(
            (key, *degree, Some(Octave::High)),
            format!("{}/{}h.png", dir, degree.glyph()),
        );
    }
    for degree in low {
        table.insert(
            (key, *degree, Some(Octave::Low)),
            format!("{}/{}l.png", dir, degree.glyph()),
        );
    }
}
