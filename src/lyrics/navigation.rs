//! Lyric navigation and text splitting
//!
//! Lyric fields exist only on notes and rests. Navigation scans the score in
//! document order, crossing measure boundaries, and skips every other element.

use crate::models::{Element, Position, ScoreModel};

/// The next note or rest after `pos`, scanning forward across measures
pub fn next_eligible(model: &ScoreModel, pos: Position) -> Option<Position> {
    let measures = &model.measures;
    if let Some(measure) = measures.get(pos.measure_index) {
        if let Some(i) = (pos.element_index + 1..measure.len()).find(|&i| measure[i].accepts_lyric()) {
            return Some(Position::new(pos.measure_index, i));
        }
    }

    measures
        .iter()
        .enumerate()
        .skip(pos.measure_index + 1)
        .find_map(|(m, measure)| {
            measure
                .iter()
                .position(Element::accepts_lyric)
                .map(|i| Position::new(m, i))
        })
}

/// The previous note or rest before `pos`, scanning backward across measures
pub fn prev_eligible(model: &ScoreModel, pos: Position) -> Option<Position> {
    let measures = &model.measures;
    if let Some(measure) = measures.get(pos.measure_index) {
        let end = pos.element_index.min(measure.len());
        if let Some(i) = (0..end).rev().find(|&i| measure[i].accepts_lyric()) {
            return Some(Position::new(pos.measure_index, i));
        }
    }

    let first = pos.measure_index.min(measures.len());
    (0..first).rev().find_map(|m| {
        measures[m]
            .iter()
            .rposition(Element::accepts_lyric)
            .map(|i| Position::new(m, i))
    })
}

/// Split pasted or typed text into lyric units.
///
/// Whitespace separates parts. A part made only of ASCII letters and digits
/// stays whole (a word or number); any other part is split per character.
///
/// # Examples
/// - "hello world" -> ["hello", "world"]
/// - "春眠不觉晓" -> ["春", "眠", "不", "觉", "晓"]
/// - "la 啦啦" -> ["la", "啦", "啦"]
pub fn split_text(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    for part in text.split_whitespace() {
        if part.chars().all(|c| c.is_ascii_alphanumeric()) {
            units.push(part.to_string());
        } else {
            units.extend(part.chars().map(String::from));
        }
    }
    units
}
