//! Implant fixture dimension strings.
//!
//! Inventory exports spell the same fixture many ways: `4.0x10mm`, `Ø4.5 × 11.5`, `D4.0 L10`,
//! `φ3.5*8.5`. All of them reduce to a diameter and a length in millimetres.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static DIAMETER_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bD\s*(\d+(?:\.\d+)?)\s*(?:mm)?\s*[x×*/,]?\s*L\s*(\d+(?:\.\d+)?)").expect("static regex is valid")
});

static CROSS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:[Øø⌀φΦ]\s*)?(\d+(?:\.\d+)?)\s*(?:mm)?\s*[x×*]\s*(\d+(?:\.\d+)?)\s*(?:mm)?").expect("static regex is valid")
});

const MAX_DIAMETER_MM: f64 = 10.0;
const MAX_LENGTH_MM: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixtureDimensions {
    pub diameter_mm: f64,
    pub length_mm: f64,
}

fn plausible(diameter_mm: f64, length_mm: f64) -> Option<FixtureDimensions> {
    let in_range = diameter_mm > 0.0 && diameter_mm <= MAX_DIAMETER_MM && length_mm > 0.0 && length_mm <= MAX_LENGTH_MM;
    in_range.then_some(FixtureDimensions { diameter_mm, length_mm })
}

/// Find the first fixture dimension in `text`.
///
/// Pairs outside implant ranges (diameter up to 10mm, length up to 30mm) are ignored so that
/// things like `1920x1080` are not mistaken for fixtures.
pub fn parse_dimensions(text: &str) -> Option<FixtureDimensions> {
    let parse_pair = |caps: regex::Captures<'_>| -> Option<FixtureDimensions> {
        let diameter = caps.get(1)?.as_str().parse::<f64>().ok()?;
        let length = caps.get(2)?.as_str().parse::<f64>().ok()?;
        plausible(diameter, length)
    };

    DIAMETER_LENGTH
        .captures_iter(text)
        .find_map(parse_pair)
        .or_else(|| CROSS.captures_iter(text).find_map(parse_pair))
}
