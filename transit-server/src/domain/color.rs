//! Display colours for lines.

use super::LineId;

/// Colours of the lines that have an official livery.
const KNOWN_LINE_COLORS: &[(&str, &str)] = &[
    ("1", "#e2001a"),
    ("3", "#0069b4"),
    ("8", "#f39200"),
    ("9", "#95c11f"),
    ("12", "#a3195b"),
    ("15", "#00a0e1"),
    ("19", "#7b2c83"),
    ("23", "#009640"),
    ("40", "#ffcc00"),
    ("70", "#5b3f97"),
    ("81", "#e6007e"),
    ("83", "#00983a"),
    ("87", "#e30613"),
    ("U", "#1d1d1b"),
];

/// Colour for a line, as a CSS colour string.
///
/// Known lines use their livery; any other id maps to a stable hue.
///
/// ```
/// use transit_server::domain::{LineId, line_color};
///
/// let line = LineId::parse("87").unwrap();
/// assert_eq!(line_color(&line), "#e30613");
///
/// let other = LineId::parse("N42").unwrap();
/// assert_eq!(line_color(&other), line_color(&other));
/// assert!(line_color(&other).starts_with("hsl("));
/// ```
pub fn line_color(line: &LineId) -> String {
    KNOWN_LINE_COLORS
        .iter()
        .find(|(id, _)| *id == line.as_str())
        .map(|(_, color)| (*color).to_string())
        .unwrap_or_else(|| format!("hsl({}, 65%, 45%)", hue_for(line.as_str())))
}

/// 31-multiplier string hash reduced to a hue in 0..360.
fn hue_for(id: &str) -> u32 {
    let hash = id
        .chars()
        .fold(0u32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as u32));
    hash % 360
}
