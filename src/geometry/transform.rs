//! `translate(dx, dy)` transforms as emitted by the flowchart renderer.
//!
//! The renderer positions every group with a single translation, so this is
//! the only transform form accepted. Anything else is a
//! [`FlowlabelError::MalformedTransform`]: guessing an offset would silently
//! shift a box in the dataset.

use std::fmt;

use crate::error::FlowlabelError;

/// A 2D translation in diagram units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformOffset {
    pub dx: f64,
    pub dy: f64,
}

impl TransformOffset {
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    #[inline]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Composes `relative` on top of `self`.
    #[inline]
    pub fn then(self, relative: TransformOffset) -> Self {
        Self::new(self.dx + relative.dx, self.dy + relative.dy)
    }
}

impl fmt::Display for TransformOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({}, {})", self.dx, self.dy)
    }
}

/// Parses a `translate(<number>, <number>)` string.
///
/// Numbers are signed decimals (`-12`, `3.5`, `+0.25`, `7.`); whitespace is
/// allowed inside the parentheses around each number.
pub fn parse_translation(raw: &str) -> Result<TransformOffset, FlowlabelError> {
    let malformed = || FlowlabelError::MalformedTransform {
        transform: raw.to_string(),
    };

    let args = raw
        .trim()
        .strip_prefix("translate(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let (x, y) = args.split_once(',').ok_or_else(malformed)?;

    let dx = parse_signed_decimal(x.trim()).ok_or_else(malformed)?;
    let dy = parse_signed_decimal(y.trim()).ok_or_else(malformed)?;
    Ok(TransformOffset::new(dx, dy))
}

/// Resolves `relative` against `base` and returns the absolute position.
///
/// A root element's `base` is [`TransformOffset::ZERO`].
pub fn apply_offset(base: TransformOffset, relative: &str) -> Result<(f64, f64), FlowlabelError> {
    let resolved = base.then(parse_translation(relative)?);
    Ok((resolved.dx, resolved.dy))
}

/// Resolves an optional `transform` attribute.
///
/// A missing attribute means the element sits at its parent's origin; a
/// present one must parse.
pub fn parse_optional_translation(raw: Option<&str>) -> Result<TransformOffset, FlowlabelError> {
    raw.map_or(Ok(TransformOffset::ZERO), parse_translation)
}

fn parse_signed_decimal(raw: &str) -> Option<f64> {
    let unsigned = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (unsigned, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    raw.parse::<f64>().ok()
}
