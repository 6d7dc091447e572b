//! Cost functions: `ratio × value`, optionally rounded

use crate::error::TemplateError;

/// Rounding applied after scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// `X`
    #[default]
    None,
    /// `F`
    Floor,
    /// `R`, halves round away from zero.
    Nearest,
    /// `C`
    Ceil,
}

impl Rounding {
    /// Map a mode letter to its rounding, if it is one.
    pub fn from_mode(mode: u8) -> Option<Self> {
        match mode {
            b'X' => Some(Rounding::None),
            b'F' => Some(Rounding::Floor),
            b'R' => Some(Rounding::Nearest),
            b'C' => Some(Rounding::Ceil),
            _ => None,
        }
    }

    pub fn mode(self) -> char {
        match self {
            Rounding::None => 'X',
            Rounding::Floor => 'F',
            Rounding::Nearest => 'R',
            Rounding::Ceil => 'C',
        }
    }

    pub fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::None => value,
            Rounding::Floor => value.floor(),
            Rounding::Nearest => value.round(),
            Rounding::Ceil => value.ceil(),
        }
    }
}

/// Transform applied to a node or edge cost when printing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostFunction {
    pub ratio: f64,
    pub rounding: Rounding,
}

impl Default for CostFunction {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CostFunction {
    /// Ratio 1, no rounding.
    pub const IDENTITY: CostFunction = CostFunction {
        ratio: 1.0,
        rounding: Rounding::None,
    };

    pub fn new(ratio: f64, rounding: Rounding) -> Self {
        Self { ratio, rounding }
    }

    /// Scale `value` by the ratio, then round it.
    pub fn apply(&self, value: f64) -> f64 {
        self.rounding.apply(value * self.ratio)
    }

    /// Parse a `{ratio}{mode}` prefix of `text`.
    ///
    /// Returns the cost function and how many bytes it spans, or `None` when
    /// `text` does not start with a cost function at all. A character after
    /// the ratio that is not a mode letter is left for the caller.
    pub fn parse(text: &str) -> Result<Option<(CostFunction, usize)>, TemplateError> {
        let bytes = text.as_bytes();
        let ratio_len = bytes
            .iter()
            .position(|&b| !(b.is_ascii_digit() || b == b'.'))
            .unwrap_or(bytes.len());

        let mut func = CostFunction::IDENTITY;
        let ratio_text = &text[..ratio_len];
        if !ratio_text.is_empty() {
            func.ratio = ratio_text
                .parse()
                .map_err(|source| TemplateError::InvalidRatio {
                    fragment: ratio_text.to_string(),
                    source,
                })?;
        }

        let mut consumed = ratio_len;
        if let Some(rounding) = bytes.get(ratio_len).copied().and_then(Rounding::from_mode) {
            func.rounding = rounding;
            consumed += 1;
        }

        if consumed == 0 {
            return Ok(None);
        }
        Ok(Some((func, consumed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ratio_and_mode() {
        let (func, len) = CostFunction::parse("3.6RN").unwrap().unwrap();
        assert_eq!(func, CostFunction::new(3.6, Rounding::Nearest));
        assert_eq!(len, 4);
    }

    #[test]
    fn test_parse_ratio_only() {
        let (func, len) = CostFunction::parse(".5N").unwrap().unwrap();
        assert_eq!(func, CostFunction::new(0.5, Rounding::None));
        assert_eq!(len, 2);
    }

    #[test]
    fn test_parse_mode_only() {
        let (func, len) = CostFunction::parse("Fw").unwrap().unwrap();
        assert_eq!(func, CostFunction::new(1.0, Rounding::Floor));
        assert_eq!(len, 1);
    }

    #[test]
    fn test_parse_nothing() {
        assert!(CostFunction::parse("N").unwrap().is_none());
        assert!(CostFunction::parse("").unwrap().is_none());
    }

    #[test]
    fn test_zero_and_nine_are_digits() {
        let (func, len) = CostFunction::parse("90M").unwrap().unwrap();
        assert_eq!(func.ratio, 90.0);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_invalid_ratio() {
        let err = CostFunction::parse("1.2.3N").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidRatio { ref fragment, .. } if fragment == "1.2.3"));
        assert!(CostFunction::parse(".N").is_err());
    }

    #[test]
    fn test_apply_rounding() {
        assert_eq!(CostFunction::new(2.0, Rounding::Nearest).apply(0.3), 1.0);
        assert_eq!(CostFunction::new(2.0, Rounding::Nearest).apply(1.25), 3.0);
        assert_eq!(CostFunction::new(2.0, Rounding::Floor).apply(1.4), 2.0);
        assert_eq!(CostFunction::new(0.1, Rounding::Ceil).apply(11.0), 2.0);
        assert_eq!(CostFunction::IDENTITY.apply(4.5), 4.5);
    }
}
