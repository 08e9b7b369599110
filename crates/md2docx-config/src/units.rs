//! Length units.
//!
//! All lengths are normalized to EMU (English Metric Units, 914400 per inch)
//! and re-derived into whatever sub-unit a given OOXML attribute wants.

use serde::Deserialize;

/// One English Metric Unit.
pub const EMU: i64 = 1;
/// One point.
pub const PT: i64 = 12700 * EMU;
/// Half a point (font sizes).
pub const HALF_PT: i64 = PT / 2;
/// One twentieth of a point (layout units, a.k.a. twips).
pub const DXA: i64 = PT / 20;
/// One CSS pixel at 96 dpi (drawing extents are multiples of this).
pub const PIXEL: i64 = 9525 * EMU;
/// One inch.
pub const INCH: i64 = 914_400 * EMU;
/// One millimeter.
pub const MM: i64 = 36000 * EMU;
/// One centimeter.
pub const CM: i64 = 360_000 * EMU;

/// A length as written in configuration.
///
/// Strings carry a two-letter unit suffix (`pt`, `mm`, `cm`, `in`) and are
/// normalized to EMU. Bare numbers are kept as-is and interpreted in the
/// native unit of whatever attribute consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "MeasureRepr")]
pub enum Measure {
    /// A length normalized to EMU.
    Emu(i64),
    /// A bare number in the consumer's native unit.
    Raw(f64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeasureRepr {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<MeasureRepr> for Measure {
    type Error = String;

    #[allow(clippy::cast_precision_loss)]
    fn try_from(repr: MeasureRepr) -> Result<Self, Self::Error> {
        match repr {
            MeasureRepr::Int(value) => Ok(Self::Raw(value as f64)),
            MeasureRepr::Float(value) => Ok(Self::Raw(value)),
            MeasureRepr::Text(text) => Self::parse(&text),
        }
    }
}

impl Measure {
    /// Parse a unit-suffixed length such as `"3.5cm"` or `"12pt"`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let split = text.len().saturating_sub(2);
        let (amount, unit) = match (text.get(..split), text.get(split..)) {
            (Some(amount), Some(unit)) => (amount, unit),
            _ => return Err(format!("invalid length: {text:?}")),
        };
        let scale = match unit {
            "pt" => PT,
            "mm" => MM,
            "cm" => CM,
            "in" => INCH,
            _ => return Err(format!("unknown unit in length {text:?} (expected pt, mm, cm or in)")),
        };
        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| format!("invalid length: {text:?}"))?;
        Ok(Self::Emu(scale_round(amount, scale)))
    }

    /// Length in EMU; bare numbers are taken as EMU.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn to_emu(self) -> i64 {
        match self {
            Self::Emu(emu) => emu,
            Self::Raw(raw) => raw.round() as i64,
        }
    }

    /// Length in twips; bare numbers are taken as twips.
    #[must_use]
    pub fn to_twips(self) -> i64 {
        self.in_unit(DXA)
    }

    /// Length in half-points; bare numbers are taken as half-points.
    #[must_use]
    pub fn to_half_points(self) -> i64 {
        self.in_unit(HALF_PT)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn in_unit(self, unit: i64) -> i64 {
        match self {
            Self::Emu(emu) => (emu as f64 / unit as f64).round() as i64,
            Self::Raw(raw) => raw.round() as i64,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn scale_round(amount: f64, scale: i64) -> i64 {
    (amount * scale as f64).round() as i64
}

/// Convert EMU to twips, rounding to the nearest twip.
#[must_use]
pub fn emu_to_twips(emu: i64) -> i64 {
    (emu + DXA / 2).div_euclid(DXA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(Measure::parse("12pt").unwrap(), Measure::Emu(152_400));
        assert_eq!(Measure::parse("210mm").unwrap(), Measure::Emu(7_560_000));
        assert_eq!(Measure::parse("3.5cm").unwrap(), Measure::Emu(1_260_000));
        assert_eq!(Measure::parse("1in").unwrap(), Measure::Emu(914_400));
    }

    #[test]
    fn test_parse_rejects_unknown_unit() {
        assert!(Measure::parse("12px").is_err());
        assert!(Measure::parse("pt").is_err());
        assert!(Measure::parse("").is_err());
    }

    #[test]
    fn test_sub_units() {
        let size = Measure::parse("10.5pt").unwrap();
        assert_eq!(size.to_half_points(), 21);

        let margin = Measure::parse("2.8cm").unwrap();
        assert_eq!(margin.to_twips(), 1587);
    }

    #[test]
    fn test_raw_numbers_keep_native_unit() {
        assert_eq!(Measure::Raw(24.0).to_half_points(), 24);
        assert_eq!(Measure::Raw(420.0).to_twips(), 420);
        assert_eq!(Measure::Raw(9525.0).to_emu(), 9525);
    }

    #[test]
    fn test_emu_to_twips_rounds() {
        assert_eq!(emu_to_twips(210 * MM), 11906);
        assert_eq!(emu_to_twips(297 * MM), 16838);
        assert_eq!(emu_to_twips(PT), 20);
    }

    #[test]
    fn test_deserialize_measure() {
        #[derive(Deserialize)]
        struct Sample {
            a: Measure,
            b: Measure,
        }

        let sample: Sample = toml::from_str("a = \"1in\"\nb = 240").unwrap();
        assert_eq!(sample.a, Measure::Emu(INCH));
        assert_eq!(sample.b, Measure::Raw(240.0));
    }
}
