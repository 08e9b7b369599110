//! Page geometry.

use serde::Deserialize;

use crate::units::Measure;

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Value of `w:pgSz/@w:orient`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// `[page]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub size: PageSize,
    pub margin: PageMargin,
}

/// Paper size, always given portrait-wise; `orientation` swaps the axes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageSize {
    pub width: Measure,
    pub height: Measure,
    pub orientation: Orientation,
}

impl Default for PageSize {
    fn default() -> Self {
        // A4
        Self {
            width: Measure::Emu(210 * crate::units::MM),
            height: Measure::Emu(297 * crate::units::MM),
            orientation: Orientation::Portrait,
        }
    }
}

/// Page margins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageMargin {
    pub top: Measure,
    pub bottom: Measure,
    pub left: Measure,
    pub right: Measure,
    pub header: Option<Measure>,
    pub footer: Option<Measure>,
}

impl Default for PageMargin {
    fn default() -> Self {
        Self {
            top: Measure::Emu(35 * crate::units::MM),
            bottom: Measure::Emu(35 * crate::units::MM),
            left: Measure::Emu(28 * crate::units::MM),
            right: Measure::Emu(28 * crate::units::MM),
            header: None,
            footer: None,
        }
    }
}

/// Usable content area of a page, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contracts {
    pub width: i64,
    pub height: i64,
}

impl PageConfig {
    /// Physical page width and height in EMU after applying orientation.
    #[must_use]
    pub fn oriented_size(&self) -> (i64, i64) {
        let (width, height) = (self.size.width.to_emu(), self.size.height.to_emu());
        match self.size.orientation {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }

    /// Content area left after margins.
    #[must_use]
    pub fn contracts(&self) -> Contracts {
        let (width, height) = self.oriented_size();
        Contracts {
            width: width - self.margin.left.to_emu() - self.margin.right.to_emu(),
            height: height - self.margin.top.to_emu() - self.margin.bottom.to_emu(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::MM;

    #[test]
    fn test_default_contracts() {
        let page = PageConfig::default();
        assert_eq!(
            page.contracts(),
            Contracts {
                width: (210 - 56) * MM,
                height: (297 - 70) * MM,
            }
        );
    }

    #[test]
    fn test_landscape_swaps_axes() {
        let mut page = PageConfig::default();
        page.size.orientation = Orientation::Landscape;
        assert_eq!(page.oriented_size(), (297 * MM, 210 * MM));
        assert_eq!(
            page.contracts(),
            Contracts {
                width: (297 - 56) * MM,
                height: (210 - 70) * MM,
            }
        );
    }
}
