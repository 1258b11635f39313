use serde::Serialize;

/// Breakpoint class of the container, computed once per layout pass.
/// Every width-dependent constant of the layout hangs off this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportClass {
    /// < 640 px
    Mobile,
    /// 640..1024 px
    Tablet,
    /// 1024..1440 px
    Desktop,
    /// >= 1440 px
    Ultrawide,
}

impl ViewportClass {
    pub fn from_width(width: f64) -> Self {
        if width < 640.0 {
            ViewportClass::Mobile
        } else if width < 1024.0 {
            ViewportClass::Tablet
        } else if width < 1440.0 {
            ViewportClass::Desktop
        } else {
            ViewportClass::Ultrawide
        }
    }

    /// Stacked single-column rules instead of side-by-side/grid rules.
    pub fn is_compact(self) -> bool {
        self == ViewportClass::Mobile
    }

    /// Spacing around and between sections (px).
    pub fn gap(self) -> f64 {
        match self {
            ViewportClass::Mobile => 3.0,
            ViewportClass::Tablet => 6.0,
            ViewportClass::Desktop => 10.0,
            ViewportClass::Ultrawide => 14.0,
        }
    }

    /// Height of each section's header strip (px).
    pub fn header_height(self) -> f64 {
        match self {
            ViewportClass::Mobile => 30.0,
            ViewportClass::Tablet => 34.0,
            ViewportClass::Desktop => 36.0,
            ViewportClass::Ultrawide => 40.0,
        }
    }

    /// Minimum width of a section in the three-way side-by-side split (px).
    pub fn min_section_width(self) -> f64 {
        match self {
            ViewportClass::Mobile | ViewportClass::Tablet => 150.0,
            ViewportClass::Desktop => 180.0,
            ViewportClass::Ultrawide => 200.0,
        }
    }

    /// Minimum height of a section when sections are stacked (px).
    pub fn min_section_height(self) -> f64 {
        match self {
            ViewportClass::Mobile => 100.0,
            _ => 120.0,
        }
    }

    /// Smallest share the minor category keeps in the two-way split. The
    /// larger category always holds at least half, which covers the 40%
    /// (45% on mobile) minimum for it.
    pub fn two_way_minor_share(self) -> f64 {
        match self {
            ViewportClass::Mobile => 0.25,
            _ => 0.20,
        }
    }

    /// Smallest (width, height) at which a renderer should draw item text.
    pub fn label_min_size(self) -> (f64, f64) {
        match self {
            ViewportClass::Mobile => (40.0, 15.0),
            ViewportClass::Tablet => (50.0, 18.0),
            ViewportClass::Desktop => (60.0, 20.0),
            ViewportClass::Ultrawide => (80.0, 24.0),
        }
    }
}
