pub mod sections;
pub mod squarify;
pub mod viewport;

use serde::Serialize;

use crate::entity::normalize::{normalize, LayoutItem, Metric};
use crate::entity::RawEntity;
use self::sections::{allocate_sections, Section};
use self::viewport::ViewportClass;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "width")]
    pub w: f64,
    #[serde(rename = "height")]
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Shrink by `pad` on every side, clamping the size at zero.
    pub fn inset(&self, pad: f64) -> Rect {
        Rect {
            x: self.x + pad,
            y: self.y + pad,
            w: (self.w - 2.0 * pad).max(0.0),
            h: (self.h - 2.0 * pad).max(0.0),
        }
    }

    /// Half-open point containment.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect, eps: f64) -> bool {
        other.x >= self.x - eps
            && other.y >= self.y - eps
            && other.right() <= self.right() + eps
            && other.bottom() <= self.bottom() + eps
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Cut into two parts along the longer side; the first part gets
    /// `fraction` of the length. Wide rects become columns, all others rows.
    pub fn split_longer(&self, fraction: f64) -> (Rect, Rect) {
        if self.w > self.h {
            let first_w = self.w * fraction;
            (
                Rect::new(self.x, self.y, first_w, self.h),
                Rect::new(self.x + first_w, self.y, self.w - first_w, self.h),
            )
        } else {
            let first_h = self.h * fraction;
            (
                Rect::new(self.x, self.y, self.w, first_h),
                Rect::new(self.x, self.y + first_h, self.w, self.h - first_h),
            )
        }
    }
}

/// Tunables that do not depend on the viewport class.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Inset applied to a section interior before packing (px)
    pub item_padding: f64,
    /// BTC price used to derive USD values missing upstream
    pub btc_price_usd: f64,
    /// Width share bounds of the left column in the multi-category grid
    pub anchor_floor: f64,
    pub anchor_cap: f64,
    /// Height share bounds of the top-right cell in the multi-category grid
    pub feature_floor: f64,
    pub feature_cap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            item_padding: 2.0,
            btc_price_usd: 100_000.0,
            anchor_floor: 0.30,
            anchor_cap: 0.70,
            feature_floor: 0.25,
            feature_cap: 0.75,
        }
    }
}

/// The full layout result.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub canvas: Rect,
    pub viewport: ViewportClass,
    /// Metric the weights and display values were computed for
    pub metric: Metric,
    /// Sections ordered by total weight, descending
    pub sections: Vec<Section>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.sections.iter().map(|s| s.total_weight).sum()
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// All placed items, section by section.
    pub fn items(&self) -> impl Iterator<Item = &LayoutItem> + '_ {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// Section under a canvas point (header included).
    pub fn section_at(&self, x: f64, y: f64) -> Option<&Section> {
        self.sections.iter().find(|s| s.rect.contains(x, y))
    }

    /// Item under a canvas point, for hover and tooltips.
    pub fn item_at(&self, x: f64, y: f64) -> Option<(&Section, &LayoutItem)> {
        let section = self.section_at(x, y)?;
        section
            .items
            .iter()
            .find(|item| item.rect.contains(x, y))
            .map(|item| (section, item))
    }
}

/// Lay out already-normalized items on a `width` × `height` canvas.
pub fn compute_layout(
    items: Vec<LayoutItem>,
    metric: Metric,
    width: f64,
    height: f64,
    viewport: ViewportClass,
    config: &LayoutConfig,
) -> Layout {
    let canvas = Rect::new(0.0, 0.0, width.max(0.0), height.max(0.0));
    if width <= 0.0 || height <= 0.0 {
        tracing::warn!(
            "Degenerate canvas {}x{}: sections will have zero area",
            width,
            height
        );
    }

    let item_count = items.len();
    let sections = allocate_sections(items, canvas, viewport, config);

    tracing::debug!(
        "Laid out {} items by {} in {} sections on {:.0}x{:.0} ({:?})",
        item_count,
        metric,
        sections.len(),
        width,
        height,
        viewport
    );

    Layout {
        canvas,
        viewport,
        metric,
        sections,
    }
}

/// Normalize raw entities by `metric` and lay them out. The viewport class is
/// derived from `width`.
pub fn layout(
    entities: &[RawEntity],
    metric: Metric,
    width: f64,
    height: f64,
    config: &LayoutConfig,
) -> Layout {
    let items = normalize(entities, metric, config);
    compute_layout(
        items,
        metric,
        width,
        height,
        ViewportClass::from_width(width),
        config,
    )
}
