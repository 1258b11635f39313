use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use super::squarify::pack_items;
use super::viewport::ViewportClass;
use super::{LayoutConfig, Rect};
use crate::entity::category::Category;
use crate::entity::normalize::LayoutItem;

/// One category's allocated region.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub category: Category,
    pub label: &'static str,
    /// Placed items, weight descending
    pub items: Vec<LayoutItem>,
    pub total_weight: f64,
    /// Outer bounds, header strip included
    #[serde(flatten)]
    pub rect: Rect,
    pub header_height: f64,
}

impl Section {
    /// Header strip at the top of the section.
    pub fn header_rect(&self) -> Rect {
        Rect::new(
            self.rect.x,
            self.rect.y,
            self.rect.w,
            self.header_height.min(self.rect.h),
        )
    }

    /// Area below the header handed to the packer.
    pub fn interior(&self) -> Rect {
        Rect::new(
            self.rect.x,
            self.rect.y + self.header_height,
            self.rect.w,
            (self.rect.h - self.header_height).max(0.0),
        )
    }

    /// Share of `total` held by this section, in percent.
    pub fn share_percent(&self, total: f64) -> f64 {
        if total > 0.0 {
            self.total_weight / total * 100.0
        } else {
            0.0
        }
    }

    /// Whether the header label has room to render.
    pub fn header_fits(&self, viewport: ViewportClass) -> bool {
        let (min_w, _) = viewport.label_min_size();
        self.rect.w >= min_w && self.rect.h >= self.header_height
    }
}

/// Items of one category before placement.
#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub category: Category,
    pub items: Vec<LayoutItem>,
    pub total_weight: f64,
}

/// Group items by category, dropping empty groups. Groups come back sorted by
/// total weight descending (ties in category order); items inside each group
/// are sorted by weight descending.
pub fn group_by_category(items: Vec<LayoutItem>) -> Vec<CategoryGroup> {
    let mut by_category: BTreeMap<Category, Vec<LayoutItem>> = BTreeMap::new();
    for item in items {
        by_category.entry(item.category).or_default().push(item);
    }

    let mut groups: Vec<CategoryGroup> = by_category
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(category, mut items)| {
            items.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            let total_weight = items.iter().map(|i| i.weight).sum();
            CategoryGroup {
                category,
                items,
                total_weight,
            }
        })
        .collect();

    groups.sort_by(|a, b| b.total_weight.total_cmp(&a.total_weight));
    groups
}

/// Group, allocate and pack. Sections are returned in group order.
pub fn allocate_sections(
    items: Vec<LayoutItem>,
    canvas: Rect,
    viewport: ViewportClass,
    config: &LayoutConfig,
) -> Vec<Section> {
    let groups = group_by_category(items);
    if groups.is_empty() {
        return Vec::new();
    }

    let regions = allocate_regions(&groups, canvas, viewport, config);
    let header_height = viewport.header_height();
    let padding = config.item_padding;

    groups
        .into_par_iter()
        .zip(regions)
        .map(|(group, rect)| {
            let mut section = Section {
                category: group.category,
                label: group.category.label(),
                items: Vec::new(),
                total_weight: group.total_weight,
                rect,
                header_height,
            };
            section.items = pack_items(group.items, section.interior(), padding);
            tracing::debug!(
                "Section '{}': {} items in {:.0}x{:.0} at ({:.0}, {:.0})",
                section.label,
                section.items.len(),
                rect.w,
                rect.h,
                rect.x,
                rect.y
            );
            section
        })
        .collect()
}

/// Outer rectangle for each group, in the same order as `groups`.
pub fn allocate_regions(
    groups: &[CategoryGroup],
    canvas: Rect,
    viewport: ViewportClass,
    config: &LayoutConfig,
) -> Vec<Rect> {
    let gap = viewport.gap();
    let region = canvas.inset(gap);
    let weights: Vec<f64> = groups.iter().map(|g| g.total_weight).collect();

    match groups.len() {
        0 => Vec::new(),
        1 => vec![region],
        2 => {
            let total = weights[0] + weights[1];
            // Groups are weight-sorted, so the first share is at least 0.5.
            let share = if total > 0.0 { weights[0] / total } else { 0.5 };
            let share = share.min(1.0 - viewport.two_way_minor_share());
            let axis = if viewport.is_compact() || region.h > region.w {
                Axis::Stacked
            } else {
                Axis::SideBySide
            };
            tile(region, &[share, 1.0 - share], 0.0, gap, axis)
        }
        _ if viewport.is_compact() => tile(
            region,
            &weights,
            viewport.min_section_height(),
            gap,
            Axis::Stacked,
        ),
        3 => tile(
            region,
            &weights,
            viewport.min_section_width(),
            gap,
            Axis::SideBySide,
        ),
        _ => tier_grid(groups, region, gap, config),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    SideBySide,
    Stacked,
}

/// Lay rects out in a single row or column, `gap` apart, with spans
/// proportional to `weights` and at least `floor` each.
fn tile(region: Rect, weights: &[f64], floor: f64, gap: f64, axis: Axis) -> Vec<Rect> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }

    let length = match axis {
        Axis::SideBySide => region.w,
        Axis::Stacked => region.h,
    };
    let available = (length - gap * (n - 1) as f64).max(0.0);
    let spans = distribute(available, weights, floor);

    let mut offset = 0.0;
    spans
        .into_iter()
        .map(|span| {
            let rect = match axis {
                Axis::SideBySide => Rect::new(region.x + offset, region.y, span, region.h),
                Axis::Stacked => Rect::new(region.x, region.y + offset, region.w, span),
            };
            offset += span + gap;
            rect
        })
        .collect()
}

/// Split `available` proportionally to `weights`, raising any span below
/// `floor` to it and sharing what is left among the others. Every span but
/// the last is rounded down to whole pixels; the last absorbs the remainder.
fn distribute(available: f64, weights: &[f64], floor: f64) -> Vec<f64> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }

    let floor = floor.min(available / n as f64).max(0.0);
    let mut pinned = vec![false; n];
    let mut spans = vec![0.0; n];

    // Each round pins at least one more span, so this ends within n rounds.
    loop {
        let pinned_count = pinned.iter().filter(|&&p| p).count();
        let free_count = n - pinned_count;
        let free_space = (available - floor * pinned_count as f64).max(0.0);
        let free_weight: f64 = weights
            .iter()
            .zip(&pinned)
            .filter(|&(_, &p)| !p)
            .map(|(w, _)| w.max(0.0))
            .sum();

        let mut changed = false;
        for i in 0..n {
            if pinned[i] {
                spans[i] = floor;
                continue;
            }
            let span = if free_weight > 0.0 {
                weights[i].max(0.0) / free_weight * free_space
            } else {
                free_space / free_count as f64
            };
            if span < floor {
                pinned[i] = true;
                changed = true;
            }
            spans[i] = span;
        }
        if !changed {
            break;
        }
    }

    let mut used = 0.0;
    for span in spans.iter_mut().take(n - 1) {
        *span = span.floor();
        used += *span;
    }
    spans[n - 1] = (available - used).max(0.0);
    spans
}

/// Multi-category desktop grid: the best-ranked group takes a left column,
/// the next the top of the right column, and the rest fill a two-column grid
/// below it.
fn tier_grid(groups: &[CategoryGroup], region: Rect, gap: f64, config: &LayoutConfig) -> Vec<Rect> {
    // Rank by tier, then by weight. `groups` is already weight-sorted, and the
    // sort is stable.
    let mut ranked: Vec<usize> = (0..groups.len()).collect();
    ranked.sort_by_key(|&i| groups[i].category.tier());

    let total: f64 = groups.iter().map(|g| g.total_weight).sum();
    let anchor = ranked[0];
    let feature = ranked[1];
    let rest = &ranked[2..];

    let mut regions = vec![Rect::default(); groups.len()];

    let anchor_share = ratio(groups[anchor].total_weight, total)
        .clamp(config.anchor_floor, config.anchor_cap.max(config.anchor_floor));
    let columns = tile(
        region,
        &[anchor_share, 1.0 - anchor_share],
        0.0,
        gap,
        Axis::SideBySide,
    );
    regions[anchor] = columns[0];
    let right = columns[1];

    let right_weight = total - groups[anchor].total_weight;
    let feature_share = ratio(groups[feature].total_weight, right_weight)
        .clamp(config.feature_floor, config.feature_cap.max(config.feature_floor));
    let right_rows = tile(
        right,
        &[feature_share, 1.0 - feature_share],
        0.0,
        gap,
        Axis::Stacked,
    );
    regions[feature] = right_rows[0];
    let grid = right_rows[1];

    let rows: Vec<&[usize]> = rest.chunks(2).collect();
    let row_weights: Vec<f64> = rows
        .iter()
        .map(|row| row.iter().map(|&i| groups[i].total_weight).sum())
        .collect();
    let row_rects = tile(grid, &row_weights, 0.0, gap, Axis::Stacked);

    for (row, row_rect) in rows.iter().zip(row_rects) {
        let cell_weights: Vec<f64> = row.iter().map(|&i| groups[i].total_weight).collect();
        let cells = tile(row_rect, &cell_weights, 0.0, gap, Axis::SideBySide);
        for (&i, cell) in row.iter().zip(cells) {
            regions[i] = cell;
        }
    }

    regions
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, weight: f64, category: Category) -> LayoutItem {
        LayoutItem::new(name, weight, category)
    }

    fn one_per_category(weights: &[(Category, f64)]) -> Vec<LayoutItem> {
        weights
            .iter()
            .map(|&(c, w)| item(c.as_str(), w, c))
            .collect()
    }

    fn sections_for(
        weights: &[(Category, f64)],
        width: f64,
        height: f64,
    ) -> (Vec<Section>, ViewportClass) {
        let viewport = ViewportClass::from_width(width);
        let sections = allocate_sections(
            one_per_category(weights),
            Rect::new(0.0, 0.0, width, height),
            viewport,
            &LayoutConfig::default(),
        );
        (sections, viewport)
    }

    fn find(sections: &[Section], category: Category) -> &Section {
        sections.iter().find(|s| s.category == category).unwrap()
    }

    fn assert_partitioned(sections: &[Section], canvas: Rect, gap: f64) {
        let interior = canvas.inset(gap);
        for (i, a) in sections.iter().enumerate() {
            assert!(a.rect.area() > 0.0, "{:?} has no area", a.category);
            assert!(interior.contains_rect(&a.rect, 1e-9), "{:?} escapes", a.category);
            for b in &sections[i + 1..] {
                assert_eq!(a.rect.intersection_area(&b.rect), 0.0, "{:?}/{:?}", a.category, b.category);
            }
        }

        // Every interior point is inside a section or within a gap of one.
        let step = 7.0;
        let mut y = interior.y + 0.5;
        while y < interior.bottom() {
            let mut x = interior.x + 0.5;
            while x < interior.right() {
                let covered = sections.iter().any(|s| {
                    Rect::new(s.rect.x - gap, s.rect.y - gap, s.rect.w + 2.0 * gap, s.rect.h + 2.0 * gap)
                        .contains(x, y)
                });
                assert!(covered, "({x}, {y}) is not covered");
                x += step;
            }
            y += step;
        }
    }

    #[test]
    fn groups_sorted_by_total_weight() {
        let items = vec![
            item("a", 10.0, Category::Public),
            item("b", 30.0, Category::Etf),
            item("c", 15.0, Category::Public),
            item("d", 1.0, Category::Defi),
        ];
        let groups = group_by_category(items);
        let order: Vec<Category> = groups.iter().map(|g| g.category).collect();
        assert_eq!(order, [Category::Etf, Category::Public, Category::Defi]);
        assert_eq!(groups[1].total_weight, 25.0);
        assert_eq!(groups[1].items[0].name, "c");
    }

    #[test]
    fn no_items_no_sections() {
        let sections = allocate_sections(
            Vec::new(),
            Rect::new(0.0, 0.0, 1200.0, 700.0),
            ViewportClass::Desktop,
            &LayoutConfig::default(),
        );
        assert!(sections.is_empty());
    }

    #[test]
    fn two_categories_split_side_by_side_by_weight() {
        let (sections, viewport) =
            sections_for(&[(Category::Public, 600.0), (Category::Etf, 200.0)], 1000.0, 500.0);
        assert_eq!(viewport, ViewportClass::Tablet);
        assert_eq!(sections.len(), 2);

        let public = find(&sections, Category::Public);
        let etf = find(&sections, Category::Etf);
        let gap = viewport.gap();
        let share = public.rect.w / (public.rect.w + etf.rect.w);
        assert!((share - 0.75).abs() < 0.01, "share {share}");
        assert!(public.rect.x < etf.rect.x);
        assert_eq!(public.rect.h, 500.0 - 2.0 * gap);
        assert_eq!(etf.rect.h, 500.0 - 2.0 * gap);
        assert_eq!(public.rect.w + gap + etf.rect.w, 1000.0 - 2.0 * gap);
        assert_partitioned(&sections, Rect::new(0.0, 0.0, 1000.0, 500.0), gap);
    }

    #[test]
    fn two_way_split_on_forced_desktop_class() {
        let canvas = Rect::new(0.0, 0.0, 1000.0, 500.0);
        let sections = allocate_sections(
            one_per_category(&[(Category::Private, 200.0), (Category::Government, 600.0)]),
            canvas,
            ViewportClass::Desktop,
            &LayoutConfig::default(),
        );
        let gap = ViewportClass::Desktop.gap();
        assert_eq!(sections[0].category, Category::Government);
        assert!((sections[0].rect.w - 0.75 * (1000.0 - 3.0 * gap)).abs() <= 1.0);
        assert!((sections[1].rect.w - 0.25 * (1000.0 - 3.0 * gap)).abs() <= 1.0);
        assert_partitioned(&sections, canvas, gap);
    }

    #[test]
    fn two_way_split_keeps_minor_category_visible() {
        let (sections, _) =
            sections_for(&[(Category::Public, 10_000.0), (Category::Defi, 1.0)], 1200.0, 700.0);
        let public = find(&sections, Category::Public);
        let defi = find(&sections, Category::Defi);
        let share = defi.rect.w / (public.rect.w + defi.rect.w);
        assert!(share >= ViewportClass::Desktop.two_way_minor_share() - 0.01);
    }

    #[test]
    fn two_way_minor_floor_depends_on_viewport() {
        let lopsided = [(Category::Public, 10_000.0), (Category::Defi, 1.0)];
        for (width, height) in [(375.0, 700.0), (800.0, 600.0), (1600.0, 900.0)] {
            let (sections, viewport) = sections_for(&lopsided, width, height);
            let stacked = viewport.is_compact();
            let span = |s: &Section| if stacked { s.rect.h } else { s.rect.w };
            let minor = span(find(&sections, Category::Defi));
            let major = span(find(&sections, Category::Public));
            let share = minor / (minor + major);
            assert!(
                (share - viewport.two_way_minor_share()).abs() < 0.01,
                "{viewport:?}: minor share {share}"
            );
        }

        // A 3:1 split is above every floor and passes through as is.
        let (sections, viewport) =
            sections_for(&[(Category::Public, 600.0), (Category::Etf, 200.0)], 375.0, 700.0);
        assert!(viewport.is_compact());
        let share = sections[0].rect.h / (sections[0].rect.h + sections[1].rect.h);
        assert!((share - 0.75).abs() < 0.01, "share {share}");
    }

    #[test]
    fn two_categories_stack_on_mobile() {
        let (sections, viewport) =
            sections_for(&[(Category::Public, 600.0), (Category::Etf, 200.0)], 375.0, 700.0);
        assert_eq!(viewport, ViewportClass::Mobile);
        let public = find(&sections, Category::Public);
        let etf = find(&sections, Category::Etf);
        assert_eq!(public.rect.x, etf.rect.x);
        assert!(public.rect.bottom() < etf.rect.y);
        assert!(public.rect.h > etf.rect.h);
        assert_partitioned(&sections, Rect::new(0.0, 0.0, 375.0, 700.0), viewport.gap());
    }

    #[test]
    fn three_categories_side_by_side_with_minimum_width() {
        let weights = [
            (Category::Public, 1_000.0),
            (Category::Government, 300.0),
            (Category::Exchange, 5.0),
        ];
        let (sections, viewport) = sections_for(&weights, 1280.0, 720.0);
        assert_eq!(viewport, ViewportClass::Desktop);
        assert_eq!(sections.len(), 3);

        let xs: Vec<f64> = sections.iter().map(|s| s.rect.x).collect();
        assert!(xs.windows(2).all(|p| p[0] < p[1]));
        for s in &sections {
            assert!(s.rect.w >= viewport.min_section_width() - 1.0);
            assert_eq!(s.rect.h, 720.0 - 2.0 * viewport.gap());
        }
        assert!(sections[0].rect.w > sections[1].rect.w);
        assert_partitioned(&sections, Rect::new(0.0, 0.0, 1280.0, 720.0), viewport.gap());
    }

    #[test]
    fn mobile_stacks_many_categories_with_height_floor() {
        let weights = [
            (Category::Public, 10_000.0),
            (Category::Private, 10.0),
            (Category::Government, 5.0),
            (Category::Exchange, 1.0),
        ];
        let (sections, viewport) = sections_for(&weights, 390.0, 844.0);
        assert_eq!(sections.len(), 4);
        let mut last_bottom = 0.0;
        for s in &sections {
            assert!(s.rect.h >= viewport.min_section_height() - 1.0);
            assert!(s.rect.y > last_bottom);
            last_bottom = s.rect.bottom();
        }
        assert_partitioned(&sections, Rect::new(0.0, 0.0, 390.0, 844.0), viewport.gap());
    }

    #[test]
    fn six_categories_use_tier_grid() {
        let weights = [
            (Category::Public, 800.0),
            (Category::Private, 300.0),
            (Category::Government, 500.0),
            (Category::Defi, 100.0),
            (Category::Exchange, 600.0),
            (Category::Etf, 1_100.0),
        ];
        let (sections, viewport) = sections_for(&weights, 1440.0, 900.0);
        assert_eq!(viewport, ViewportClass::Ultrawide);
        assert_eq!(sections.len(), 6);
        let gap = viewport.gap();
        let interior = Rect::new(0.0, 0.0, 1440.0, 900.0).inset(gap);

        // Public: full-height left column.
        let public = find(&sections, Category::Public);
        assert_eq!(public.rect.x, interior.x);
        assert_eq!(public.rect.y, interior.y);
        assert_eq!(public.rect.h, interior.h);
        assert!(public.rect.w >= 0.30 * (interior.w - gap) - 1.0);

        // ETF: top of the right column, spanning its width.
        let etf = find(&sections, Category::Etf);
        assert_eq!(etf.rect.y, interior.y);
        assert_eq!(etf.rect.x, public.rect.right() + gap);
        assert_eq!(etf.rect.right(), interior.right());

        // The other four: 2x2 below the ETF cell.
        let grid: Vec<&Section> = sections
            .iter()
            .filter(|s| !matches!(s.category, Category::Public | Category::Etf))
            .collect();
        assert_eq!(grid.len(), 4);
        for s in &grid {
            assert!(s.rect.y >= etf.rect.bottom() + gap);
            assert!(s.rect.x >= etf.rect.x);
        }
        let mut columns: Vec<f64> = grid.iter().map(|s| s.rect.x).collect();
        columns.sort_by(f64::total_cmp);
        columns.dedup();
        let mut rows: Vec<f64> = grid.iter().map(|s| s.rect.y).collect();
        rows.sort_by(f64::total_cmp);
        rows.dedup();
        assert_eq!(rows.len(), 2);
        assert!(columns.len() >= 2 && columns.len() <= 4);

        assert_partitioned(&sections, Rect::new(0.0, 0.0, 1440.0, 900.0), gap);
    }

    #[test]
    fn five_categories_leave_a_single_cell_last_row() {
        let weights = [
            (Category::Public, 900.0),
            (Category::Etf, 700.0),
            (Category::Exchange, 400.0),
            (Category::Government, 300.0),
            (Category::Defi, 100.0),
        ];
        let (sections, viewport) = sections_for(&weights, 1280.0, 800.0);
        assert_eq!(viewport, ViewportClass::Desktop);
        assert_eq!(sections.len(), 5);
        let gap = viewport.gap();
        let etf = find(&sections, Category::Etf);

        // Exchange and Government share the first grid row.
        let exchange = find(&sections, Category::Exchange);
        let government = find(&sections, Category::Government);
        assert_eq!(exchange.rect.y, etf.rect.bottom() + gap);
        assert_eq!(government.rect.y, exchange.rect.y);
        assert_eq!(exchange.rect.x, etf.rect.x);
        assert_eq!(government.rect.x, exchange.rect.right() + gap);
        assert_eq!(government.rect.right(), etf.rect.right());
        assert!(exchange.rect.w > government.rect.w);

        // DeFi alone spans the full right column in the last row.
        let defi = find(&sections, Category::Defi);
        assert_eq!(defi.rect.y, exchange.rect.bottom() + gap);
        assert_eq!(defi.rect.x, etf.rect.x);
        assert_eq!(defi.rect.w, etf.rect.w);
        assert!(defi.rect.area() > 0.0);

        assert_partitioned(&sections, Rect::new(0.0, 0.0, 1280.0, 800.0), gap);
    }

    #[test]
    fn grid_without_public_promotes_next_ranked_category() {
        let weights = [
            (Category::Private, 50.0),
            (Category::Government, 500.0),
            (Category::Exchange, 200.0),
            (Category::Etf, 300.0),
        ];
        let (sections, viewport) = sections_for(&weights, 1280.0, 800.0);
        let gap = viewport.gap();
        let interior = Rect::new(0.0, 0.0, 1280.0, 800.0).inset(gap);

        // ETF outranks the grid tier and takes the left column.
        let etf = find(&sections, Category::Etf);
        assert_eq!(etf.rect.x, interior.x);
        assert_eq!(etf.rect.h, interior.h);

        // Heaviest grid-tier category takes the top-right cell.
        let government = find(&sections, Category::Government);
        assert_eq!(government.rect.y, interior.y);
        assert_eq!(government.rect.right(), interior.right());

        assert_partitioned(&sections, Rect::new(0.0, 0.0, 1280.0, 800.0), gap);
    }

    #[test]
    fn distribute_honors_floor_and_total() {
        let spans = distribute(900.0, &[1000.0, 10.0, 1.0], 150.0);
        assert_eq!(spans.iter().sum::<f64>(), 900.0);
        assert!(spans.iter().all(|&s| s >= 150.0));
        assert!(spans[0] > spans[1]);

        // Floors that cannot fit shrink to an even share.
        let tight = distribute(200.0, &[5.0, 1.0, 1.0, 1.0], 100.0);
        assert_eq!(tight.iter().sum::<f64>(), 200.0);
        assert!(tight.iter().all(|&s| s >= 49.0));
    }

    #[test]
    fn section_interior_excludes_header() {
        let (sections, viewport) = sections_for(&[(Category::Defi, 1.0)], 800.0, 600.0);
        let s = &sections[0];
        assert_eq!(s.header_height, viewport.header_height());
        assert_eq!(s.interior().y, s.rect.y + s.header_height);
        assert_eq!(s.interior().h, s.rect.h - s.header_height);
        assert!(s.header_fits(viewport));
        assert!((s.share_percent(4.0) - 25.0).abs() < 1e-9);
    }
}
