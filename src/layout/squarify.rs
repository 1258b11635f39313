use super::Rect;
use crate::entity::normalize::LayoutItem;

/// Binary squarified layout.
///
/// Splits the (weight-sorted) list at its midpoint, cuts `rect` along its
/// longer side in proportion to the first half's share of the weight, and
/// recurses into both halves. The output has one rect per weight, in input
/// order, and the rects tile `rect` exactly.
pub fn squarify(weights: &[f64], rect: Rect) -> Vec<Rect> {
    let mut result = Vec::with_capacity(weights.len());
    bisect(weights, rect, &mut result);
    result
}

fn bisect(weights: &[f64], rect: Rect, out: &mut Vec<Rect>) {
    match weights.len() {
        0 => {}
        1 => out.push(rect),
        n => {
            let (head, tail) = weights.split_at(n / 2);
            let head_sum: f64 = head.iter().sum();
            let total = head_sum + tail.iter().sum::<f64>();
            // Zero-weight pairs split evenly instead of producing NaN.
            let fraction = if total > 0.0 {
                (head_sum / total).clamp(0.0, 1.0)
            } else {
                0.5
            };
            let (first, second) = rect.split_longer(fraction);
            bisect(head, first, out);
            bisect(tail, second, out);
        }
    }
}

/// Place `items` inside `rect` inset by `padding` on every side.
/// Returns the items with their `rect` filled in, order unchanged.
pub fn pack_items(items: Vec<LayoutItem>, rect: Rect, padding: f64) -> Vec<LayoutItem> {
    let inner = rect.inset(padding);
    let weights: Vec<f64> = items.iter().map(|item| item.weight).collect();
    let rects = squarify(&weights, inner);

    items
        .into_iter()
        .zip(rects)
        .map(|(item, rect)| LayoutItem { rect, ..item })
        .collect()
}
