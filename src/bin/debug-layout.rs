/// Diagnostic tool to verify the entities → items → sections → rects pipeline
use holdmap_rs::entity::load_entities;
use holdmap_rs::{compute_layout, normalize, LayoutConfig, Metric, ViewportClass};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("holdmap_rs=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("entities.json"));
    let width: f64 = args.next().map(|s| s.parse::<f64>()).transpose()?.unwrap_or(1920.0);
    let height: f64 = args.next().map(|s| s.parse::<f64>()).transpose()?.unwrap_or(1080.0);

    println!("=== DIAGNOSTIC: Entities → Layout Pipeline ===");
    println!("Loading: {}", path.display());

    let entities = load_entities(&path)?;
    println!("\n[1] Loaded {} entities", entities.len());

    let config = LayoutConfig::default();
    let viewport = ViewportClass::from_width(width);
    println!(
        "    Canvas {:.0}x{:.0} → {:?} (gap={}, header={})",
        width,
        height,
        viewport,
        viewport.gap(),
        viewport.header_height()
    );

    for metric in Metric::ALL {
        println!("\n=== Metric: {} ===", metric);

        let items = normalize(&entities, metric, &config);
        println!(
            "\n[2] Normalized: {} items ({} dropped)",
            items.len(),
            entities.len() - items.len()
        );
        for (i, item) in items.iter().take(10).enumerate() {
            println!(
                "    [{}] '{}' - {} ({:?})",
                i, item.name, item.display_value, item.category
            );
        }

        let layout = compute_layout(items, metric, width, height, viewport, &config);
        let total = layout.total_weight();

        println!("\n[3] Sections: {}", layout.sections.len());
        for section in &layout.sections {
            println!(
                "    {:<18} {:>3} items  {:>6.2}%  rect: {:.0}x{:.0} at ({:.0}, {:.0})",
                section.label,
                section.items.len(),
                section.share_percent(total),
                section.rect.w,
                section.rect.h,
                section.rect.x,
                section.rect.y
            );
        }

        println!("\n[4] Top 10 largest rectangles by area:");
        let mut placed: Vec<_> = layout.items().collect();
        placed.sort_by(|a, b| b.rect.area().total_cmp(&a.rect.area()));
        for (i, item) in placed.iter().take(10).enumerate() {
            println!(
                "    [{}] '{}' - rect: {:.1}x{:.1} ({:.0}px²) at ({:.1}, {:.1})",
                i,
                item.name,
                item.rect.w,
                item.rect.h,
                item.rect.area(),
                item.rect.x,
                item.rect.y
            );
        }

        println!("\n[5] Checking for anomalies:");
        let section_area: f64 = layout.sections.iter().map(|s| s.rect.area()).sum();
        let canvas_area = layout.canvas.area().max(1.0);
        println!("    Section area: {:.0}px²", section_area);
        println!("    Canvas area:  {:.0}px²", canvas_area);
        println!("    Coverage: {:.1}%", section_area / canvas_area * 100.0);

        let mut overlaps = 0usize;
        let mut escapes = 0usize;
        for section in &layout.sections {
            let interior = section.interior();
            for (i, a) in section.items.iter().enumerate() {
                if !interior.contains_rect(&a.rect, 1e-6) {
                    escapes += 1;
                }
                overlaps += section.items[i + 1..]
                    .iter()
                    .filter(|b| a.rect.intersection_area(&b.rect) > 1e-6)
                    .count();
            }
        }
        println!("    Overlapping pairs: {}", overlaps);
        println!("    Rects outside their section: {}", escapes);

        let labeled = layout.items().filter(|i| i.label_fits(viewport)).count();
        println!(
            "\n[6] Text label count: {} rects (out of {})",
            labeled,
            layout.item_count()
        );
    }

    Ok(())
}
