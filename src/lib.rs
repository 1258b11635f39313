// Public library interface for holdmap-rs
// The CLI and diagnostic binaries use the same modules.

pub mod entity;
pub mod layout;

pub use entity::normalize::{normalize, LayoutItem, Metric};
pub use entity::RawEntity;
pub use layout::sections::Section;
pub use layout::viewport::ViewportClass;
pub use layout::{compute_layout, layout, Layout, LayoutConfig, Rect};
