pub mod edit;
pub mod hit;
pub mod id;
pub mod model;
pub mod segment;

pub use edit::{GlyphError, SmartMovePlan};
pub use hit::{Endpoint, Hit, SegmentHit};
pub use id::{AnchorId, ContourId, PointId};
pub use model::*;
pub use segment::{Segment, SegmentKind};

// Re-export kurbo so downstream crates share one geometry version.
pub use kurbo;
