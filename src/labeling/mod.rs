pub mod bounding_box;
pub mod exporter;
pub mod projector;

pub use bounding_box::{BoundingBox, Label};
pub use exporter::{export, ExportSummary};
pub use projector::{project, Projection, RejectReason};
