//! Planar geometry for board layouts.
//!
//! [`Polygon`] carries the primitives, [`cut`] splits a polygon with a line
//! or a circle, [`partition`] recursively splits a surface into area-balanced
//! cells and [`Layout`] hands those cells out with shuffled labels.

pub mod cut;
pub mod layout;
pub mod partition;
mod polygon;

pub use cut::{ArcSampling, Circle, Cut, Cuttable, Line, Side};
pub use layout::{Cell, Layout, LayoutKind};
pub use partition::{
    Partition, PartitionConfig, PartitionReport, Partitioner, centroid_split, partition,
};
pub use polygon::{Bounds, Point, Polygon, Vector};

/// Distance under which two vertices are treated as the same point.
pub const VERTEX_EPSILON: f64 = 1e-9;
