//! Freehand stroke tracking.
//!
//! A stroke is one continuous press-drag-release gesture. While it is active
//! the tracker keeps a running bounding box plus the ink trail that the
//! overlay paints. Coordinates are relative to the annotation surface, not the
//! viewport.

use crate::constants::MIN_STROKE_EXTENT;
use crate::geometry::{Bounds, Point};

#[derive(Debug, Clone)]
struct Stroke {
    bounds: Bounds,
    trail: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct StrokeTracker {
    stroke: Option<Stroke>,
    min_extent: f32,
}

impl Default for StrokeTracker {
    fn default() -> Self {
        Self::new(MIN_STROKE_EXTENT)
    }
}

impl StrokeTracker {
    pub fn new(min_extent: f32) -> Self {
        Self {
            stroke: None,
            min_extent,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stroke.is_some()
    }

    /// Start a stroke at `point`. Rejected while annotation mode is off or a
    /// stroke is already in progress.
    pub fn begin(&mut self, point: Point, mode_active: bool) -> bool {
        if !mode_active || self.stroke.is_some() {
            return false;
        }
        self.stroke = Some(Stroke {
            bounds: Bounds::at(point),
            trail: vec![point],
        });
        true
    }

    /// Add a movement sample to the active stroke.
    pub fn extend(&mut self, point: Point) -> bool {
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        stroke.bounds.include(point);
        stroke.trail.push(point);
        true
    }

    /// Finish the stroke and hand back its box, unless it was too small to be
    /// anything but a tap.
    pub fn end(&mut self) -> Option<Bounds> {
        let stroke = self.stroke.take()?;
        let bounds = stroke.bounds;
        if bounds.width() < self.min_extent && bounds.height() < self.min_extent {
            tracing::trace!(
                width = bounds.width(),
                height = bounds.height(),
                "stroke below threshold"
            );
            return None;
        }
        Some(bounds)
    }

    /// Drop the active stroke without producing a box.
    pub fn cancel(&mut self) {
        self.stroke = None;
    }

    /// Running box of the active stroke.
    pub fn bounds(&self) -> Option<Bounds> {
        self.stroke.as_ref().map(|s| s.bounds)
    }

    /// Ink trail of the active stroke, oldest sample first.
    pub fn trail(&self) -> &[Point] {
        self.stroke
            .as_ref()
            .map(|s| s.trail.as_slice())
            .unwrap_or(&[])
    }
}
