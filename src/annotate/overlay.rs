//! Per-message annotation overlay.
//!
//! Wires the stroke tracker, hit tester and highlight feedback into the
//! overlay lifecycle:
//!
//! ```text
//! Idle -> (mode on) -> Armed -> (press) -> Drawing -> (release) -> Resolving -> Armed
//! ```
//!
//! Turning annotation mode off from any phase returns to `Idle` and drops the
//! in-progress stroke. The overlay never talks to the conversation directly;
//! callers pass the returned [`SelectionResult`] through the bridge.

use std::time::Instant;

use crate::annotate::highlight::HighlightTracker;
use crate::annotate::hit_test::{AnnotatableElement, OverlapPolicy, SelectionResult, resolve};
use crate::annotate::stroke::StrokeTracker;
use crate::constants::MIN_STROKE_EXTENT;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Idle,
    Armed,
    Drawing,
    Resolving,
}

#[derive(Debug, Clone)]
pub struct AnnotationOverlay {
    tracker: StrokeTracker,
    phase: OverlayPhase,
    policy: OverlapPolicy,
}

impl Default for AnnotationOverlay {
    fn default() -> Self {
        Self::new(MIN_STROKE_EXTENT, OverlapPolicy::default())
    }
}

impl AnnotationOverlay {
    pub fn new(min_extent: f32, policy: OverlapPolicy) -> Self {
        Self {
            tracker: StrokeTracker::new(min_extent),
            phase: OverlayPhase::Idle,
            policy,
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn is_armed(&self) -> bool {
        self.phase != OverlayPhase::Idle
    }

    pub fn is_drawing(&self) -> bool {
        self.phase == OverlayPhase::Drawing
    }

    /// Follow the screen's annotation flag.
    pub fn set_mode(&mut self, active: bool) {
        if active {
            if self.phase == OverlayPhase::Idle {
                self.phase = OverlayPhase::Armed;
            }
            return;
        }
        if self.tracker.is_active() {
            tracing::debug!("annotation mode left mid-stroke; stroke abandoned");
        }
        self.tracker.cancel();
        self.phase = OverlayPhase::Idle;
    }

    /// Press inside the surface. `point` is surface-relative.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if !self.tracker.begin(point, self.is_armed()) {
            return false;
        }
        self.phase = OverlayPhase::Drawing;
        true
    }

    /// Drag sample, surface-relative.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        self.phase == OverlayPhase::Drawing && self.tracker.extend(point)
    }

    /// Button released over the surface.
    pub fn pointer_up(
        &mut self,
        origin: Point,
        registry: Option<&[AnnotatableElement]>,
        highlights: &mut HighlightTracker,
        now: Instant,
    ) -> Option<SelectionResult> {
        self.finish(origin, registry, highlights, now)
    }

    /// Pointer dragged off the surface while the button was held.
    pub fn pointer_leave(
        &mut self,
        origin: Point,
        registry: Option<&[AnnotatableElement]>,
        highlights: &mut HighlightTracker,
        now: Instant,
    ) -> Option<SelectionResult> {
        self.finish(origin, registry, highlights, now)
    }

    /// Ink trail of the stroke in progress, surface-relative.
    pub fn ink(&self) -> &[Point] {
        self.tracker.trail()
    }

    /// `origin` is the viewport position of the surface's top-left corner at
    /// release time; the stroke box is translated by it before hit testing.
    fn finish(
        &mut self,
        origin: Point,
        registry: Option<&[AnnotatableElement]>,
        highlights: &mut HighlightTracker,
        now: Instant,
    ) -> Option<SelectionResult> {
        if self.phase != OverlayPhase::Drawing {
            return None;
        }
        let Some(surface_box) = self.tracker.end() else {
            self.phase = OverlayPhase::Armed;
            return None;
        };
        self.phase = OverlayPhase::Resolving;
        let selection = surface_box.translate(origin.x, origin.y);
        let result = resolve(&selection, registry, self.policy);
        if let Some(found) = &result {
            highlights.flash(&found.matched, now);
            tracing::debug!(lines = found.matched.len(), "stroke resolved");
        }
        self.phase = OverlayPhase::Armed;
        result
    }
}
