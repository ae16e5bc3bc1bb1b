//! Circle-to-ask: freehand selection over rendered notes.
//!
//! A stroke drawn over a message is reduced to its bounding box
//! ([`stroke`]), intersected with the message's registered line regions
//! ([`hit_test`]), flashed for feedback ([`highlight`]) and finally turned
//! into a follow-up question ([`bridge`]). [`overlay`] owns that flow for a
//! single message.

pub mod bridge;
pub mod highlight;
pub mod overlay;
pub mod stroke;

pub use bridge::{SelectionSink, bridge_selection, explain_prompt};
pub use highlight::HighlightTracker;
pub use hit_test::{AnnotatableElement, ElementId, OverlapPolicy, SelectionResult, resolve};
pub use overlay::{AnnotationOverlay, OverlayPhase};
pub use stroke::StrokeTracker;
