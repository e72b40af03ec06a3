//! Bounding volumes for spatial queries and culling
//!
//! Axis-aligned boxes, spheres and view frustums. Every query here is
//! read-only; none of them mutate their inputs.

mod aabb;
mod sphere;
mod frustum;

pub use aabb::Aabb;
pub use sphere::BoundingSphere;
pub use frustum::{Frustum, Plane};

/// Result of a containment / intersection test
///
/// Ordered from "least overlap" to "most overlap" so callers can use `max`
/// and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Containment {
    /// The volumes do not overlap at all
    Outside,
    /// The volumes overlap but the tested volume is not fully contained
    Intersecting,
    /// The tested volume lies entirely within the other
    Inside,
}

impl Containment {
    /// True for `Intersecting` and `Inside`
    pub fn is_visible(self) -> bool {
        self != Self::Outside
    }
}
