// Common trait for spaces.

use crate::utils::rng::PrngKey;

/// A trait implemented by all spaces.
/// Element is the value type that lives in the space (e.g. `i64` for Discrete,
/// or an n-dimensional array for a BoxSpace).
pub trait Space {
    type Element;

    /// Draw a sample from the space, consuming `key`.
    fn sample(&self, key: PrngKey) -> Self::Element;

    /// Return true if the given element is a valid member of the space.
    ///
    /// Total for any element of the right Rust type: structurally mismatched
    /// values (wrong shape, missing entries) are reported as not contained.
    fn contains(&self, elem: &Self::Element) -> bool;
}
