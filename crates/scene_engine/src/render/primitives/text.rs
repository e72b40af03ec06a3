//! World-anchored text labels

use crate::foundation::math::{Vec3, Vec4};

/// Text drawn at the entity's position plus an offset
///
/// Labels do not contribute to the entity bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    /// Text to draw
    pub text: String,
    /// Local offset from the entity origin
    pub offset: Vec3,
    /// RGBA colour
    pub color: Vec4,
}

impl TextLabel {
    /// White label at the entity origin
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            offset: Vec3::zeros(),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }

    /// Builder pattern: Set offset
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}
