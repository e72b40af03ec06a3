//! Per-draw constant blocks handed to the backend as raw bytes
#![allow(unsafe_code)] // bytemuck derives emit unsafe impls

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Vec3};

/// Per-instance draw data
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceConstants {
    /// Transposed world matrix, row-major as the shaders read it
    pub model: [[f32; 4]; 4],
    /// RGBA tint
    pub color: [f32; 4],
}

impl InstanceConstants {
    /// Constants for an already transposed world matrix
    pub fn new(gpu_matrix: &Mat4, color: [f32; 4]) -> Self {
        Self {
            model: matrix_rows(gpu_matrix),
            color,
        }
    }

    /// Bytes as uploaded
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Point-light parameters for a light-volume draw
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightConstants {
    /// Transposed world matrix of the light volume, already scaled by radius
    pub model: [[f32; 4]; 4],
    /// RGB colour, intensity in `w`
    pub color_intensity: [f32; 4],
    /// World position, radius in `w`
    pub position_radius: [f32; 4],
}

impl LightConstants {
    /// Constants for a light at `position`
    pub fn new(gpu_matrix: &Mat4, color: Vec3, intensity: f32, position: Vec3, radius: f32) -> Self {
        Self {
            model: matrix_rows(gpu_matrix),
            color_intensity: [color.x, color.y, color.z, intensity],
            position_radius: [position.x, position.y, position.z, radius],
        }
    }

    /// Bytes as uploaded
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Flatten a matrix into row arrays (nalgebra stores columns)
fn matrix_rows(m: &Mat4) -> [[f32; 4]; 4] {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)];
        }
    }
    rows
}
