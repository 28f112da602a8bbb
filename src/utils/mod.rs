//! Utility functions for image processing
//!
//! This module provides helpers shared by every symbology:
//! - Grayscale conversion (RGB/RGBA/NV21 to luminance)
//! - Binarization (block-adaptive and Otsu)
//! - Geometry (perspective transforms, grid sampling)
//! - MSB-first bit streams
//! - Connected dark components

pub mod binarization;
pub mod bits;
pub mod components;
pub mod geometry;
pub mod grayscale;
