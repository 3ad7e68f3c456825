//! Accumulation buffer written by the render workers.

use lux_core::Color;

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Row-major linear color buffer, row 0 at the top.
///
/// Holds the running mean across frames; the caller owns it and hands it to
/// the renderer every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl FrameBuffer {
    /// Create a new buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[y as usize * self.width as usize + x as usize] = color;
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Color::ZERO);
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_get_set_row_major() {
        let mut fb = FrameBuffer::new(4, 3);
        fb.set(1, 2, Color::ONE);

        assert_eq!(fb.get(1, 2), Color::ONE);
        assert_eq!(fb.pixels()[2 * 4 + 1], Color::ONE);
        assert_eq!(fb.pixels().len(), 12);
    }

    #[test]
    fn test_to_rgba8() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.set(0, 0, Color::new(1.0, 0.25, 0.0));
        fb.set(1, 0, Color::splat(f32::NAN));

        let bytes = fb.to_rgba8();
        assert_eq!(&bytes[0..4], &[255, 127, 0, 255]);
        // NaN channels fall to black rather than panicking
        assert_eq!(&bytes[4..8], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.set(1, 1, Color::ONE);
        fb.clear();
        assert!(fb.pixels().iter().all(|&c| c == Color::ZERO));
    }
}
