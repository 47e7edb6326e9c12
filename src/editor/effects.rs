use image::imageops;
use image::RgbaImage;
use log::debug;

use crate::error::EffectsError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Orientation transform applied to the base capture only, never to drawings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostEffects {
    angle: f64,
    flip_x: i8,
    flip_y: i8,
}

impl Default for PostEffects {
    fn default() -> Self {
        Self {
            angle: 0.0,
            flip_x: 1,
            flip_y: 1,
        }
    }
}

impl PostEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn toggle_flip(&mut self, axis: FlipAxis) {
        match axis {
            FlipAxis::Horizontal => self.flip_x = -self.flip_x,
            FlipAxis::Vertical => self.flip_y = -self.flip_y,
        }
        debug!("Flip is now ({}, {})", self.flip_x, self.flip_y);
    }

    /// Stores the angle wrapped into [0, 360).
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle.rem_euclid(360.0);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns a transformed copy; the input bitmap is never touched.
    pub fn apply(&self, image: &RgbaImage) -> Result<RgbaImage, EffectsError> {
        if self.angle != 0.0 {
            return Err(EffectsError::RotationUnsupported(self.angle));
        }

        let out = match (self.flip_x, self.flip_y) {
            (-1, -1) => imageops::rotate180(image),
            (-1, _) => imageops::flip_horizontal(image),
            (_, -1) => imageops::flip_vertical(image),
            _ => image.clone(),
        };

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient() -> RgbaImage {
        RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 0, 255]))
    }

    #[test]
    fn test_horizontal_flip_is_self_inverse() {
        let original = gradient();
        let mut effects = PostEffects::new();
        effects.toggle_flip(FlipAxis::Horizontal);

        let once = effects.apply(&original).unwrap();
        assert_eq!(once.get_pixel(0, 0), original.get_pixel(3, 0));

        let twice = effects.apply(&once).unwrap();
        assert_eq!(twice, original);
    }

    #[test]
    fn test_both_flips_mirror_both_axes() {
        let original = gradient();
        let mut effects = PostEffects::new();
        effects.toggle_flip(FlipAxis::Horizontal);
        effects.toggle_flip(FlipAxis::Vertical);

        let out = effects.apply(&original).unwrap();
        assert_eq!(out.get_pixel(0, 0), original.get_pixel(3, 2));
    }

    #[test]
    fn test_toggle_twice_restores_identity() {
        let mut effects = PostEffects::new();
        effects.toggle_flip(FlipAxis::Vertical);
        effects.toggle_flip(FlipAxis::Vertical);
        assert!(effects.is_identity());
    }

    #[test]
    fn test_angle_wraps_and_rotation_is_unsupported() {
        let mut effects = PostEffects::new();
        effects.set_angle(-90.0);
        assert_eq!(effects.angle(), 270.0);
        effects.set_angle(720.0);
        assert_eq!(effects.angle(), 0.0);

        effects.set_angle(90.0);
        assert!(matches!(
            effects.apply(&gradient()),
            Err(EffectsError::RotationUnsupported(_))
        ));

        effects.clear();
        assert!(effects.is_identity());
    }
}
