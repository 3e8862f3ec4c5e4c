use crate::settings::Vec2;

/// Rotation by a fixed angle, precomputed as the image of the positive x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotator {
    rot_vec: Vec2<f64>,
}

impl Default for Rotator {
    fn default() -> Self {
        Self {
            rot_vec: Vec2::new(1.0, 0.0),
        }
    }
}

impl Rotator {
    pub fn new(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            rot_vec: Vec2::new(cos, sin),
        }
    }

    #[inline]
    pub fn apply(&self, input: Vec2<f64>) -> Vec2<f64> {
        let r = self.rot_vec;
        Vec2::new(
            input.x * r.x - input.y * r.y,
            input.x * r.y + input.y * r.x,
        )
    }
}
