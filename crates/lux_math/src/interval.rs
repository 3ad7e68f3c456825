/// Range of ray distances or channel values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Closed `[0, 1]`, the displayable range of a color channel.
    pub const UNIT: Interval = Interval::new(0.0, 1.0);

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Open containment `min < x < max`. NaN is never surrounded.
    #[inline]
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// Clamp `x` into `[min, max]`, passing NaN through.
    #[inline]
    pub fn clamp(&self, x: f32) -> f32 {
        x.clamp(self.min, self.max)
    }
}
