use nalgebra::{Point3, Vector3};

/// Edge lengths and per-axis periodicity of an orthorhombic simulation box.
///
/// Owned by the host; the dipolar engines only read it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    length: Vector3<f64>,
    periodic: [bool; 3],
}

impl BoxGeometry {
    pub fn new(length: Vector3<f64>, periodic: [bool; 3]) -> Self {
        Self { length, periodic }
    }

    /// A cubic box periodic along all three axes.
    pub fn cubic(edge: f64) -> Self {
        Self::new(Vector3::repeat(edge), [true; 3])
    }

    pub fn length(&self) -> &Vector3<f64> {
        &self.length
    }

    pub fn set_length(&mut self, length: Vector3<f64>) {
        self.length = length;
    }

    pub fn periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    pub fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn volume(&self) -> f64 {
        self.length.x * self.length.y * self.length.z
    }

    /// Wraps a position into the primary box `[0, L)` along every periodic axis.
    /// Non-periodic coordinates are returned unchanged.
    pub fn fold_position(&self, position: &Point3<f64>) -> Point3<f64> {
        let mut folded = *position;
        for axis in 0..3 {
            if self.periodic[axis] {
                let l = self.length[axis];
                let mut x = folded[axis] - (folded[axis] / l).floor() * l;
                // Rounding can land exactly on the upper edge for tiny negatives.
                if x >= l {
                    x -= l;
                }
                folded[axis] = x;
            }
        }
        folded
    }

    /// Displacement `a - b` using the nearest periodic image along periodic axes.
    pub fn minimum_image(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
        let mut d = a - b;
        for axis in 0..3 {
            if self.periodic[axis] {
                let l = self.length[axis];
                d[axis] -= (d[axis] / l).round() * l;
            }
        }
        d
    }
}
