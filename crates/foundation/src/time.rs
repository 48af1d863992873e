/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn zero() -> Self {
        Time(0.0)
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}
