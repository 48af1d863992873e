use foundation::time::Time;

/// Metadata for one animation tick.
///
/// Ticks are counted, not timed: `time` is derived from the index and a fixed
/// step so a run can be replayed exactly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based tick index.
    pub index: u64,
    /// Fixed step (seconds).
    pub dt_s: f64,
    /// Nominal time at the start of the tick (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn first(dt_s: f64) -> Self {
        Self::new(0, dt_s)
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn first_frame_starts_at_zero() {
        let f = Frame::first(1.0 / 60.0);
        assert_eq!(f.index, 0);
        assert_eq!(f.time, Time(0.0));
    }

    #[test]
    fn next_advances_index_and_time() {
        let f1 = Frame::first(0.5).next();
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(0.5));
    }
}
