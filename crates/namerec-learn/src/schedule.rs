//! Step-size schedules for the subgradient update.

/// `η_t` as a function of the 1-based update index `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSchedule {
    /// `c / t`
    Harmonic { c: f64 },
    /// `c / √t`
    InverseSqrt { c: f64 },
}

impl StepSchedule {
    pub fn at(&self, t: usize) -> f64 {
        let t = t.max(1) as f64;
        match *self {
            StepSchedule::Harmonic { c } => c / t,
            StepSchedule::InverseSqrt { c } => c / t.sqrt(),
        }
    }

    /// The endless sequence `η_1, η_2, ...`.
    pub fn steps(self) -> Steps {
        Steps {
            schedule: self,
            t: 0,
        }
    }
}

impl Default for StepSchedule {
    fn default() -> Self {
        StepSchedule::Harmonic { c: 0.03 }
    }
}

/// Iterator over a [`StepSchedule`].
#[derive(Debug, Clone)]
pub struct Steps {
    schedule: StepSchedule,
    t: usize,
}

impl Iterator for Steps {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.t += 1;
        Some(self.schedule.at(self.t))
    }
}
