//! Stepper — a 1-based linear step sequence, one step at a time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChange {
    /// Moved to a neighbouring step.
    Moved { from: usize, to: usize },
    /// `advance` from the last step: run completion, stay put.
    Completed,
    /// `retreat` from the first step.
    Blocked,
}

#[derive(Debug, Clone)]
pub struct Stepper {
    current: usize,
    total: usize,
}

impl Stepper {
    /// `total` is clamped to at least one step; `initial` into `1..=total`.
    pub fn new(total: usize, initial: usize) -> Self {
        let total = total.max(1);
        Self {
            current: initial.clamp(1, total),
            total,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    pub fn advance(&mut self) -> StepChange {
        if self.current < self.total {
            let from = self.current;
            self.current += 1;
            StepChange::Moved {
                from,
                to: self.current,
            }
        } else {
            StepChange::Completed
        }
    }

    pub fn retreat(&mut self) -> StepChange {
        if self.current > 1 {
            let from = self.current;
            self.current -= 1;
            StepChange::Moved {
                from,
                to: self.current,
            }
        } else {
            StepChange::Blocked
        }
    }
}
