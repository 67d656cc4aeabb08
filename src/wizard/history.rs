//! Visited-steps stack; its top is the step cursor.

use serde::{Deserialize, Serialize};

/// Ordered list of visited step indices. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepHistory {
    steps: Vec<usize>,
}

impl StepHistory {
    pub fn new(first: usize) -> Self {
        Self { steps: vec![first] }
    }

    /// The current step.
    pub fn current(&self) -> usize {
        // `steps` always holds at least the first step.
        self.steps.last().copied().unwrap_or_default()
    }

    pub fn push(&mut self, step: usize) {
        self.steps.push(step);
    }

    /// Pop the current step, returning `(left, now_current)`.
    /// Returns `None` when only the first step remains.
    pub fn pop(&mut self) -> Option<(usize, usize)> {
        if self.steps.len() <= 1 {
            return None;
        }
        let left = self.steps.pop()?;
        Some((left, self.current()))
    }

    pub fn can_go_back(&self) -> bool {
        self.steps.len() > 1
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
