//! Test elements whose comparisons fail on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::compare::{Comparable, CompareError};

/// Integer element that can be armed to fail comparisons.
///
/// A trapped element fails whenever it is compared with an element holding the
/// trap value. One with a budget fails once the shared budget of
/// successful comparisons runs out.
#[derive(Debug, Clone)]
pub(crate) struct Faulty {
    pub(crate) value: i32,
    trap: Option<i32>,
    budget: Option<Arc<AtomicUsize>>,
}

impl Faulty {
    pub(crate) fn new(value: i32) -> Self {
        Self {
            value,
            trap: None,
            budget: None,
        }
    }

    pub(crate) fn trap(mut self, value: i32) -> Self {
        self.trap = Some(value);
        self
    }

    pub(crate) fn budget(mut self, budget: &Arc<AtomicUsize>) -> Self {
        self.budget = Some(Arc::clone(budget));
        self
    }
}

impl Comparable for Faulty {
    fn less(&self, other: &Self) -> Result<bool, CompareError> {
        if let Some(budget) = self.budget.as_ref().or(other.budget.as_ref()) {
            if budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
            {
                return Err(CompareError::Other("budget exhausted".into()));
            }
        }
        if self.trap == Some(other.value) || other.trap == Some(self.value) {
            return Err(CompareError::Other(format!(
                "trapped comparing {} with {}",
                self.value, other.value
            )));
        }
        Ok(self.value < other.value)
    }
}
