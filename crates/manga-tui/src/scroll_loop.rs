//! ScrollLoop — fakes an unbounded horizontal strip from a finite list.
//!
//! The list is rendered twice back to back. The host owns the scroll
//! offset; on every observation it hands the adapter its metrics and gets
//! back a rewritten offset when one of the two edges has been reached:
//!
//! - tail of the doubled strip  -> jump to 0
//! - very start (going back)    -> jump to the start of the second copy
//!
//! Both copies are identical, so either jump is invisible.

/// One observation of the host's scroll state, all in the same unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub viewport: f64,
    /// Width of the full doubled content.
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct ScrollLoop<T> {
    items: Vec<T>,
    epsilon: f64,
}

impl<T> ScrollLoop<T> {
    pub fn new(epsilon: f64) -> Self {
        Self {
            items: Vec::new(),
            epsilon: epsilon.max(0.0),
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn logical_len(&self) -> usize {
        self.items.len()
    }

    pub fn rendered_len(&self) -> usize {
        self.items.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `items ++ items`, paired with the logical index of each entry.
    pub fn rendered(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .chain(self.items.iter().enumerate())
    }

    /// Rewritten offset for this observation, or `None` to leave it alone.
    ///
    /// Bounds are re-checked on every call from the metrics given, never
    /// from an earlier observation.
    pub fn correct(&self, m: ScrollMetrics) -> Option<f64> {
        if self.items.is_empty() || m.total <= 0.0 {
            return None;
        }
        if m.offset + m.viewport >= m.total - self.epsilon {
            Some(0.0)
        } else if m.offset <= 0.0 {
            Some(m.total / 2.0)
        } else {
            None
        }
    }
}
