//! CyclicSelector — an ordered list with a wrapping cursor.
//!
//! `next`, `previous` and `jump_to` are the only writers of the cursor.
//! An empty list has no cursor at all (the "loading" state); the cursor
//! reappears at 0 the moment a non-empty list is installed.

/// Rejected `jump_to` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("index {index} out of range for {len} items")]
pub struct OutOfRange {
    pub index: usize,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct CyclicSelector<T> {
    items: Vec<T>,
    current: Option<usize>,
    /// Bumped on every `set_items`; identifies the backing list.
    generation: u64,
}

impl<T> CyclicSelector<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            generation: 0,
        }
    }

    /// Replace the backing list. Always counts as a new list identity,
    /// even when the contents compare equal.
    pub fn set_items(&mut self, items: Vec<T>) -> u64 {
        self.current = if items.is_empty() { None } else { Some(0) };
        self.items = items;
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_loading(&self) -> bool {
        self.current.is_none()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&T> {
        self.current.and_then(|i| self.items.get(i))
    }

    pub fn next(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        if let Some(i) = self.current {
            self.current = Some((i + 1) % len);
        }
    }

    pub fn previous(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        if let Some(i) = self.current {
            self.current = Some((i + len - 1) % len);
        }
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), OutOfRange> {
        if index >= self.items.len() {
            return Err(OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.current = Some(index);
        Ok(())
    }

    /// The next `k` items after the cursor, wrapping, never including the
    /// current item. Each entry carries its absolute index.
    pub fn upcoming(&self, k: usize) -> Vec<(usize, &T)> {
        let Some(cur) = self.current else {
            return Vec::new();
        };
        let len = self.items.len();
        let take = k.min(len.saturating_sub(1));
        (1..=take)
            .map(|step| {
                let idx = (cur + step) % len;
                (idx, &self.items[idx])
            })
            .collect()
    }
}

impl<T> Default for CyclicSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}
