use std::collections::VecDeque;

/// FIFO of superseded resources, each stamped with the generation it was retired in.
///
/// An item is released once `delay` generations have passed since its stamp. Stamps
/// are pushed in non-decreasing order, so only the front ever needs checking.
#[derive(Debug)]
pub struct DeferredDestructionQueue<T> {
    delay: u64,
    entries: VecDeque<(u64, T)>,
}

impl<T> DeferredDestructionQueue<T> {
    pub fn new(delay: u64) -> Self {
        Self {
            delay,
            entries: VecDeque::new(),
        }
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn push(&mut self, item: T, generation: u64) {
        debug_assert!(
            self.entries.back().is_none_or(|(stamp, _)| *stamp <= generation),
            "deferred destruction stamps must not go backwards"
        );
        self.entries.push_back((generation, item));
    }

    /// Hands every item old enough at `current` to `destroy`. Returns how many were released.
    pub fn drain_aged(&mut self, current: u64, mut destroy: impl FnMut(T)) -> usize {
        let mut released = 0;
        while let Some((stamp, _)) = self.entries.front() {
            if stamp.saturating_add(self.delay) > current {
                break;
            }
            if let Some((_, item)) = self.entries.pop_front() {
                destroy(item);
                released += 1;
            }
        }
        released
    }

    /// Releases everything regardless of age.
    pub fn drain_all(&mut self, mut destroy: impl FnMut(T)) -> usize {
        let released = self.entries.len();
        for (_, item) in self.entries.drain(..) {
            destroy(item);
        }
        released
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
