/// Tasks deferred by a whole number of ticks.
#[derive(Debug, Clone)]
pub struct TickQueue<T> {
    pending: Vec<(u32, T)>,
}

impl<T> Default for TickQueue<T> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

impl<T> TickQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` on the `ticks`-th following tick. Zero means the next one.
    pub fn schedule_after(&mut self, ticks: u32, task: T) {
        self.pending.push((ticks.max(1), task));
    }

    /// Advance one tick and hand back the tasks that came due, oldest first.
    pub fn drain_due(&mut self) -> Vec<T> {
        let mut due = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for (ticks, task) in self.pending.drain(..) {
            if ticks <= 1 {
                due.push(task);
            } else {
                waiting.push((ticks - 1, task));
            }
        }
        self.pending = waiting;
        due
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
