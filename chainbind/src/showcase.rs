/// Keeps up to `capacity` distinct entries, lowest rank first.
pub struct Showcase<T> {
    capacity: usize,
    entries: Vec<(usize, T)>,
}

impl<T> Showcase<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, item)| item)
    }

    pub fn take(self) -> impl Iterator<Item = (usize, T)> {
        self.entries.into_iter()
    }

    /// An entry `same` as one already kept only replaces it when it ranks
    /// lower.
    pub fn offer(&mut self, rank: usize, value: T, same: impl Fn(&T, &T) -> bool) {
        if let Some(index) = self.entries.iter().position(|(_, kept)| same(kept, &value)) {
            if self.entries[index].0 <= rank {
                return;
            }
            self.entries.remove(index);
        }

        let at = self
            .entries
            .iter()
            .position(|(kept, _)| rank < *kept)
            .unwrap_or(self.entries.len());
        if at >= self.capacity {
            return;
        }
        self.entries.insert(at, (rank, value));
        self.entries.truncate(self.capacity);
    }
}
