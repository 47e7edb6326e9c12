/// Linear undo/redo history.
///
/// `undone` only ever holds entries popped off `committed`; any fresh push
/// clears it.
#[derive(Clone, Debug)]
pub struct History<T> {
    committed: Vec<T>,
    undone: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            committed: Vec::new(),
            undone: Vec::new(),
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.undone.clear();
        self.committed.push(item);
    }

    /// Swaps the top entry for `item`; pushes when the history is empty.
    pub fn replace_last(&mut self, item: T) {
        match self.committed.last_mut() {
            Some(last) => *last = item,
            None => self.push(item),
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.committed.pop() {
            Some(item) => {
                self.undone.push(item);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.undone.pop() {
            Some(item) => {
                self.committed.push(item);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.undone.clear();
    }

    pub fn last(&self) -> Option<&T> {
        self.committed.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.committed.iter()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }
}
