//! PendingBuffer - message bodies awaiting the next flush

/// Ordered message bodies
///
/// Insertion order is concatenation order. Owned by one dispatcher.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    entries: Vec<String>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body, returning the new length
    pub fn push(&mut self, body: String) -> usize {
        self.entries.push(body);
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All bodies joined without separator
    pub fn concat(&self) -> String {
        self.entries.concat()
    }

    /// Drop everything, returning how many bodies were held
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}
