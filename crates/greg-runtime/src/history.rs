/// Submitted prompts with an up/down recall cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptHistory {
    entries: Vec<String>,
    /// Index of the recalled entry, `None` while editing a fresh prompt.
    cursor: Option<usize>,
}

impl PromptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submission and leave recall mode.
    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if !entry.trim().is_empty() {
            self.entries.push(entry);
        }
        self.cursor = None;
    }

    /// Step to an older entry. Returns the text to show, or `None` when the
    /// history is empty.
    pub fn back(&mut self) -> Option<&str> {
        let last = self.entries.len().checked_sub(1)?;
        let index = match self.cursor {
            None => last,
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Step to a newer entry. Moving past the newest clears the input and
    /// leaves recall mode. Returns `None` when not recalling.
    pub fn forward(&mut self) -> Option<&str> {
        let i = self.cursor?;
        if i + 1 >= self.entries.len() {
            self.cursor = None;
            return Some("");
        }
        self.cursor = Some(i + 1);
        self.entries.get(i + 1).map(String::as_str)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
