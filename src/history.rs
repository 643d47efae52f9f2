use serde::Serialize;

/// Entered command lines with a browse cursor.
///
/// The cursor sits one past the newest entry after every push. `previous`
/// walks toward older entries and stops at the oldest; `next` walks back and
/// yields an empty line once it passes the newest.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: usize,
    limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryState {
    pub len: usize,
    pub cursor: usize,
    pub last: Option<String>,
}

impl CommandHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a submitted line. Oldest entries drop past the limit.
    pub fn push(&mut self, line: &str) {
        self.entries.push(line.to_string());
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len();
    }

    pub fn previous(&mut self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        self.cursor = self.cursor.saturating_sub(1);
        self.entries.get(self.cursor).cloned().unwrap_or_default()
    }

    pub fn next(&mut self) -> String {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            self.entries.get(self.cursor).cloned().unwrap_or_default()
        } else {
            self.cursor = self.entries.len();
            String::new()
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            len: self.entries.len(),
            cursor: self.cursor,
            last: self.entries.last().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browse_back_and_forth() {
        let mut h = CommandHistory::new(10);
        h.push("a");
        h.push("b");
        h.push("c");
        assert_eq!(h.previous(), "c");
        assert_eq!(h.previous(), "b");
        assert_eq!(h.previous(), "a");
        assert_eq!(h.previous(), "a");
        assert_eq!(h.next(), "b");
        assert_eq!(h.next(), "c");
        assert_eq!(h.next(), "");
        assert_eq!(h.previous(), "c");
    }

    #[test]
    fn empty_history_yields_blank() {
        let mut h = CommandHistory::new(10);
        assert_eq!(h.previous(), "");
        assert_eq!(h.next(), "");
    }

    #[test]
    fn push_resets_cursor() {
        let mut h = CommandHistory::new(10);
        h.push("a");
        h.push("b");
        h.previous();
        h.previous();
        h.push("c");
        assert_eq!(h.previous(), "c");
    }

    #[test]
    fn limit_drops_oldest() {
        let mut h = CommandHistory::new(2);
        h.push("a");
        h.push("b");
        h.push("c");
        assert_eq!(h.entries(), ["b", "c"]);
        assert_eq!(h.state().len, 2);
    }
}
