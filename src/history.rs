/// Append-only record of every line the server has broadcast since start.
///
/// The log is plain data; mutual exclusion comes from the room lock that
/// owns it. Growth is unbounded: replaying the full conversation to late
/// joiners is part of the contract, so nothing is ever evicted.
#[derive(Debug, Default)]
pub struct HistoryLog {
    lines: Vec<String>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// All stored lines joined with a newline separator, for one-shot
    /// replay to a newly joined participant. `None` when nothing has been
    /// broadcast yet.
    pub fn snapshot_joined(&self) -> Option<String> {
        if self.lines.is_empty() {
            None
        } else {
            Some(self.lines.join("\n"))
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
