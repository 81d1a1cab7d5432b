use std::collections::VecDeque;
use std::io::{self, Write};

/// Bounded record of input lines, oldest first.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a line, evicting the oldest entry once full.
    pub fn record(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries paired with their 1-based position in the current buffer.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, line)| (i + 1, line.as_str()))
    }

    /// Print each entry as `<n> <line>`.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        for (n, line) in self.numbered() {
            writeln!(out, "{n} {line}")?;
        }
        Ok(())
    }
}
