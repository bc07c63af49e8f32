// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-number sequence. Numbers are drawn in pipeline order before any work
// is dispatched, so numbering never depends on completion order.

/// Monotonically increasing page numbers starting at a configured value.
#[derive(Debug, Clone)]
pub struct PageSequence {
    next: u64,
}

impl PageSequence {
    pub fn new(start: u64) -> Self {
        Self { next: start }
    }

    /// Assign one number to each of `count` pages, in order.
    pub fn assign(&mut self, count: usize) -> Vec<u64> {
        (0..count).map_while(|_| self.next()).collect()
    }
}

impl Iterator for PageSequence {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next;
        self.next = current.checked_add(1)?;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_from_start() {
        let mut seq = PageSequence::new(5);
        assert_eq!(seq.assign(3), [5, 6, 7]);
        assert_eq!(seq.next(), Some(8));
    }

    #[test]
    fn stops_instead_of_wrapping() {
        let mut seq = PageSequence::new(u64::MAX - 1);
        assert_eq!(seq.assign(5), [u64::MAX - 1]);
    }
}
