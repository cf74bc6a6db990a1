//! Execute and write breakpoints.

use std::collections::BTreeSet;

/// Breakpoint sets consulted by the CPU.
///
/// Execute breakpoints are checked only when an instruction is fetched
/// normally (never when an interrupt is taken). Write breakpoints are checked
/// on every CPU store, including stores the write gate discards.
///
/// # Examples
///
/// ```
/// use lib316::Breakpoints;
///
/// let mut bp = Breakpoints::default();
/// bp.add_execute(0o1000);
/// bp.add_write(0o77);
/// assert!(bp.is_execute(0o1000));
/// assert!(!bp.is_write(0o1000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakpoints {
    execute: BTreeSet<u16>,
    write: BTreeSet<u16>,
}

impl Breakpoints {
    pub fn add_execute(&mut self, addr: u16) {
        self.execute.insert(addr);
    }

    pub fn remove_execute(&mut self, addr: u16) -> bool {
        self.execute.remove(&addr)
    }

    pub fn add_write(&mut self, addr: u16) {
        self.write.insert(addr);
    }

    pub fn remove_write(&mut self, addr: u16) -> bool {
        self.write.remove(&addr)
    }

    pub fn is_execute(&self, addr: u16) -> bool {
        !self.execute.is_empty() && self.execute.contains(&addr)
    }

    pub fn is_write(&self, addr: u16) -> bool {
        !self.write.is_empty() && self.write.contains(&addr)
    }

    /// Removes every breakpoint.
    pub fn clear(&mut self) {
        self.execute.clear();
        self.write.clear();
    }

    /// Execute breakpoints in ascending order.
    pub fn execute_points(&self) -> impl Iterator<Item = u16> + '_ {
        self.execute.iter().copied()
    }

    /// Write breakpoints in ascending order.
    pub fn write_points(&self) -> impl Iterator<Item = u16> + '_ {
        self.write.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove() {
        let mut bp = Breakpoints::default();
        bp.add_execute(0o100);
        bp.add_execute(0o50);
        assert_eq!(bp.execute_points().collect::<Vec<_>>(), vec![0o50, 0o100]);

        assert!(bp.remove_execute(0o100));
        assert!(!bp.remove_execute(0o100));
        assert!(!bp.is_execute(0o100));

        bp.add_write(0o20);
        bp.clear();
        assert!(!bp.is_write(0o20));
        assert_eq!(bp.write_points().count(), 0);
    }
}
