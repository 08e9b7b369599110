//! Fenced code block tracking for the line scanner.
//!
//! Directive and front matter syntax inside a fenced code block is code, not
//! markup. The scanner feeds every line through [`FenceTracker::update`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Opening fence: three or more backticks or tildes.
    fn open(line: &str) -> Option<Self> {
        let marker = line.chars().next().filter(|&c| c == '`' || c == '~')?;
        let len = line.chars().take_while(|&c| c == marker).count();
        (len >= 3).then_some(Self { marker, len })
    }

    /// Closing fence: same marker, at least as long, nothing but whitespace
    /// after it.
    fn closes(self, line: &str) -> bool {
        let len = line.chars().take_while(|&c| c == self.marker).count();
        len >= self.len && line[len * self.marker.len_utf8()..].trim().is_empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed one line. Returns `true` if the line opens or closes a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self.open {
            Some(fence) if fence.closes(trimmed) => {
                self.open = None;
                true
            }
            Some(_) => false,
            None => {
                self.open = Fence::open(trimmed);
                self.open.is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("::embed{url=a.md}"));
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_must_match() {
        let mut tracker = FenceTracker::new();
        tracker.update("~~~~");
        assert!(!tracker.update("```"));
        assert!(!tracker.update("~~~"));
        assert!(!tracker.update("~~~~ trailing"));
        assert!(tracker.update("~~~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_short_run_is_not_a_fence() {
        let mut tracker = FenceTracker::new();
        assert!(!tracker.update("``inline``"));
        assert!(!tracker.in_fence());
    }
}
