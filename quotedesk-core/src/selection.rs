//! Selection model for editable surfaces

/// A selection on an editable surface, measured in chars of rendered markup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceRange {
    pub anchor: usize,
    pub head: usize,
}

impl SurfaceRange {
    /// Create a collapsed selection (a caret) at an offset
    pub fn caret(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Create a selection spanning two offsets
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Get the selection range as (start, end), start <= end
    pub fn range(&self) -> (usize, usize) {
        let a = self.anchor.min(self.head);
        let b = self.anchor.max(self.head);
        (a, b)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// A selection captured before an asynchronous step, such as an image upload.
///
/// The surface revision is recorded so a later restore can tell whether the
/// surface was mutated in the meantime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedSelection {
    pub range: SurfaceRange,
    pub revision: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_forward_selection() {
        let sel = SurfaceRange { anchor: 5, head: 10 };
        assert_eq!(sel.range(), (5, 10));
    }

    #[test]
    fn test_range_backward_selection() {
        let sel = SurfaceRange { anchor: 10, head: 5 };
        assert_eq!(sel.range(), (5, 10));
    }

    #[test]
    fn test_caret_is_collapsed() {
        let sel = SurfaceRange::caret(7);
        assert_eq!(sel.range(), (7, 7));
        assert!(sel.is_collapsed());
        assert!(!SurfaceRange::new(1, 2).is_collapsed());
    }
}
