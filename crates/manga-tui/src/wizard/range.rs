//! RangeSelection — start/end chapter picks over one chapter list.
//!
//! The end picker only offers chapters from the start onwards, so the
//! index it reports is relative to that slice. `select_end_relative`
//! converts it back to an absolute index before anything compares it with
//! `start`. Ordering violations are reported, never prevented.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("chapter {index} is out of range ({len} chapters)")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeValidation {
    /// Start or end not chosen yet.
    Incomplete,
    Valid { start: usize, end: usize },
    /// End precedes start.
    Inverted { start: usize, end: usize },
}

#[derive(Debug, Clone, Default)]
pub struct RangeSelection {
    chapters: Vec<String>,
    start: Option<usize>,
    end: Option<usize>,
}

impl RangeSelection {
    pub fn new(chapters: Vec<String>) -> Self {
        Self {
            chapters,
            start: None,
            end: None,
        }
    }

    /// Install a new chapter list. Picks refer to the old list, so both
    /// are cleared.
    pub fn set_chapters(&mut self, chapters: Vec<String>) {
        self.chapters = chapters;
        self.start = None;
        self.end = None;
    }

    pub fn chapters(&self) -> &[String] {
        &self.chapters
    }

    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    pub fn select_start(&mut self, index: usize) -> Result<(), RangeError> {
        self.check(index)?;
        self.start = Some(index);
        Ok(())
    }

    /// Offset of the end picker's slice within the full list.
    fn end_base(&self) -> usize {
        self.start.unwrap_or(0).min(self.chapters.len())
    }

    /// Chapters offered by the end picker: the full list from `start` on.
    pub fn end_domain(&self) -> &[String] {
        &self.chapters[self.end_base()..]
    }

    /// Pick the end by its position in `end_domain()`. Returns the
    /// absolute index that was stored.
    pub fn select_end_relative(&mut self, relative: usize) -> Result<usize, RangeError> {
        let absolute = self.end_base() + relative;
        self.check(absolute)?;
        self.end = Some(absolute);
        Ok(absolute)
    }

    /// Position of the stored end inside the current `end_domain()`, if it
    /// still falls inside it.
    pub fn end_relative(&self) -> Option<usize> {
        self.end?.checked_sub(self.end_base())
    }

    pub fn validation(&self) -> RangeValidation {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end < start => RangeValidation::Inverted { start, end },
            (Some(start), Some(end)) => RangeValidation::Valid { start, end },
            _ => RangeValidation::Incomplete,
        }
    }

    pub fn warning(&self) -> Option<String> {
        match self.validation() {
            RangeValidation::Inverted { start, end } => Some(format!(
                "End chapter \"{}\" comes before start chapter \"{}\"",
                self.chapters[end], self.chapters[start]
            )),
            _ => None,
        }
    }

    /// The chosen chapters, in list order, when the range is valid.
    pub fn selected(&self) -> Option<&[String]> {
        match self.validation() {
            RangeValidation::Valid { start, end } => Some(&self.chapters[start..=end]),
            _ => None,
        }
    }

    fn check(&self, index: usize) -> Result<(), RangeError> {
        if index < self.chapters.len() {
            Ok(())
        } else {
            Err(RangeError::OutOfRange {
                index,
                len: self.chapters.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five() -> RangeSelection {
        RangeSelection::new(
            ["c1", "c2", "c3", "c4", "c5"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_relative_end_is_translated() {
        let mut r = five();
        r.select_start(1).unwrap();
        assert_eq!(r.end_domain(), &["c2", "c3", "c4", "c5"]);
        assert_eq!(r.select_end_relative(2), Ok(3));
        assert_eq!(r.chapters()[3], "c4");
        assert_eq!(r.validation(), RangeValidation::Valid { start: 1, end: 3 });
        assert_eq!(r.warning(), None);
        assert_eq!(r.selected().unwrap(), &["c2", "c3", "c4"]);
    }

    #[test]
    fn test_repicking_start_past_end_warns() {
        let mut r = five();
        r.select_start(3).unwrap();
        assert_eq!(r.select_end_relative(0), Ok(3));
        assert_eq!(r.warning(), None);

        r.select_start(4).unwrap();
        assert_eq!(r.end(), Some(3));
        assert_eq!(r.validation(), RangeValidation::Inverted { start: 4, end: 3 });
        let warning = r.warning().unwrap();
        assert!(warning.contains("c4") && warning.contains("c5"), "{}", warning);
        assert!(r.selected().is_none());
        assert_eq!(r.end_relative(), None);
    }

    #[test]
    fn test_single_chapter_range() {
        let mut r = five();
        r.select_start(4).unwrap();
        assert_eq!(r.end_domain(), &["c5"]);
        assert_eq!(r.select_end_relative(0), Ok(4));
        assert_eq!(r.selected().unwrap(), &["c5"]);
    }

    #[test]
    fn test_out_of_range_picks() {
        let mut r = five();
        assert_eq!(
            r.select_start(5),
            Err(RangeError::OutOfRange { index: 5, len: 5 })
        );
        r.select_start(2).unwrap();
        assert_eq!(
            r.select_end_relative(3),
            Err(RangeError::OutOfRange { index: 5, len: 5 })
        );
        assert_eq!(r.end(), None);
    }

    #[test]
    fn test_unset_start_offers_whole_list() {
        let mut r = five();
        assert_eq!(r.end_domain().len(), 5);
        assert_eq!(r.select_end_relative(1), Ok(1));
        assert_eq!(r.validation(), RangeValidation::Incomplete);
    }

    #[test]
    fn test_empty_list() {
        let mut r = RangeSelection::default();
        assert!(r.end_domain().is_empty());
        assert!(r.select_start(0).is_err());
        assert!(r.select_end_relative(0).is_err());
        assert_eq!(r.validation(), RangeValidation::Incomplete);
    }

    #[test]
    fn test_new_chapters_clear_picks() {
        let mut r = five();
        r.select_start(1).unwrap();
        r.select_end_relative(1).unwrap();
        r.set_chapters(vec!["x".into()]);
        assert_eq!((r.start(), r.end()), (None, None));
    }
}
