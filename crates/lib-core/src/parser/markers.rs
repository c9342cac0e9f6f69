use std::ops::Range;
use std::rc::Rc;

use ahash::AHashSet;

use crate::parser::source::SourceFile;

/// A reference to a position in a file.
///
/// - Positions in the source are slices and therefore identify ranges.
/// - The working position (line number and 1-indexed line position) is a
///   point, carried separately so that zero-length segments inserted
///   during parsing still know where they sit.
/// - Comparisons are on the working position.
#[derive(Debug, Clone)]
pub struct PositionMarker {
    data: Rc<PositionMarkerData>,
}

impl std::ops::Deref for PositionMarker {
    type Target = PositionMarkerData;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl std::ops::DerefMut for PositionMarker {
    fn deref_mut(&mut self) -> &mut Self::Target {
        Rc::make_mut(&mut self.data)
    }
}

impl Eq for PositionMarker {}

#[derive(Debug, Clone)]
pub struct PositionMarkerData {
    pub source_slice: Range<usize>,
    pub source_file: SourceFile,
    pub working_line_no: usize,
    pub working_line_pos: usize,
}

impl Default for PositionMarker {
    fn default() -> Self {
        Self {
            data: PositionMarkerData {
                source_slice: 0..0,
                source_file: SourceFile::default(),
                working_line_no: 0,
                working_line_pos: 0,
            }
            .into(),
        }
    }
}

impl PositionMarker {
    /// Working position is inferred from the source when not given.
    pub fn new(
        source_slice: Range<usize>,
        source_file: SourceFile,
        working_loc: Option<(usize, usize)>,
    ) -> Self {
        let (working_line_no, working_line_pos) = working_loc
            .unwrap_or_else(|| source_file.get_line_pos_of_char_pos(source_slice.start));

        Self {
            data: PositionMarkerData {
                source_slice,
                source_file,
                working_line_no,
                working_line_pos,
            }
            .into(),
        }
    }

    #[track_caller]
    pub fn source_str(&self) -> &str {
        &self.source_file.source_str[self.source_slice.clone()]
    }

    pub fn line_no(&self) -> usize {
        self.source_position().0
    }

    pub fn line_pos(&self) -> usize {
        self.source_position().1
    }

    /// A marker spanning all of `markers`.
    ///
    /// Returns `None` for an empty iterator.
    #[track_caller]
    pub fn from_child_markers<'a>(
        markers: impl Iterator<Item = &'a PositionMarker>,
    ) -> Option<PositionMarker> {
        let mut source_start = usize::MAX;
        let mut source_end = usize::MIN;
        let mut source_files = AHashSet::new();

        for marker in markers {
            source_start = source_start.min(marker.source_slice.start);
            source_end = source_end.max(marker.source_slice.end);
            source_files.insert(marker.source_file.clone());
        }

        if source_files.len() > 1 {
            panic!("Attempted to make a parent marker from multiple files.");
        }

        let source_file = source_files.into_iter().next()?;
        Some(PositionMarker::new(
            source_start..source_end,
            source_file,
            None,
        ))
    }

    /// Return the line and position of this marker in the source.
    pub fn source_position(&self) -> (usize, usize) {
        self.source_file
            .get_line_pos_of_char_pos(self.source_slice.start)
    }

    pub fn working_loc_after(&self, raw: &str) -> (usize, usize) {
        Self::infer_next_position(raw, self.working_line_no, self.working_line_pos)
    }

    /// Using the raw string provided to infer the position of the next.
    /// **Line position in 1-indexed.**
    pub fn infer_next_position(raw: &str, line_no: usize, line_pos: usize) -> (usize, usize) {
        if raw.is_empty() {
            return (line_no, line_pos);
        }

        match raw.rsplit_once('\n') {
            None => (line_no, line_pos + raw.len()),
            Some((head, tail)) => (line_no + head.matches('\n').count() + 1, tail.len() + 1),
        }
    }

    /// Location tuple for the working position.
    pub fn working_loc(&self) -> (usize, usize) {
        (self.working_line_no, self.working_line_pos)
    }

    pub fn from_point(
        source_point: usize,
        source_file: SourceFile,
        working_loc: Option<(usize, usize)>,
    ) -> Self {
        Self::new(source_point..source_point, source_file, working_loc)
    }

    pub fn start_point_marker(&self) -> PositionMarker {
        // Start points also pass on the working position.
        PositionMarker::from_point(
            self.source_slice.start,
            self.source_file.clone(),
            Some(self.working_loc()),
        )
    }

    pub fn end_point_marker(&self) -> PositionMarker {
        PositionMarker::from_point(
            self.source_slice.end,
            self.source_file.clone(),
            Some(self.working_loc_after(self.source_str())),
        )
    }

    pub fn is_point(&self) -> bool {
        self.source_slice.is_empty()
    }
}

impl PartialEq for PositionMarker {
    fn eq(&self, other: &Self) -> bool {
        self.working_loc() == other.working_loc()
    }
}

impl PartialOrd for PositionMarker {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.working_loc().cmp(&other.working_loc()))
    }
}
