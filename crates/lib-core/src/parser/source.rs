use std::ops::Deref;
use std::sync::Arc;

/// The raw SQL a token stream was lexed from.
///
/// Segments only hold slices into this; line and column numbers are
/// recovered on demand from the newline index.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Default)]
pub struct SourceFile {
    inner: Arc<SourceFileInner>,
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Default)]
pub struct SourceFileInner {
    pub source_str: String,
    pub f_name: String,
    newlines: Vec<usize>,
}

impl SourceFile {
    pub fn new(source_str: String, f_name: String) -> Self {
        let newlines = iter_indices_of_newlines(&source_str).collect();
        Self {
            inner: Arc::new(SourceFileInner {
                source_str,
                f_name,
                newlines,
            }),
        }
    }
}

impl From<String> for SourceFile {
    fn from(raw: String) -> Self {
        SourceFile::new(raw, "<string>".to_string())
    }
}

impl From<&str> for SourceFile {
    fn from(raw: &str) -> Self {
        SourceFile::new(raw.to_string(), "<string>".to_string())
    }
}

impl Deref for SourceFile {
    type Target = SourceFileInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl SourceFileInner {
    /// Line number and 1-indexed line position of a character offset.
    pub fn get_line_pos_of_char_pos(&self, char_pos: usize) -> (usize, usize) {
        match self.newlines.binary_search(&char_pos) {
            Ok(nl_idx) | Err(nl_idx) => {
                if nl_idx > 0 {
                    (nl_idx + 1, char_pos - self.newlines[nl_idx - 1])
                } else {
                    (1, char_pos + 1)
                }
            }
        }
    }

    pub fn line_count(&self) -> usize {
        self.newlines.len() + 1
    }
}

pub fn iter_indices_of_newlines(raw_str: &str) -> impl Iterator<Item = usize> + '_ {
    raw_str.match_indices('\n').map(|(idx, _)| idx)
}
