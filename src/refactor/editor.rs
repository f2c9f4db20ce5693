use crate::analysis::Span;
use thiserror::Error;

/// A single replacement of a byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub replacement: String,
}

impl TextEdit {
    pub fn remove(span: Span) -> Self {
        Self {
            span,
            replacement: String::new(),
        }
    }

    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid byte range {start}..{end} for text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Edit at byte {0} overlaps a previous edit")]
    Overlap(usize),
}

/// In-memory text editor for module contents
pub struct TextEditor;

impl TextEditor {
    /// Apply non-overlapping edits to `text`, in any order
    pub fn apply(text: &str, mut edits: Vec<TextEdit>) -> Result<String, EditError> {
        edits.sort_by_key(|e| (e.span.start, e.span.end));

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for edit in &edits {
            let Span { start, end } = edit.span;
            if start > end
                || end > text.len()
                || !text.is_char_boundary(start)
                || !text.is_char_boundary(end)
            {
                return Err(EditError::InvalidRange {
                    start,
                    end,
                    len: text.len(),
                });
            }
            if start < cursor {
                return Err(EditError::Overlap(start));
            }
            out.push_str(&text[cursor..start]);
            out.push_str(&edit.replacement);
            cursor = end;
        }
        out.push_str(&text[cursor..]);

        Ok(out)
    }

    /// Remove a byte range
    pub fn remove_range(text: &str, start: usize, end: usize) -> Result<String, EditError> {
        Self::apply(text, vec![TextEdit::remove(Span::new(start, end))])
    }

    /// Replace a byte range
    pub fn replace_range(
        text: &str,
        start: usize,
        end: usize,
        replacement: &str,
    ) -> Result<String, EditError> {
        Self::apply(
            text,
            vec![TextEdit::replace(Span::new(start, end), replacement)],
        )
    }
}
