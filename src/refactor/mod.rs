// Text edits and writing results back to disk

mod editor;
mod undo;
mod writer;

pub use editor::{EditError, TextEdit, TextEditor};
pub use undo::UndoScript;
pub use writer::{ChangeSet, ChangeWriter, FileChange, WriteStats};
