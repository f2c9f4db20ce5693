mod file_finder;

pub use file_finder::{load_store, FileFinder, SourceFile};
