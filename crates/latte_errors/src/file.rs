//! A minimal database of source files diagnostics can point into.

use std::ops::Range;

/// An id referring to one file in a [`Files`] database.
pub type FileId = usize;

/// Interface the emitter needs to resolve spans back to file contents.
pub trait Files {
    fn name(&self, id: FileId) -> Option<&str>;
    fn source(&self, id: FileId) -> Option<&str>;
    /// 0-based line containing `byte_index`.
    fn line_index(&self, id: FileId, byte_index: usize) -> Option<usize>;
    /// Byte range of the 0-based `line_index`.
    fn line_range(&self, id: FileId, line_index: usize) -> Option<Range<usize>>;
}

/// Byte offsets at which each line starts, the first always being 0.
pub fn line_starts(source: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(source.match_indices('\n').map(|(i, _)| i + 1))
}

/// A single in-memory file with a precomputed line index.
#[derive(Debug, Clone)]
pub struct SimpleFile {
    name: String,
    source: String,
    starts: Vec<usize>,
}

impl SimpleFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> SimpleFile {
        let source = source.into();
        let starts = line_starts(&source).collect();
        SimpleFile { name: name.into(), source, starts }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn line_start(&self, line_index: usize) -> Option<usize> {
        if line_index == self.starts.len() {
            Some(self.source.len())
        } else {
            self.starts.get(line_index).copied()
        }
    }
}

impl Files for SimpleFile {
    fn name(&self, _id: FileId) -> Option<&str> {
        Some(&self.name)
    }

    fn source(&self, _id: FileId) -> Option<&str> {
        Some(&self.source)
    }

    fn line_index(&self, _id: FileId, byte_index: usize) -> Option<usize> {
        Some(match self.starts.binary_search(&byte_index) {
            Ok(line) => line,
            Err(next_line) => next_line - 1,
        })
    }

    fn line_range(&self, id: FileId, line_index: usize) -> Option<Range<usize>> {
        let start = self.line_start(line_index)?;
        let end = self.line_start(line_index + 1)?;
        Some(start..end)
    }
}

/// Several files addressed by their insertion order.
#[derive(Debug, Default)]
pub struct FileDatabase {
    files: Vec<SimpleFile>,
}

impl FileDatabase {
    pub fn new() -> FileDatabase {
        FileDatabase::default()
    }

    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> FileId {
        self.files.push(SimpleFile::new(name, source));
        self.files.len() - 1
    }

    pub fn get(&self, id: FileId) -> Option<&SimpleFile> {
        self.files.get(id)
    }
}

impl Files for FileDatabase {
    fn name(&self, id: FileId) -> Option<&str> {
        self.files.get(id)?.name(id)
    }

    fn source(&self, id: FileId) -> Option<&str> {
        Files::source(self.files.get(id)?, id)
    }

    fn line_index(&self, id: FileId, byte_index: usize) -> Option<usize> {
        self.files.get(id)?.line_index(id, byte_index)
    }

    fn line_range(&self, id: FileId, line_index: usize) -> Option<Range<usize>> {
        self.files.get(id)?.line_range(id, line_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_starts_cover_every_line() {
        let starts: Vec<_> = line_starts("a\nbc\n\nd").collect();
        assert_eq!(starts, vec![0, 2, 5, 6]);
    }

    #[test]
    fn line_index_lookup() {
        let file = SimpleFile::new("demo", "a\nbc\n\nd");
        assert_eq!(file.line_index(0, 0), Some(0));
        assert_eq!(file.line_index(0, 3), Some(1));
        assert_eq!(file.line_index(0, 5), Some(2));
        assert_eq!(file.line_index(0, 6), Some(3));
        assert_eq!(file.line_range(0, 1), Some(2..5));
    }
}
