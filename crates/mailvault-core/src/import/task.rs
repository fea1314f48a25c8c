//! Unit-of-work description for an import run.

use std::path::{Path, PathBuf};

use crate::Result;

/// A batch of export files to import from one directory.
#[derive(Debug, Clone)]
pub struct ImportTask {
    /// Directory holding the export files.
    pub directory: PathBuf,
    /// Filenames to import, relative to `directory`.
    pub files: Vec<String>,
}

impl ImportTask {
    /// Task covering an explicit list of files.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, files: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            files,
        }
    }

    /// Task covering every `.json` file in the directory, in filename
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn all_files(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&directory)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(name) = filename_of(&path)
            {
                files.push(name);
            }
        }
        files.sort();
        Ok(Self { directory, files })
    }
}

fn filename_of(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_files_lists_json_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("00002.json"), "{}").unwrap();
        std::fs::write(dir.path().join("00001.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let task = ImportTask::all_files(dir.path()).unwrap();
        assert_eq!(task.files, vec!["00001.json", "00002.json"]);
    }
}
