use crate::audio;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// True if `path` directly contains at least one audio file
pub fn contains_audio_files(path: &Path) -> bool {
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.filter_map(|e| e.ok()) {
            let entry_path = entry.path();
            if entry_path.is_file() && audio::is_audio_file(&entry_path) {
                return true;
            }
        }
    }
    false
}

/// Directories under `root` (inclusive) that directly hold audio files.
/// Subfolders of an album folder belong to that album and are not descended into.
pub fn find_album_folders(root: &Path) -> Vec<PathBuf> {
    let mut album_folders = Vec::new();
    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if contains_audio_files(entry.path()) {
            album_folders.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    album_folders
}

/// Album folders across every input; an input without any is kept as-is
pub fn collect_album_folders<P: AsRef<Path>>(inputs: &[P]) -> Vec<PathBuf> {
    let mut all_album_folders = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let album_folders = find_album_folders(input);
        if album_folders.is_empty() {
            all_album_folders.push(input.to_path_buf());
        } else {
            all_album_folders.extend(album_folders);
        }
    }
    all_album_folders
}
