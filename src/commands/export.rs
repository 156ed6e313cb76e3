use anyhow::{Context, Result};
use mfcsv::export;
use mfcsv::release::{ReleaseAggregator, ReleaseRecord};
use mfcsv::tags::TagReader;
use mfcsv::upload::ImageHost;
use mfcsv::utils;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::prompt::ExportMode;

/// Discover album folders under `inputs`, aggregate each one and write CSV
/// files into `output_dir`. `choose_mode` is only consulted when more than
/// one album folder is found. Returns the files written.
pub fn export_folders<F>(
    inputs: &[PathBuf],
    output_dir: &Path,
    reader: &dyn TagReader,
    host: &dyn ImageHost,
    choose_mode: F,
) -> Result<Vec<PathBuf>>
where
    F: FnOnce(usize) -> Result<ExportMode>,
{
    fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            output_dir.display()
        )
    })?;

    let album_folders = utils::collect_album_folders(inputs);
    let aggregator = ReleaseAggregator::new(reader, host);

    let mode = if album_folders.len() == 1 {
        ExportMode::Separate
    } else {
        println!("\nFound {} folders to process\n", album_folders.len());
        choose_mode(album_folders.len())?
    };

    let mut written = Vec::new();
    match mode {
        ExportMode::Separate => {
            for folder in &album_folders {
                let record = process_folder(&aggregator, folder);
                let path = export::save_individual_csv(&record, output_dir)?;
                println!("CSV saved: {}", path.display());
                written.push(path);
            }
            if album_folders.len() > 1 {
                println!("\nGenerated {} CSV files!", written.len());
            }
        }
        ExportMode::Combined => {
            let records: Vec<ReleaseRecord> = album_folders
                .iter()
                .map(|folder| process_folder(&aggregator, folder))
                .collect();
            let path = export::save_combined_csv(&records, output_dir)?;
            println!("Combined CSV saved: {}", path.display());
            println!("\nCombined {} folders into one CSV!", records.len());
            written.push(path);
        }
    }

    info!("Export finished, {} file(s) written", written.len());
    Ok(written)
}

fn process_folder(aggregator: &ReleaseAggregator, folder: &Path) -> ReleaseRecord {
    println!("Processing: {}", folder.display());
    aggregator.aggregate(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use mfcsv::tags::TrackTags;
    use mfcsv::upload::UploadError;
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Tags every file after its parent folder name
    struct FolderNameReader;

    impl TagReader for FolderNameReader {
        fn read(&self, path: &Path) -> Result<TrackTags> {
            let folder = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("no parent"))?;
            Ok(TrackTags::new()
                .with("artist", "Artist")
                .with("album", folder)
                .with("title", "Track")
                .with("date", "2020"))
        }
    }

    /// Gives every file the same tags, like the discs of one release
    struct SameReleaseReader;

    impl TagReader for SameReleaseReader {
        fn read(&self, _path: &Path) -> Result<TrackTags> {
            Ok(TrackTags::new()
                .with("artist", "Artist")
                .with("album", "Album")
                .with("title", "Track")
                .with("date", "2001"))
        }
    }

    struct NoHost;

    impl ImageHost for NoHost {
        fn upload(&self, _image: &[u8]) -> std::result::Result<String, UploadError> {
            Err(UploadError::Status(500))
        }
    }

    fn library(root: &Path, albums: &[&str]) -> Vec<PathBuf> {
        albums
            .iter()
            .map(|name| {
                let dir = root.join(name);
                fs::create_dir_all(&dir).unwrap();
                fs::write(dir.join("01.flac"), b"x").unwrap();
                dir
            })
            .collect()
    }

    fn csv_rows(path: &Path) -> usize {
        csv::Reader::from_path(path).unwrap().records().count()
    }

    #[test]
    fn test_single_folder_skips_prompt() -> Result<()> {
        let music = TempDir::new()?;
        let out = TempDir::new()?;
        let inputs = library(music.path(), &["Solo"]);

        let written = export_folders(&inputs, out.path(), &FolderNameReader, &NoHost, |_| {
            Err(anyhow!("prompt must not be shown"))
        })?;

        assert_eq!(written, vec![out.path().join("Artist - Solo (2020).csv")]);
        assert_eq!(csv_rows(&written[0]), 1);
        Ok(())
    }

    #[test]
    fn test_separate_mode_writes_file_per_folder() -> Result<()> {
        let music = TempDir::new()?;
        let out = TempDir::new()?;
        library(music.path(), &["One", "Two", "Three"]);
        let asked = Cell::new(0);

        let written = export_folders(
            &[music.path().to_path_buf()],
            out.path(),
            &FolderNameReader,
            &NoHost,
            |count| {
                asked.set(count);
                Ok(ExportMode::Separate)
            },
        )?;

        assert_eq!(asked.get(), 3);
        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_dir(out.path())?.count(), 3);
        for path in &written {
            assert_eq!(csv_rows(path), 1);
        }
        Ok(())
    }

    #[test]
    fn test_separate_mode_keeps_discs_with_identical_tags() -> Result<()> {
        let music = TempDir::new()?;
        let out = TempDir::new()?;
        library(&music.path().join("Album"), &["CD1", "CD2"]);

        let written = export_folders(
            &[music.path().to_path_buf()],
            out.path(),
            &SameReleaseReader,
            &NoHost,
            |_| Ok(ExportMode::Separate),
        )?;

        assert_eq!(
            written,
            vec![
                out.path().join("Artist - Album (2001).csv"),
                out.path().join("Artist - Album (2001) (2).csv"),
            ]
        );
        assert_eq!(fs::read_dir(out.path())?.count(), 2);
        for path in &written {
            assert_eq!(csv_rows(path), 1);
        }
        Ok(())
    }

    #[test]
    fn test_combined_mode_writes_row_per_folder() -> Result<()> {
        let music = TempDir::new()?;
        let out = TempDir::new()?;
        let mut inputs = library(music.path(), &["One", "Two"]);
        let empty = music.path().join("Empty");
        fs::create_dir(&empty)?;
        inputs.push(empty);

        let written = export_folders(&inputs, out.path(), &FolderNameReader, &NoHost, |_| {
            Ok(ExportMode::Combined)
        })?;

        assert_eq!(written.len(), 1);
        assert_eq!(csv_rows(&written[0]), 3);
        Ok(())
    }
}
