//! Per-folder aggregation of track tags into a single catalog release row.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::artwork::{self, ArtworkState};
use crate::audio;
use crate::tags::{TagReader, TrackTags};
use crate::upload::ImageHost;

pub const DEFAULT_FORMAT: &str = "File";
pub const DEFAULT_CATNO: &str = "none";

const ARTIST_KEYS: &[&str] = &["artist"];
const ALBUM_ARTIST_KEYS: &[&str] = &["albumartist", "album artist"];
const ALBUM_KEYS: &[&str] = &["album"];
const TITLE_KEYS: &[&str] = &["title"];
const GENRE_KEYS: &[&str] = &["genre"];
const STYLE_KEYS: &[&str] = &["style", "styles"];
const LABEL_KEYS: &[&str] = &["label"];
const CATNO_KEYS: &[&str] = &["catalog", "catno", "cat#"];
const DATE_KEYS: &[&str] = &["date", "year"];

/// One finalized CSV row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleaseRecord {
    pub artist: String,
    pub title: String,
    pub label: String,
    pub catno: String,
    pub format: String,
    pub genre: String,
    pub style: String,
    pub tracks: String,
    pub date: String,
    pub images: String,
}

impl ReleaseRecord {
    /// Column values in export order
    pub fn fields(&self) -> [&str; 10] {
        [
            self.artist.as_str(),
            self.title.as_str(),
            self.label.as_str(),
            self.catno.as_str(),
            self.format.as_str(),
            self.genre.as_str(),
            self.style.as_str(),
            self.tracks.as_str(),
            self.date.as_str(),
            self.images.as_str(),
        ]
    }
}

/// Tag values resolved for a single track
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub title: String,
    pub genre: String,
    pub style: String,
    pub label: String,
    pub catno: String,
    pub date: String,
    pub duration_secs: Option<f64>,
}

impl ResolvedTrack {
    /// Apply the synonym lists and defaults. `stem` stands in for a missing
    /// album or title.
    pub fn resolve(tags: &TrackTags, stem: &str) -> Self {
        let artist = tags.get(ARTIST_KEYS, "Unknown Artist").join(";");
        let album_artist = tags.first(ALBUM_ARTIST_KEYS, &artist);
        let label_default = format!("Not On Label ({} Self-released)", album_artist);
        Self {
            album: tags.first(ALBUM_KEYS, stem),
            title: tags.first(TITLE_KEYS, stem),
            genre: tags.first(GENRE_KEYS, "none"),
            style: tags.first(STYLE_KEYS, "none"),
            label: tags.first(LABEL_KEYS, &label_default),
            catno: tags.first(CATNO_KEYS, DEFAULT_CATNO),
            date: tags.first(DATE_KEYS, "Unknown"),
            duration_secs: tags.duration_secs,
            artist,
            album_artist,
        }
    }

    pub fn display_entry(&self) -> String {
        format_track_entry(
            &self.artist,
            &self.album_artist,
            &self.title,
            self.duration_secs,
        )
    }
}

/// ` m:ss` for a known positive duration, otherwise empty
pub fn format_duration(duration_secs: Option<f64>) -> String {
    match duration_secs {
        Some(secs) if secs > 0.0 => {
            let whole = secs.floor() as u64;
            format!(" {}:{:02}", whole / 60, whole % 60)
        }
        _ => String::new(),
    }
}

/// Tracklist line for one track, crediting only artists beyond the album artist
pub fn format_track_entry(
    track_artist: &str,
    album_artist: &str,
    title: &str,
    duration_secs: Option<f64>,
) -> String {
    let duration = format_duration(duration_secs);
    let track_artist = track_artist.trim();
    let album_artist = album_artist.trim();

    if track_artist == album_artist {
        format!("{}{}", title, duration)
    } else if track_artist.contains(album_artist) {
        let extras = track_artist
            .replace(album_artist, "")
            .trim_matches(|c: char| matches!(c, ' ' | ';' | ','))
            .to_string();
        if extras.is_empty() {
            format!("{}{}", title, duration)
        } else {
            format!("{} — {}{}", extras, title, duration)
        }
    } else {
        format!("{} — {}{}", track_artist, title, duration)
    }
}

/// Accumulates tracks of one folder. First-seen values win for
/// artist/label/date, and artwork is resolved at most once.
#[derive(Debug, Default)]
pub struct ReleaseBuilder {
    artist: Option<String>,
    label: Option<String>,
    date: Option<String>,
    albums: Vec<String>,
    genres: BTreeSet<String>,
    styles: BTreeSet<String>,
    tracks: Vec<String>,
    artwork: ArtworkState,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artwork(&self) -> &ArtworkState {
        &self.artwork
    }

    /// Record the artwork outcome; ignored once already resolved
    pub fn set_artwork(&mut self, state: ArtworkState) {
        if !self.artwork.is_resolved() {
            self.artwork = state;
        }
    }

    pub fn add_track(&mut self, track: &ResolvedTrack) {
        self.artist.get_or_insert_with(|| track.album_artist.clone());
        self.label.get_or_insert_with(|| track.label.clone());
        self.date.get_or_insert_with(|| track.date.clone());

        if !self.albums.contains(&track.album) {
            self.albums.push(track.album.clone());
        }
        self.genres.insert(track.genre.clone());
        self.styles.insert(track.style.clone());
        self.tracks.push(track.display_entry());
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn finish(self) -> ReleaseRecord {
        ReleaseRecord {
            artist: self.artist.unwrap_or_default(),
            title: self.albums.join(" / "),
            label: self.label.unwrap_or_default(),
            catno: DEFAULT_CATNO.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            genre: join_set(&self.genres),
            style: join_set(&self.styles),
            tracks: self.tracks.join("\n"),
            date: self.date.unwrap_or_default(),
            images: self.artwork.url().to_string(),
        }
    }
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Turns a release folder into a [`ReleaseRecord`]
pub struct ReleaseAggregator<'a> {
    reader: &'a dyn TagReader,
    host: &'a dyn ImageHost,
}

impl<'a> ReleaseAggregator<'a> {
    pub fn new(reader: &'a dyn TagReader, host: &'a dyn ImageHost) -> Self {
        Self { reader, host }
    }

    pub fn aggregate(&self, folder: &Path) -> ReleaseRecord {
        let mut builder = ReleaseBuilder::new();

        for entry in WalkDir::new(folder)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !audio::is_audio_file(path) {
                continue;
            }

            let tags = match self.reader.read(path) {
                Ok(tags) if !tags.is_empty() => tags,
                Ok(_) => {
                    debug!("Skipping untagged file {}", path.display());
                    continue;
                }
                Err(e) => {
                    debug!("Skipping {}: {:#}", path.display(), e);
                    continue;
                }
            };

            if !builder.artwork().is_resolved() {
                let track_dir = path.parent().unwrap_or(folder);
                builder.set_artwork(artwork::acquire(&tags, track_dir, self.host));
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            builder.add_track(&ResolvedTrack::resolve(&tags, stem));
        }

        info!(
            "Collected {} tracks from {}",
            builder.track_count(),
            folder.display()
        );
        builder.finish()
    }
}
