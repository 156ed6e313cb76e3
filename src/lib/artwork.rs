use anyhow::{Context, Result};
use magick_rust::{ColorspaceType, FilterType, MagickWand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::audio;
use crate::tags::TrackTags;
use crate::upload::ImageHost;

/// Written to the `images` column when no artwork could be published
pub const IMAGE_UPLOAD_FAILED: &str = "ImageUploadFailed";

/// Uploaded artwork never exceeds this bound on either side
pub const MAX_ARTWORK_SIZE: usize = 600;
pub const JPEG_QUALITY: usize = 90;

/// Where a folder's artwork came from.
///
/// Leaves `NotTried` at most once per folder; every other state is terminal.
/// `Embedded`/`External` hold the upload result, which is the failure
/// sentinel when the image was found but could not be published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArtworkState {
    #[default]
    NotTried,
    Embedded(String),
    External(String),
    Failed,
}

impl ArtworkState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ArtworkState::NotTried)
    }

    pub fn url(&self) -> &str {
        match self {
            ArtworkState::Embedded(url) | ArtworkState::External(url) => url,
            ArtworkState::NotTried | ArtworkState::Failed => IMAGE_UPLOAD_FAILED,
        }
    }
}

/// Run the fallback chain for the first track of a folder:
/// embedded picture, then the first image beside the track, then the sentinel.
pub fn acquire(tags: &TrackTags, track_dir: &Path, host: &dyn ImageHost) -> ArtworkState {
    if let Some(picture) = tags.embedded_picture.as_deref().filter(|p| !p.is_empty()) {
        debug!("Using embedded artwork ({} bytes)", picture.len());
        return ArtworkState::Embedded(publish(host, picture));
    }

    let Some(image_path) = find_external_image(track_dir) else {
        info!("No artwork found in {}", track_dir.display());
        return ArtworkState::Failed;
    };

    match fs::read(&image_path) {
        Ok(bytes) => {
            debug!("Using external artwork {}", image_path.display());
            ArtworkState::External(publish(host, &bytes))
        }
        Err(e) => {
            warn!("Failed to read artwork {}: {}", image_path.display(), e);
            ArtworkState::Failed
        }
    }
}

/// First image file in `dir`, by file name
pub fn find_external_image(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut images: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && audio::is_image_file(p))
        .collect();
    images.sort();
    images.into_iter().next()
}

/// Resize and upload; any failure degrades to [`IMAGE_UPLOAD_FAILED`]
pub fn publish(host: &dyn ImageHost, image: &[u8]) -> String {
    let prepared = match prepare_jpeg(image) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            warn!("Image resize failed, uploading original bytes: {:#}", e);
            image.to_vec()
        }
    };

    match host.upload(&prepared) {
        Ok(url) => url,
        Err(e) => {
            warn!("Upload failed: {}", e);
            IMAGE_UPLOAD_FAILED.to_string()
        }
    }
}

/// Decode any supported image and re-encode it as an sRGB JPEG that fits
/// within [`MAX_ARTWORK_SIZE`] on both sides. Smaller images are not enlarged.
pub fn prepare_jpeg(image: &[u8]) -> Result<Vec<u8>> {
    let wand = MagickWand::new();
    wand.read_image_blob(image)
        .context("Failed to decode artwork")?;

    let (width, height) = fit_within(
        wand.get_image_width(),
        wand.get_image_height(),
        MAX_ARTWORK_SIZE,
    );
    wand.resize_image(width, height, FilterType::Lanczos)
        .context("Failed to resize artwork")?;
    wand.transform_image_colorspace(ColorspaceType::sRGB)
        .context("Failed to convert artwork to RGB")?;
    wand.set_image_format("jpeg")?;
    wand.set_image_compression_quality(JPEG_QUALITY)?;
    wand.set_sampling_factors(&[1.0, 1.0, 1.0])?;

    Ok(wand.write_image_blob("jpeg")?)
}

/// Largest size with the same aspect ratio that fits in `bound`×`bound`
fn fit_within(width: usize, height: usize, bound: usize) -> (usize, usize) {
    if width <= bound && height <= bound {
        return (width.max(1), height.max(1));
    }
    let scale = (bound as f64 / width as f64).min(bound as f64 / height as f64);
    let scaled = |side: usize| ((side as f64 * scale).round() as usize).clamp(1, bound);
    (scaled(width), scaled(height))
}
