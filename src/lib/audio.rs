use std::path::Path;

/// Audio container formats treated as tracks when scanning a release folder.
/// Comparison is done on the lower-cased extension.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "oga", "wav", "aiff", "aif", "aac", "m4a", "mp4", "wv", "ape", "mpc",
];

/// Image formats accepted as sibling cover art
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Check if a file path has a supported audio extension
pub fn is_audio_file<P: AsRef<Path>>(path: P) -> bool {
    let ext = lowercase_extension(path.as_ref());
    AUDIO_EXTENSIONS.iter().any(|&supported| supported == ext)
}

/// Check if a file path looks like a cover image
pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
    let ext = lowercase_extension(path.as_ref());
    IMAGE_EXTENSIONS.iter().any(|&supported| supported == ext)
}
