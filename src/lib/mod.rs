//! # Music Folder CSV Core Library
//!
//! Turns release folders of tagged audio files into rows for a catalog
//! listing import. Tag decoding, artwork publication and CSV writing live
//! here; the binary only adds the command line and the interactive menu.

pub mod artwork;
pub mod audio;
pub mod config;
pub mod export;
pub mod release;
pub mod tags;
pub mod upload;
pub mod utils;
