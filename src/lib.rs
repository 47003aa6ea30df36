//! Folio - flat-file markdown CMS server
//!
//! Markdown documents with front matter organized into collections, a
//! media store for uploaded images, and a recycle-bin workflow, all backed
//! by the plain filesystem. One HTTP dispatch endpoint drives everything.

pub mod cache;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod logging;
pub mod paths;
pub mod safety;
pub mod store;
pub mod web;

pub use cache::{cache_key, FileCache};
pub use config::Config;
pub use error::{FolioError, Result};
pub use frontmatter::{FieldSchema, FieldType, FieldValue, FrontMatter};
pub use paths::{CollectionPaths, PathResolver};
pub use store::{
    ContentStore, MediaItem, MediaListing, MediaStore, MediaUpload, TrashedEntry, WriteOutcome,
};
pub use web::{AppState, WebServer};
