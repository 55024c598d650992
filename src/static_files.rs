//! Static file serving for the bundled web UI

use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Serve `dir`, answering unknown paths with `index.html` so client-side
/// routes of the single-page app resolve.
///
/// Returns `None` when the directory does not exist; the API keeps working
/// without a UI.
pub fn spa_service(dir: &Path) -> Option<ServeDir<ServeFile>> {
    if !dir.is_dir() {
        tracing::warn!(
            "Static directory {} not found, serving API only",
            dir.display()
        );
        return None;
    }

    tracing::info!("Serving static files from {}", dir.display());
    Some(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))))
}
