use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::config::AssetsConfig;

/// Serves files from a configured directory as a fall-through when no API
/// route handled the request.
#[derive(Debug, Clone)]
pub struct AssetServer {
    base_dir: PathBuf,
    index: String,
}

impl AssetServer {
    pub fn new(config: &AssetsConfig) -> Self {
        Self { base_dir: config.folder.clone(), index: config.index.clone() }
    }

    /// Map a URL path to a file inside the base directory, rejecting any
    /// form of parent traversal.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let clean = url_path.trim_start_matches('/');
        let mut mapped = self.base_dir.clone();
        for component in Path::new(clean).components() {
            match component {
                Component::Normal(segment) => mapped.push(segment),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(mapped)
    }

    /// Attempt to serve `path`. `None` means "no asset here" and the caller
    /// falls through to the 404. Only GET and HEAD are served; directory
    /// requests map to the configured index file.
    pub async fn serve(&self, method: &Method, path: &str) -> Option<Response> {
        if method != Method::GET && method != Method::HEAD {
            return None;
        }

        let mut file_path = self.map_path(path)?;
        match tokio::fs::metadata(&file_path).await {
            Ok(meta) if meta.is_dir() => file_path.push(&self.index),
            Ok(_) => {}
            Err(_) => {
                // `/` and other bare prefixes land here when the directory
                // itself was mapped; everything else is a miss
                if path.ends_with('/') || path.is_empty() {
                    file_path.push(&self.index);
                } else {
                    return None;
                }
            }
        }

        let bytes = match tokio::fs::read(&file_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %file_path.display(), error = %err, "Asset read failed");
                return None;
            }
        };

        let content_type = content_type_for(&file_path);
        let body = if method == Method::HEAD { Body::empty() } else { Body::from(bytes) };
        Some(
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response(),
        )
    }
}

/// Infer the content type from the file extension; text types carry an
/// explicit UTF-8 charset.
fn content_type_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime::TEXT {
        format!("{}; charset=UTF-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}
