//! Input resolution: turn a user-supplied path or URL into a local PDF.
//!
//! pdfium opens files by path, so URLs are downloaded into a `TempDir` that
//! lives as long as the returned [`ResolvedInput`]. Everything that can be
//! checked cheaply is checked here (existence, permissions, `%PDF` magic,
//! size limit) so later stages fail with a clear error instead of a pdfium
//! error code.

use crate::error::TranslateError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Largest accepted source document: 100 MiB.
pub const MAX_PDF_BYTES: u64 = 100 * 1024 * 1024;

/// A validated local PDF, possibly backed by a temp download.
#[derive(Debug)]
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is held so the download survives until processing ends.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local, validated PDF path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslateError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TranslateError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

fn check_pdf_bytes(path: &Path, size: u64, magic: Option<[u8; 4]>) -> Result<(), TranslateError> {
    if size > MAX_PDF_BYTES {
        return Err(TranslateError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_PDF_BYTES,
        });
    }
    match magic {
        Some(m) if &m == b"%PDF" => Ok(()),
        Some(m) => Err(TranslateError::NotAPdf {
            path: path.to_path_buf(),
            magic: m,
        }),
        None => Err(TranslateError::NotAPdf {
            path: path.to_path_buf(),
            magic: [0; 4],
        }),
    }
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, TranslateError> {
    if !path.exists() {
        return Err(TranslateError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => TranslateError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => TranslateError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mut magic = [0u8; 4];
    let magic = file.read_exact(&mut magic).ok().map(|_| magic);
    check_pdf_bytes(path, size, magic)?;

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), size);
    Ok(ResolvedInput::Local(path.to_path_buf()))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslateError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| TranslateError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            TranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let temp_dir = TempDir::new().map_err(|e| TranslateError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));

    if let Some(len) = response.content_length() {
        check_pdf_bytes(&file_path, len, Some(*b"%PDF"))?;
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    let magic = bytes.get(..4).map(|m| [m[0], m[1], m[2], m[3]]);
    check_pdf_bytes(&file_path, bytes.len() as u64, magic)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| TranslateError::Internal(format!("Failed to write temp file: {e}")))?;

    info!("Downloaded {} bytes to {}", bytes.len(), file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last URL path segment when it looks like a file name, else `downloaded.pdf`.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
