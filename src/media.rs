use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use spdlog::{debug, error, info, trace, Logger};
use thiserror::Error;

use crate::content::media::MediaRef;

const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Copies the media referenced by rendered posts into a local directory.
/// Sources are fetched over http(s); `file://` urls and plain paths are copied from disk.
pub struct MediaCopier {
    http: reqwest::Client,
    logger: Arc<Logger>,
}

impl MediaCopier {
    pub fn new(logger: Arc<Logger>) -> Result<MediaCopier, MediaError> {
        let builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS));
        // tests talk to a local server, which must not go through an ambient proxy
        #[cfg(test)]
        let builder = builder.no_proxy();

        let http = builder
            .build()
            .map_err(|e| MediaError::Download {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(MediaCopier { http, logger })
    }

    /// Copies every reference into `target_dir`, returning how many copies failed.
    /// Files already present are left alone.
    pub async fn copy_files(&self, refs: &[MediaRef], target_dir: &Path, dry_run: bool) -> usize {
        let mut failures = 0;

        for media in refs {
            let target = target_dir.join(&media.local_file_name);
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                debug!(logger: self.logger, "Skipping {}, file exists", target.display());
                continue;
            }

            if dry_run {
                info!(logger: self.logger, "Would copy {} to {}", media.source_url, target.display());
                continue;
            }

            match self.copy_file(&media.source_url, &target).await {
                Ok(size) => debug!(logger: self.logger, "Copied {} to {} ({} bytes)", media.source_url, target.display(), size),
                Err(e) => {
                    error!(logger: self.logger, "{}", e);
                    failures += 1;
                }
            }
        }

        failures
    }

    async fn copy_file(&self, source: &str, target: &Path) -> Result<usize, MediaError> {
        let bytes = match local_source(source) {
            Some(path) => tokio::fs::read(&path).await.map_err(|e| MediaError::Download {
                url: source.to_string(),
                reason: e.to_string(),
            })?,
            None => self.download(source).await?,
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| MediaError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        tokio::fs::write(target, &bytes).await.map_err(|e| MediaError::Write {
            path: target.to_path_buf(),
            source: e,
        })?;

        Ok(bytes.len())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let response = self.http.get(url).send().await.map_err(|e| MediaError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(MediaError::Download {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| MediaError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

fn local_source(source: &str) -> Option<PathBuf> {
    if let Some(path) = source.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if source.contains("://") {
        return None;
    }
    Some(PathBuf::from(source))
}

/// Writes a generated document, creating parent directories as needed.
/// Returns 1 if the write failed, 0 otherwise, so callers can sum failures.
pub async fn write_markdown_file(path: &Path, document: &str, dry_run: bool, logger: &Logger) -> usize {
    if dry_run {
        info!(logger: logger, "Would write {}", path.display());
        trace!(logger: logger, "{}", document);
        return 0;
    }

    match write_atomic(path, document).await {
        Ok(()) => {
            debug!(logger: logger, "Wrote {}", path.display());
            0
        }
        Err(e) => {
            error!(logger: logger, "{}", e);
            1
        }
    }
}

async fn write_atomic(path: &Path, document: &str) -> Result<(), MediaError> {
    let write_err = |source| MediaError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, document).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::logger::build_logger;
    use crate::test_server::{request_lines, serve};

    use super::*;

    fn media_ref(source: &Path, name: &str) -> MediaRef {
        MediaRef {
            source_url: format!("file://{}", source.display()),
            local_file_name: name.to_string(),
        }
    }

    #[test]
    fn test_local_source() {
        assert_eq!(local_source("file:///tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(local_source("dump/a.png"), Some(PathBuf::from("dump/a.png")));
        assert_eq!(local_source("https://64.media.tumblr.com/a.png"), None);
    }

    #[tokio::test]
    async fn test_copy_files() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.png"), b"png").unwrap();
        std::fs::write(src.path().join("b.mp3"), b"mp3").unwrap();

        let copier = MediaCopier::new(build_logger(false, None).unwrap()).unwrap();
        let refs = vec![
            media_ref(&src.path().join("a.png"), "200_1.png"),
            media_ref(&src.path().join("b.mp3"), "200_2.mp3"),
            media_ref(&src.path().join("missing.gif"), "200_3.gif"),
        ];

        let target = dst.path().join("media");
        assert_eq!(copier.copy_files(&refs, &target, false).await, 1);
        assert_eq!(std::fs::read(target.join("200_1.png")).unwrap(), b"png");
        assert_eq!(std::fs::read(target.join("200_2.mp3")).unwrap(), b"mp3");
        assert!(!target.join("200_3.gif").exists());
    }

    #[tokio::test]
    async fn test_http_download() {
        let (base_url, requests) = serve(vec![
            (200, "jpeg bytes".to_string()),
            (404, "gone".to_string()),
        ]).await;
        let dst = tempfile::tempdir().unwrap();

        let copier = MediaCopier::new(build_logger(false, None).unwrap()).unwrap();
        let refs = vec![
            MediaRef::new("200_1", &format!("{}/a/tumblr_p_1280.jpg", base_url)),
            MediaRef::new("200_2", &format!("{}/b/tumblr_missing.png", base_url)),
        ];

        assert_eq!(copier.copy_files(&refs, dst.path(), false).await, 1);
        assert_eq!(std::fs::read(dst.path().join("200_1.jpg")).unwrap(), b"jpeg bytes");
        assert!(!dst.path().join("200_2.png").exists());

        let lines = request_lines(&requests);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("GET /a/tumblr_p_1280.jpg "));
        assert!(lines[1].starts_with("GET /b/tumblr_missing.png "));
    }

    #[tokio::test]
    async fn test_existing_files_are_skipped() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.png"), b"new").unwrap();
        std::fs::write(dst.path().join("200_1.png"), b"old").unwrap();

        let copier = MediaCopier::new(build_logger(false, None).unwrap()).unwrap();
        let refs = vec![media_ref(&src.path().join("a.png"), "200_1.png")];

        assert_eq!(copier.copy_files(&refs, dst.path(), false).await, 0);
        assert_eq!(std::fs::read(dst.path().join("200_1.png")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_dry_run_copies_nothing() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.png"), b"png").unwrap();

        let copier = MediaCopier::new(build_logger(false, None).unwrap()).unwrap();
        let refs = vec![media_ref(&src.path().join("a.png"), "200_1.png")];

        assert_eq!(copier.copy_files(&refs, dst.path(), true).await, 0);
        assert!(!dst.path().join("200_1.png").exists());
    }

    #[tokio::test]
    async fn test_write_markdown_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = build_logger(false, None).unwrap();
        let path = dir.path().join("posts").join("quick-thought").join("index.md");

        assert_eq!(write_markdown_file(&path, "---\nid: 200\n---\n", false, &logger).await, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "---\nid: 200\n---\n");
        assert!(!path.with_extension("md.tmp").exists());

        let dry = dir.path().join("dry.md");
        assert_eq!(write_markdown_file(&dry, "text", true, &logger).await, 0);
        assert!(!dry.exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let logger = build_logger(false, None).unwrap();
        std::fs::write(dir.path().join("file"), b"").unwrap();

        // parent is a regular file
        let path = dir.path().join("file").join("post.md");
        assert_eq!(write_markdown_file(&path, "text", false, &logger).await, 1);
    }
}
