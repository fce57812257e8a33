//! Media download with content type detection.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncReadExt;

use crate::download::fetch::Fetch;
use crate::error::{Error, Result};
use crate::fs::{append_extension, ensure_dir, temp_download_path};
use crate::media::sniff::{detect_extension, SNIFF_LEN};
use crate::media::DownloadedMedia;

/// Downloads media next to a base path and names it after its detected type.
#[derive(Clone)]
pub struct DownloadManager {
    fetcher: Arc<dyn Fetch>,
}

impl DownloadManager {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Download `url` to `{base_path}.{ext}`.
    ///
    /// `ext` is sniffed from the downloaded bytes, falling back to
    /// `default_extension`. The returned file exists and is non-empty.
    pub async fn download(
        &self,
        url: &str,
        base_path: &Path,
        default_extension: &str,
    ) -> Result<DownloadedMedia> {
        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent).await?;
            }
        }

        let temp_path = temp_download_path(base_path);

        let written = match self.fetcher.fetch(url, &temp_path).await {
            Ok(written) => written,
            Err(e) => {
                discard(&temp_path).await;
                return Err(e);
            }
        };

        if written == 0 {
            discard(&temp_path).await;
            return Err(Error::Download(format!("Empty response from {}", url)));
        }

        let prefix = match read_prefix(&temp_path).await {
            Ok(prefix) => prefix,
            Err(e) => {
                discard(&temp_path).await;
                return Err(e);
            }
        };

        let extension = match detect_extension(&prefix) {
            Some(ext) => ext,
            None => {
                tracing::debug!(
                    "Unrecognized content from {}, using .{}",
                    url,
                    default_extension
                );
                default_extension
            }
        };

        let final_path = append_extension(base_path, extension);
        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            discard(&temp_path).await;
            return Err(e.into());
        }

        let size = tokio::fs::metadata(&final_path).await?.len();
        tracing::debug!("Downloaded {} ({} bytes)", final_path.display(), size);

        Ok(DownloadedMedia::new(final_path, size))
    }
}

async fn read_prefix(path: &Path) -> Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut prefix).await?;
    Ok(prefix)
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial download {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::fetch::HttpFetcher;
    use crate::media::MediaKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";
    const MP4: &[u8] = b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00isomiso2avc1mp41\x00\x00\x00\x08free";

    async fn serve(server: &MockServer, route: &str, status: u16, body: &'static [u8]) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
            .mount(server)
            .await;
    }

    fn manager() -> DownloadManager {
        DownloadManager::new(Arc::new(HttpFetcher::new("reposter-test/0.1").unwrap()))
    }

    fn leftover_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_download_detects_actual_type() {
        let server = MockServer::start().await;
        // Served under a .gifv URL but the payload is an MP4
        serve(&server, "/clip.gifv", 200, MP4).await;
        let dir = tempfile::tempdir().unwrap();

        let media = manager()
            .download(
                &format!("{}/clip.gifv", server.uri()),
                &dir.path().join("clip"),
                "gif",
            )
            .await
            .unwrap();

        assert_eq!(media.path, dir.path().join("clip.mp4"));
        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!(media.size, MP4.len() as u64);
        assert_eq!(leftover_files(dir.path()), vec!["clip.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_download_gif() {
        let server = MockServer::start().await;
        serve(&server, "/xyz.gif", 200, GIF).await;
        let dir = tempfile::tempdir().unwrap();

        let media = manager()
            .download(
                &format!("{}/xyz.gif", server.uri()),
                &dir.path().join("xyz"),
                "gif",
            )
            .await
            .unwrap();

        assert_eq!(media.path, dir.path().join("xyz.gif"));
        assert_eq!(media.kind, MediaKind::Animation);
    }

    #[tokio::test]
    async fn test_download_falls_back_to_default_extension() {
        let server = MockServer::start().await;
        serve(&server, "/blob", 200, b"plain bytes with no signature").await;
        let dir = tempfile::tempdir().unwrap();

        let media = manager()
            .download(
                &format!("{}/blob", server.uri()),
                &dir.path().join("blob"),
                "jpg",
            )
            .await
            .unwrap();

        assert_eq!(media.path, dir.path().join("blob.jpg"));
    }

    #[tokio::test]
    async fn test_download_empty_body_fails_and_cleans_up() {
        let server = MockServer::start().await;
        serve(&server, "/empty", 200, b"").await;
        let dir = tempfile::tempdir().unwrap();

        let err = manager()
            .download(
                &format!("{}/empty", server.uri()),
                &dir.path().join("empty"),
                "jpg",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download(_)));
        assert!(leftover_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_download_http_error_fails_and_cleans_up() {
        let server = MockServer::start().await;
        serve(&server, "/gone", 404, b"not found").await;
        let dir = tempfile::tempdir().unwrap();

        let err = manager()
            .download(
                &format!("{}/gone", server.uri()),
                &dir.path().join("gone"),
                "jpg",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download(_)));
        assert!(leftover_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_download_creates_missing_directory() {
        let server = MockServer::start().await;
        serve(&server, "/xyz.gif", 200, GIF).await;
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("tmp").join("xyz");

        let media = manager()
            .download(&format!("{}/xyz.gif", server.uri()), &base, "gif")
            .await
            .unwrap();

        assert!(media.path.exists());
    }
}
