use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use digifolder_core::models::{OcrOptions, OcrResult};
use digifolder_core::Config;

use crate::cache::OcrCache;
use crate::error::{OcrClientResult, OcrError};
use crate::vision::{to_ocr_result, VisionClient};

/// Anything that can turn an image file into text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn extract_text(&self, image: &Path, options: &OcrOptions) -> OcrClientResult<OcrResult>;
}

/// Cloud OCR with an optional on-disk result cache. No retries.
#[derive(Debug)]
pub struct OcrClient {
    vision: VisionClient,
    cache: Option<OcrCache>,
}

impl OcrClient {
    pub fn new(vision: VisionClient, cache: Option<OcrCache>) -> Self {
        Self { vision, cache }
    }

    pub fn from_config(config: &Config) -> OcrClientResult<Self> {
        let api_key = config.google_cloud_api_key().unwrap_or_default();
        let vision = VisionClient::new(
            config.vision_api_url(),
            api_key,
            Duration::from_secs(config.http_timeout_seconds()),
        )?;
        let cache = OcrCache::new(
            config.cache_dir(),
            Duration::from_secs(config.ocr_cache_ttl_secs()),
        );
        Ok(Self::new(vision, Some(cache)))
    }

    pub fn cache(&self) -> Option<&OcrCache> {
        self.cache.as_ref()
    }
}

#[async_trait]
impl TextRecognizer for OcrClient {
    #[tracing::instrument(skip(self, options), fields(image = %image.display(), language = %options.language))]
    async fn extract_text(&self, image: &Path, options: &OcrOptions) -> OcrClientResult<OcrResult> {
        let data = tokio::fs::read(image).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OcrError::ImageNotFound(image.to_path_buf())
            } else {
                OcrError::ImageRead {
                    path: image.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let cache = self.cache.as_ref().filter(|_| options.use_cache);
        let key = OcrCache::key(&data, options);

        if let Some(cache) = cache {
            if let Some(hit) = cache.get(&key).await {
                return Ok(hit);
            }
        }

        let response = self.vision.annotate(&data).await.map_err(|e| {
            tracing::error!(error = %e, "Text extraction failed");
            e
        })?;
        let result = to_ocr_result(&response, options);

        tracing::info!(
            chars = result.text.chars().count(),
            confidence = result.confidence,
            language = %result.language,
            "Text extracted"
        );

        if let Some(cache) = cache {
            if let Err(e) = cache.put(&key, &result).await {
                tracing::warn!(error = %e, "Failed to write OCR cache entry");
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use tempfile::tempdir;

    fn vision_body(text: &str, confidence: f64) -> String {
        json!({
            "responses": [{
                "fullTextAnnotation": { "text": text, "pages": [] },
                "textAnnotations": [{ "description": text, "locale": "en", "confidence": confidence }]
            }]
        })
        .to_string()
    }

    fn client(server: &mockito::Server, cache_root: Option<&Path>) -> OcrClient {
        let vision = VisionClient::new(server.url(), "test-key", Duration::from_secs(5)).unwrap();
        let cache = cache_root.map(|root| OcrCache::new(root, Duration::from_secs(3600)));
        OcrClient::new(vision, cache)
    }

    #[tokio::test]
    async fn test_extract_text_posts_base64_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/images:annotate")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({
                "requests": [{
                    "image": { "content": "aGVsbG8=" },
                    "features": [{ "type": "TEXT_DETECTION", "maxResults": 1 }]
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(vision_body("hello", 0.95))
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let image = dir.path().join("page.jpg");
        std::fs::write(&image, b"hello").unwrap();

        let result = client(&server, None)
            .extract_text(&image, &OcrOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.text, "hello");
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.is_handwritten, Some(false));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/images:annotate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(vision_body("cached", 0.9))
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let image = dir.path().join("page.jpg");
        std::fs::write(&image, b"same bytes").unwrap();
        // Same content under another name hits the same entry.
        let copy = dir.path().join("copy.jpg");
        std::fs::write(&copy, b"same bytes").unwrap();

        let ocr = client(&server, Some(dir.path()));
        let first = ocr.extract_text(&image, &OcrOptions::default()).await.unwrap();
        let second = ocr.extract_text(&copy, &OcrOptions::default()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_use_cache_false_always_calls_api() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/images:annotate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(vision_body("fresh", 0.9))
            .expect(2)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let image = dir.path().join("page.jpg");
        std::fs::write(&image, b"bytes").unwrap();

        let ocr = client(&server, Some(dir.path()));
        let options = OcrOptions {
            use_cache: false,
            ..OcrOptions::default()
        };
        ocr.extract_text(&image, &options).await.unwrap();
        ocr.extract_text(&image, &options).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/images:annotate")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"code":403,"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let image = dir.path().join("page.jpg");
        std::fs::write(&image, b"bytes").unwrap();

        let err = client(&server, None)
            .extract_text(&image, &OcrOptions::default())
            .await
            .unwrap_err();

        match err {
            OcrError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_per_response_error_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/images:annotate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let image = dir.path().join("page.jpg");
        std::fs::write(&image, b"bytes").unwrap();

        let err = client(&server, None)
            .extract_text(&image, &OcrOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Api { ref message, .. } if message == "Bad image data."));
    }

    #[tokio::test]
    async fn test_missing_image_is_not_found() {
        let server = mockito::Server::new_async().await;
        let err = client(&server, None)
            .extract_text(Path::new("/nonexistent/page.jpg"), &OcrOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::ImageNotFound(_)));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let err = VisionClient::new("http://localhost", " ", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, OcrError::Config(_)));
    }
}
