//! Watermarking and storage of finished renders.

use std::path::Path;

use image::{DynamicImage, GenericImageView, RgbaImage};
use stylist_core::cut::Cut;
use stylist_core::storage::{generated_image_key, rewrite_public_url};
use stylist_core::watermark::{composite, encode_jpeg, WatermarkError, WATERMARKED_JPEG_QUALITY};
use stylist_storage::SharedStorage;

use crate::error::GenerationError;

/// A stored, watermarked render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Where a render belongs in storage.
#[derive(Debug, Clone, Copy)]
pub struct RenderTarget<'a> {
    pub family_id: &'a str,
    pub color_id: &'a str,
    pub run_id: &'a str,
    pub cut: Cut,
}

/// Shared post-processing for every engine.
pub struct Finisher {
    storage: SharedStorage,
    logo: RgbaImage,
    scale: f32,
    public_base_url: Option<String>,
}

impl Finisher {
    pub fn new(
        storage: SharedStorage,
        logo: RgbaImage,
        scale: f32,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            storage,
            logo,
            scale,
            public_base_url,
        }
    }

    /// Load the watermark logo from disk. A missing logo is an error.
    pub async fn load(
        storage: SharedStorage,
        watermark_path: &Path,
        scale: f32,
        public_base_url: Option<String>,
    ) -> Result<Self, GenerationError> {
        let bytes = tokio::fs::read(watermark_path).await.map_err(|e| {
            GenerationError::Asset(format!(
                "Watermark not found at {}: {e}",
                watermark_path.display()
            ))
        })?;
        let logo = image::load_from_memory(&bytes)
            .map_err(WatermarkError::Decode)?
            .to_rgba8();
        tracing::info!(path = %watermark_path.display(), scale, "Watermark loaded");
        Ok(Self::new(storage, logo, scale, public_base_url))
    }

    /// Watermark `raw`, store it under the generated key and return its
    /// public URL with the dimensions of the render.
    pub async fn finish(
        &self,
        raw: &[u8],
        target: RenderTarget<'_>,
    ) -> Result<FinishedImage, GenerationError> {
        let base = image::load_from_memory(raw).map_err(WatermarkError::Decode)?;
        let (width, height) = base.dimensions();
        let composed = composite(base.to_rgba8(), &self.logo, self.scale)?;
        let jpeg = encode_jpeg(&DynamicImage::ImageRgba8(composed), WATERMARKED_JPEG_QUALITY)?;

        let key = generated_image_key(target.family_id, target.color_id, target.run_id, target.cut);
        let saved = self.storage.save_bytes(jpeg, &key, "image/jpeg").await?;
        let url = self.public_url(saved);
        tracing::debug!(key = %key, url = %url, "Render stored");

        Ok(FinishedImage { url, width, height })
    }

    /// Saved URLs from any backend are rebased on the public base URL.
    fn public_url(&self, saved: String) -> String {
        match &self.public_base_url {
            Some(base) => rewrite_public_url(&saved, base),
            None => saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use std::sync::Arc;

    use async_trait::async_trait;
    use image::Rgba;
    use stylist_storage::{LocalStorage, StorageBackend, StorageError};

    use super::*;

    /// Bucket-style backend that answers with its own public host.
    struct BucketStorage;

    #[async_trait]
    impl StorageBackend for BucketStorage {
        async fn save_bytes(
            &self,
            _data: Vec<u8>,
            key: &str,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            Ok(format!("https://pub-abc.r2.dev/{key}"))
        }

        fn backend_name(&self) -> &'static str {
            "r2"
        }
    }

    fn render(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        encode_jpeg(&DynamicImage::ImageRgba8(img), 90).unwrap()
    }

    fn logo() -> RgbaImage {
        RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 200]))
    }

    #[tokio::test]
    async fn stores_under_generated_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path(), "http://localhost:8000/files"));
        let finisher = Finisher::new(storage, logo(), 0.3, None);

        let finished = finisher
            .finish(
                &render(200, 300),
                RenderTarget { family_id: "lana", color_id: "azul", run_id: "run1", cut: Cut::Recto },
            )
            .await
            .unwrap();

        assert_eq!(finished.url, "http://localhost:8000/files/generated/lana/azul/run1/recto.jpg");
        assert_eq!((finished.width, finished.height), (200, 300));
        let written = std::fs::read(dir.path().join("generated/lana/azul/run1/recto.jpg")).unwrap();
        assert_eq!(image::load_from_memory(&written).unwrap().dimensions(), (200, 300));
    }

    #[tokio::test]
    async fn rebases_local_urls() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path(), "http://localhost:8000/files"));
        let finisher = Finisher::new(storage, logo(), 0.3, Some("https://api.example.com".into()));

        let finished = finisher
            .finish(
                &render(64, 64),
                RenderTarget { family_id: "f", color_id: "c", run_id: "r", cut: Cut::Cruzado },
            )
            .await
            .unwrap();
        assert_eq!(finished.url, "https://api.example.com/files/generated/f/c/r/cruzado.jpg");
    }

    #[tokio::test]
    async fn rebases_bucket_urls() {
        let finisher = Finisher::new(
            Arc::new(BucketStorage),
            logo(),
            0.3,
            Some("https://cdn.shop.com".into()),
        );
        let finished = finisher
            .finish(
                &render(64, 64),
                RenderTarget { family_id: "lana", color_id: "azul", run_id: "r1", cut: Cut::Recto },
            )
            .await
            .unwrap();
        assert_eq!(finished.url, "https://cdn.shop.com/generated/lana/azul/r1/recto.jpg");
    }

    #[tokio::test]
    async fn keeps_bucket_urls_without_public_base() {
        let finisher = Finisher::new(Arc::new(BucketStorage), logo(), 0.3, None);
        let finished = finisher
            .finish(
                &render(64, 64),
                RenderTarget { family_id: "lana", color_id: "azul", run_id: "r1", cut: Cut::Cruzado },
            )
            .await
            .unwrap();
        assert_eq!(finished.url, "https://pub-abc.r2.dev/generated/lana/azul/r1/cruzado.jpg");
    }

    #[tokio::test]
    async fn missing_watermark_is_an_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path(), "http://x/files"));
        let result = Finisher::load(storage, &dir.path().join("nope.png"), 0.3, None).await;
        assert_matches!(result.map(|_| ()), Err(GenerationError::Asset(_)));
    }

    #[tokio::test]
    async fn undecodable_render_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path(), "http://x/files"));
        let finisher = Finisher::new(storage, logo(), 0.3, None);
        let result = finisher
            .finish(
                b"not an image",
                RenderTarget { family_id: "f", color_id: "c", run_id: "r", cut: Cut::Recto },
            )
            .await;
        assert_matches!(result, Err(GenerationError::Watermark(_)));
    }
}
