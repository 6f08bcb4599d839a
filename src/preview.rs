//! # Preview Preparation
//!
//! Decodes every uploaded image before layout starts. Decodes run in
//! parallel on the rayon pool: the three groups (day image, "before",
//! "after") are joined, and within a gallery `par_iter` keeps the input
//! order no matter which decode finishes first. Layout only begins once the
//! whole [`PreparedForm`] exists.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{FolhaError, Result};
use crate::image_loader::{decode_upload, LoadedImage};
use crate::model::{ImageUpload, TestimonyForm, MAX_GALLERY_IMAGES};

/// A decoded image with known intrinsic size, shared between the block plan
/// and the laid-out pages.
#[derive(Debug, Clone)]
pub struct ImagePreview {
    pub image: Arc<LoadedImage>,
}

impl ImagePreview {
    pub fn width_px(&self) -> u32 {
        self.image.width_px
    }

    pub fn height_px(&self) -> u32 {
        self.image.height_px
    }

    /// Intrinsic width / height.
    pub fn aspect_ratio(&self) -> f64 {
        self.image.aspect_ratio()
    }
}

/// Previews for every image slot of a form.
#[derive(Debug, Clone, Default)]
pub struct PreparedForm {
    pub day_image: Option<ImagePreview>,
    pub before_images: Vec<ImagePreview>,
    pub after_images: Vec<ImagePreview>,
}

/// Decode all images of `form`. The first failure aborts preparation.
pub fn prepare_previews(form: &TestimonyForm) -> Result<PreparedForm> {
    let (day_image, (before_images, after_images)) = rayon::join(
        || {
            form.day_image
                .as_ref()
                .map(|upload| decode_one(upload, "dayImage".to_string()))
                .transpose()
        },
        || {
            rayon::join(
                || decode_gallery(&form.before_images, "beforeImages"),
                || decode_gallery(&form.after_images, "afterImages"),
            )
        },
    );

    let prepared = PreparedForm {
        day_image: day_image?,
        before_images: before_images?,
        after_images: after_images?,
    };
    log::debug!(
        "Prepared previews: day={} before={} after={}",
        prepared.day_image.is_some(),
        prepared.before_images.len(),
        prepared.after_images.len()
    );
    Ok(prepared)
}

fn decode_gallery(uploads: &[ImageUpload], field: &str) -> Result<Vec<ImagePreview>> {
    let kept = if uploads.len() > MAX_GALLERY_IMAGES {
        log::warn!(
            "{} has {} images, keeping the first {}",
            field,
            uploads.len(),
            MAX_GALLERY_IMAGES
        );
        &uploads[..MAX_GALLERY_IMAGES]
    } else {
        uploads
    };

    kept.par_iter()
        .enumerate()
        .map(|(i, upload)| decode_one(upload, format!("{}[{}]", field, i)))
        .collect()
}

fn decode_one(upload: &ImageUpload, slot: String) -> Result<ImagePreview> {
    let image = decode_upload(&upload.data, upload.mime.as_deref())
        .map_err(|reason| FolhaError::image(slot, reason))?;
    Ok(ImagePreview {
        image: Arc::new(image),
    })
}
