use tracing::debug;

use super::http::HttpTransport;
use crate::encoding::{Encoder, FileSource};
use crate::error::Result;
use crate::models::{
    DataFormat, ImageOcrBody, ImageOcrOptions, ImageOcrResult, RawImageOcrResult,
};

pub const IMAGE_OCR_PATH: &str = "/api/ocr";

#[derive(Clone, Debug)]
pub struct ImageOcrClient {
    http: HttpTransport,
    encoder: Encoder,
}

impl ImageOcrClient {
    pub(crate) fn new(http: HttpTransport, encoder: Encoder) -> Self {
        Self { http, encoder }
    }

    /// Recognizes text in a single image.
    ///
    /// The shape of `data` in the result follows `F`: text blocks for
    /// [`Dict`](crate::models::Dict), one string for
    /// [`Text`](crate::models::Text).
    pub async fn recognize_image<F: DataFormat>(
        &self,
        image: impl Into<FileSource>,
        options: &ImageOcrOptions<F>,
    ) -> Result<ImageOcrResult<F>> {
        let base64 = self.encoder.normalize_without_header(&image.into()).await?;
        let url = self.http.endpoint(IMAGE_OCR_PATH, options.url.as_deref());
        debug!(format = %F::FORMAT, bytes = base64.len(), "Recognizing image");

        let body = ImageOcrBody { base64, options };
        let raw: RawImageOcrResult = self.http.post_json("imageOcr", &url, &body).await?;
        ImageOcrResult::from_raw(raw)
    }
}
