use tracing::{debug, warn};

use super::http::HttpTransport;
use crate::encoding::{Encoder, FileSource};
use crate::error::Result;
use crate::models::{
    QrcodeGenerationBody, QrcodeGenerationOptions, QrcodeGenerationResult,
    QrcodeRecognitionBody, QrcodeRecognitionOptions, QrcodeRecognitionResult,
    RawQrcodeRecognitionResult,
};

pub const QRCODE_PATH: &str = "/api/qrcode";

#[derive(Clone, Debug)]
pub struct QrcodeClient {
    http: HttpTransport,
    encoder: Encoder,
}

impl QrcodeClient {
    pub(crate) fn new(http: HttpTransport, encoder: Encoder) -> Self {
        Self { http, encoder }
    }

    /// Renders `text` as a code image.
    ///
    /// On success `data` is a ready-to-display `data:image/jpeg;base64,...`
    /// URI; on failure it is the service's explanation, unchanged.
    pub async fn generate_qrcode(
        &self,
        text: &str,
        options: &QrcodeGenerationOptions,
    ) -> Result<QrcodeGenerationResult> {
        if let (Some(format), Some(_)) = (options.format, options.ec_level) {
            if !format.supports_ec_level() {
                warn!(%format, "ec_level has no effect for this format");
            }
        }

        let url = self.http.endpoint(QRCODE_PATH, options.url.as_deref());
        debug!(chars = text.chars().count(), "Generating code image");

        let body = QrcodeGenerationBody { text, options };
        let result: QrcodeGenerationResult =
            self.http.post_json("qrcodeGeneration", &url, &body).await?;
        Ok(result.decorate())
    }

    /// Finds and decodes every code in an image.
    pub async fn recognize_qrcode(
        &self,
        image: impl Into<FileSource>,
        options: &QrcodeRecognitionOptions,
    ) -> Result<QrcodeRecognitionResult> {
        options.validate()?;
        if options.threshold_ignored() {
            warn!("threshold is only applied with grayscale enabled");
        }

        let base64 = self.encoder.normalize_without_header(&image.into()).await?;
        let url = self.http.endpoint(QRCODE_PATH, options.url.as_deref());

        let body = QrcodeRecognitionBody { base64, options };
        let raw: RawQrcodeRecognitionResult =
            self.http.post_json("qrcodeRecognition", &url, &body).await?;
        QrcodeRecognitionResult::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::UmiError;
    use crate::models::{MedianFilterSize, QrcodeFormat};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client(base_url: &str) -> QrcodeClient {
        let http = HttpTransport::new(&ClientConfig::with_base_url(base_url)).unwrap();
        QrcodeClient::new(http, Encoder::detect().unwrap())
    }

    #[tokio::test]
    async fn test_generate_decorates_image() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/qrcode"))
            .and(body_json(json!({"text": "hello", "options": {}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 100, "data": "/9j/4AAQ"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client(&mock_server.uri())
            .generate_qrcode("hello", &QrcodeGenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(result.code, 100);
        assert!(result.data.starts_with("data:image/jpeg;base64,"));
        assert_eq!(result.data, "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[tokio::test]
    async fn test_generate_failure_left_undecorated() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/qrcode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 203,
                "data": "Unsupported format for this text"
            })))
            .mount(&mock_server)
            .await;

        let options = QrcodeGenerationOptions {
            format: Some(QrcodeFormat::Ean13),
            ..Default::default()
        };
        let result = client(&mock_server.uri())
            .generate_qrcode("not digits", &options)
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.data, "Unsupported format for this text");
    }

    #[tokio::test]
    async fn test_generate_empty_text_returns_service_diagnostic() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/qrcode"))
            .and(body_json(json!({"text": "", "options": {}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 201,
                "data": "text is empty"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client(&mock_server.uri())
            .generate_qrcode("", &QrcodeGenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(result.code, 201);
        assert_eq!(result.data, "text is empty");
    }

    #[tokio::test]
    async fn test_recognize_sends_preprocessing_options() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/qrcode"))
            .and(body_json(json!({
                "base64": "iVBORw0K",
                "options": {
                    "preprocessing.median_filter_size": 3,
                    "preprocessing.grayscale": true,
                    "preprocessing.threshold": 128
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 100,
                "data": [{
                    "orientation": 0,
                    "box": [[12, 12], [88, 12], [88, 88], [12, 88]],
                    "score": 1,
                    "format": "QRCode",
                    "text": "https://example.com"
                }],
                "time": 0.01,
                "timestamp": 1_711_111_111.0
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = QrcodeRecognitionOptions {
            median_filter_size: Some(MedianFilterSize::Three),
            grayscale: Some(true),
            threshold: Some(128),
            ..Default::default()
        };
        let result = client(&mock_server.uri())
            .recognize_qrcode("data:image/png;base64,iVBORw0K", &options)
            .await
            .unwrap();

        assert_eq!(result.codes().len(), 1);
        assert_eq!(result.codes()[0].text, "https://example.com");
        assert_eq!(result.codes()[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_recognize_image_without_codes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/qrcode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 100,
                "data": [],
                "time": 0.01,
                "timestamp": 1_711_111_111.0
            })))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server.uri())
            .recognize_qrcode("AAAA", &QrcodeRecognitionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.code, 100);
        assert!(result.codes().is_empty());
        assert_eq!(result.data.value().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_recognize_validates_before_sending() {
        let options = QrcodeRecognitionOptions {
            contrast_factor: Some(11.0),
            ..Default::default()
        };
        let err = client("http://127.0.0.1:1")
            .recognize_qrcode("AAAA", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, UmiError::Validation(_)));
    }
}
