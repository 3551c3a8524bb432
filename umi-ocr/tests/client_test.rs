mod common;

use std::io::Write;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::client_for;
use umi_ocr::encoding::decode_base64;
use umi_ocr::models::{EcLevel, Language};
use umi_ocr::{
    Blob, Dict, ImageOcrOptions, QrcodeFormat, QrcodeGenerationOptions,
    QrcodeRecognitionOptions, UmiError,
};

#[tokio::test]
async fn test_image_ocr_from_file_on_disk() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"\x89PNG").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/ocr"))
        .and(body_json(json!({
            "base64": "iVBORw==",
            "options": {"ocr.language": "models/config_chinese.txt", "data.format": "dict"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 100,
            "data": [{"box": [[0, 0], [10, 0], [10, 10], [0, 10]], "score": 0.9, "text": "你好", "end": "\n"}],
            "score": 0.9,
            "time": 0.2,
            "timestamp": 1_711_111_111.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = ImageOcrOptions::<Dict> {
        language: Some(Language::Chinese),
        ..Default::default()
    };
    let result = client
        .image()
        .recognize_image(Blob::from_path(file.path()), &options)
        .await
        .unwrap();

    assert_eq!(result.data.value().unwrap()[0].text, "你好");
    assert!(result.timestamp_utc().is_some());
}

#[tokio::test]
async fn test_missing_file_fails_before_request() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .image()
        .recognize_image(
            Blob::from_path("/definitely/not/here.png"),
            &ImageOcrOptions::<Dict>::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, UmiError::Encoding(_)));
}

#[tokio::test]
async fn test_generated_code_can_be_decoded_to_jpeg() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/qrcode"))
        .and(body_json(json!({
            "text": "https://example.com",
            "options": {"format": "QRCode", "w": 256, "h": 256, "ec_level": 2}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 100, "data": "/9j/4AA="})),
        )
        .mount(&server)
        .await;

    let options = QrcodeGenerationOptions {
        format: Some(QrcodeFormat::QrCode),
        w: Some(256),
        h: Some(256),
        ec_level: Some(EcLevel::High),
        ..Default::default()
    };
    let result = client
        .qrcode()
        .generate_qrcode("https://example.com", &options)
        .await
        .unwrap();

    assert_eq!(result.data, "data:image/jpeg;base64,/9j/4AA=");
    assert_eq!(result.image_bytes().unwrap(), decode_base64("/9j/4AA=").unwrap());
}

#[tokio::test]
async fn test_scan_reports_every_code() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("POST"))
        .and(path("/api/qrcode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 100,
            "data": [
                {"orientation": 0, "box": [[0, 0], [1, 0], [1, 1], [0, 1]], "score": 1, "format": "QRCode", "text": "A"},
                {"orientation": 90, "box": [[2, 2], [3, 2], [3, 3], [2, 3]], "score": 1, "format": "EAN13", "text": "4006381333931"}
            ],
            "time": 0.03,
            "timestamp": 1_711_111_111.0
        })))
        .mount(&server)
        .await;

    let result = client
        .qrcode()
        .recognize_qrcode(vec![0u8, 1, 2], &QrcodeRecognitionOptions::default())
        .await
        .unwrap();

    let formats: Vec<QrcodeFormat> = result.codes().iter().map(|c| c.format).collect();
    assert_eq!(formats, vec![QrcodeFormat::QrCode, QrcodeFormat::Ean13]);
    assert_eq!(result.codes()[1].orientation, 90);
}
