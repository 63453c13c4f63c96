//! Blocking HTTP client for the prediction endpoints.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::image::{NormalizedTensor, TargetSize};

use super::types::{ClassPrediction, OsErrorPrediction, PredictRequest};

const OS_ERROR_PATH: &str = "/predict-os-error";
const CLASSIFY_PATH: &str = "/predict";

/// Client for the screenshot and general classification endpoints.
///
/// Failures are returned to the caller as-is; nothing is retried.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    base_url: String,
}

impl InferenceClient {
    /// Build a client from the configured server URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_http_client(&config.server_url, http))
    }

    /// Use a preconfigured `reqwest` client.
    pub fn with_http_client(base_url: &str, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Classify an OS error screenshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] without sending anything unless the
    /// tensor is `3x128x128`; otherwise transport, status and decoding errors.
    pub fn predict_os_error(&self, tensor: &NormalizedTensor) -> Result<OsErrorPrediction> {
        ensure_size(tensor, TargetSize::SCREENSHOT)?;
        let prediction: OsErrorPrediction = self.post(OS_ERROR_PATH, tensor)?;

        tracing::info!(
            "Predicted {} on {} ({:.2}%)",
            prediction.error_type,
            prediction.os_type,
            prediction.confidence * 100.0
        );
        Ok(prediction)
    }

    /// Run the general classifier on a `3x32x32` tensor.
    ///
    /// # Errors
    ///
    /// Same as [`InferenceClient::predict_os_error`].
    pub fn predict_class(&self, tensor: &NormalizedTensor) -> Result<ClassPrediction> {
        ensure_size(tensor, TargetSize::CLASSIFIER)?;
        let prediction: ClassPrediction = self.post(CLASSIFY_PATH, tensor)?;

        tracing::info!(
            "Predicted class {} ({:.2}%)",
            prediction.class,
            prediction.confidence * 100.0
        );
        Ok(prediction)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, tensor: &NormalizedTensor) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        tracing::info!("Sending {} values to {url}", tensor.len());

        let response = self
            .http
            .post(&url)
            .json(&PredictRequest::from(tensor))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        Ok(response.json()?)
    }
}

fn ensure_size(tensor: &NormalizedTensor, expected: TargetSize) -> Result<()> {
    let [channels, height, width] = tensor.shape();
    let expected_shape = [3, expected.height as usize, expected.width as usize];

    if [channels, height, width] != expected_shape {
        return Err(Error::ShapeMismatch {
            expected: format!("{expected_shape:?}"),
            actual: format!("{:?}", [channels, height, width]),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{solid_color, ImageNormalizer, ResampleFilter};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one HTTP request, answering with `status` and `body`.
    ///
    /// The join handle yields the request line and body that were received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }

            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();

            (
                request_line.trim_end().to_string(),
                String::from_utf8(request_body).unwrap(),
            )
        });

        (url, handle)
    }

    fn client(url: &str) -> InferenceClient {
        let http = Client::builder().no_proxy().build().unwrap();
        InferenceClient::with_http_client(url, http)
    }

    fn tensor(side: u32) -> NormalizedTensor {
        ImageNormalizer::new(TargetSize::square(side), ResampleFilter::Nearest)
            .unwrap()
            .normalize_image(&solid_color(10, 10, [0, 0, 255]))
    }

    #[test]
    fn test_predict_os_error_posts_tensor() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"error_type":"memory_error","os_type":"windows","confidence":0.5,"description":"d"}"#,
        );

        let prediction = client(&url).predict_os_error(&tensor(128)).unwrap();
        let (request_line, body) = server.join().unwrap();

        assert_eq!(prediction.error_type, crate::api::ErrorType::MemoryError);
        assert_eq!(request_line, "POST /predict-os-error HTTP/1.1");
        let sent: PredictRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(sent.image.len(), 3 * 128 * 128);
        assert!(sent.image[..128 * 128].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_predict_class() {
        let (url, server) = serve_once("200 OK", r#"{"class":7,"confidence":0.25}"#);

        let prediction = client(&format!("{url}/")).predict_class(&tensor(32)).unwrap();
        let (request_line, _) = server.join().unwrap();

        assert_eq!(prediction.class, 7);
        assert_eq!(request_line, "POST /predict HTTP/1.1");
    }

    #[test]
    fn test_error_status_maps_to_api_error() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);

        let err = client(&url).predict_os_error(&tensor(128)).unwrap_err();
        server.join().unwrap();

        match err {
            Error::Api { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_shape_is_rejected_before_sending() {
        // Nothing listens on this client; a request would fail with Http
        let err = client("http://127.0.0.1:9").predict_os_error(&tensor(32)).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        let err = client("http://127.0.0.1:9").predict_class(&tensor(128)).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_connection_refused_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client(&url).predict_class(&tensor(32)).unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
