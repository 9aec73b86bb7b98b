use std::sync::Arc;

use poll_promise::Promise;

/// Path of the server conversion endpoint, relative to the server URL.
pub const CONVERT_PATH: &str = "/md-to-docx/convert/";

/// Name of the multipart field carrying the Markdown file.
pub const UPLOAD_FIELD: &str = "file";

/// Represents errors that can occur while converting a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The server answered with a non-2xx status. The body is not inspected.
    #[error("server responded with status {0}")]
    Server(u16),
    /// The request never produced a response (unreachable host, DNS, TLS, ...).
    #[error("{0}")]
    Transport(String),
    /// The converted document arrived but could not be saved.
    #[error("{0}")]
    Save(String),
}

impl From<reqwest::Error> for ConversionError {
    fn from(err: reqwest::Error) -> Self {
        ConversionError::Transport(err.to_string())
    }
}

/// One file on its way to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

/// Body of a successful conversion response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub bytes: Vec<u8>,
}

pub type ConversionPromise = Promise<Result<ConvertedDocument, ConversionError>>;

/// Sends Markdown files to a conversion service.
///
/// The returned promise is polled by the UI once per frame; it is the only
/// place where the widget waits on the outside world.
pub trait ConversionClient {
    fn convert(&self, upload: Upload) -> ConversionPromise;
}

/// Joins a server URL and [`CONVERT_PATH`] without doubling the slash.
pub fn convert_endpoint(server_url: &str) -> String {
    format!("{}{}", server_url.trim_end_matches('/'), CONVERT_PATH)
}

/// [`ConversionClient`] that talks to the real server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConversionClient {
    server_url: String,
}

impl HttpConversionClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn set_server_url(&mut self, server_url: impl Into<String>) {
        self.server_url = server_url.into();
    }

    pub fn endpoint(&self) -> String {
        convert_endpoint(&self.server_url)
    }
}

impl ConversionClient for HttpConversionClient {
    fn convert(&self, upload: Upload) -> ConversionPromise {
        let endpoint = self.endpoint();

        #[cfg(not(target_arch = "wasm32"))]
        {
            Promise::spawn_thread("md_to_docx_convert", move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| {
                        ConversionError::Transport(format!("failed to start HTTP runtime: {e}"))
                    })?;
                runtime.block_on(post_upload(&endpoint, upload))
            })
        }
        #[cfg(target_arch = "wasm32")]
        {
            Promise::spawn_local(async move { post_upload(&endpoint, upload).await })
        }
    }
}

/// POSTs `upload` as a multipart form with a single [`UPLOAD_FIELD`] field.
///
/// A fresh client is built per call: on native every upload runs on its own
/// short-lived runtime, and pooled connections must not outlive it.
pub async fn post_upload(
    endpoint: &str,
    upload: Upload,
) -> Result<ConvertedDocument, ConversionError> {
    log::info!(
        "Uploading {} ({} bytes) to {}",
        upload.file_name,
        upload.bytes.len(),
        endpoint
    );

    let client = reqwest::Client::builder().build()?;
    let part = reqwest::multipart::Part::bytes(upload.bytes.to_vec())
        .file_name(upload.file_name.clone());
    let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

    let response = client.post(endpoint).multipart(form).send().await?;
    let status = response.status();
    if !status.is_success() {
        log::error!(
            "Conversion of {} failed with status {}",
            upload.file_name,
            status
        );
        return Err(ConversionError::Server(status.as_u16()));
    }

    let bytes = response.bytes().await?;
    log::info!(
        "Received {} bytes for {}",
        bytes.len(),
        upload.file_name
    );
    Ok(ConvertedDocument {
        bytes: bytes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_appended_to_server_url() {
        assert_eq!(
            convert_endpoint("http://127.0.0.1:8989"),
            "http://127.0.0.1:8989/md-to-docx/convert/"
        );
        assert_eq!(
            convert_endpoint("https://docs.example.com/"),
            "https://docs.example.com/md-to-docx/convert/"
        );
    }

    #[test]
    fn client_endpoint_follows_server_url_changes() {
        let mut client = HttpConversionClient::new("http://localhost:1");
        client.set_server_url("http://localhost:2/");
        assert_eq!(client.server_url(), "http://localhost:2/");
        assert_eq!(client.endpoint(), "http://localhost:2/md-to-docx/convert/");
    }

    #[test]
    fn server_error_message_carries_status() {
        assert_eq!(
            ConversionError::Server(500).to_string(),
            "server responded with status 500"
        );
        assert_eq!(
            ConversionError::Transport("network down".into()).to_string(),
            "network down"
        );
    }
}
