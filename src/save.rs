//! Saving converted documents: a save dialog on native, a synthesized
//! download link in the browser.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::HtmlAnchorElement;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save cancelled")]
    Cancelled,
    #[error("failed to write {}: {}", .path.display(), .source)]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("browser download failed: {0}")]
    Browser(String),
}

impl From<SaveError> for crate::processing::ConversionError {
    fn from(err: SaveError) -> Self {
        crate::processing::ConversionError::Save(err.to_string())
    }
}

/// Destination for converted documents.
pub trait DocumentSink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SaveError>;
}

/// Saves the way the current platform downloads files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadSink;

impl DocumentSink for DownloadSink {
    #[cfg(not(target_arch = "wasm32"))]
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SaveError> {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter("Word Document", &["docx"])
            .save_file()
        else {
            log::info!("User cancelled save dialog.");
            return Err(SaveError::Cancelled);
        };
        std::fs::write(&path, bytes).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("Document saved to: {:?}", path);
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SaveError> {
        trigger_download(file_name, bytes)
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(value: wasm_bindgen::JsValue) -> SaveError {
    SaveError::Browser(format!("{:?}", value))
}

/// Wraps `bytes` in a Blob and clicks a hidden `<a download>` pointing at it.
#[cfg(target_arch = "wasm32")]
fn trigger_download(file_name: &str, bytes: &[u8]) -> Result<(), SaveError> {
    let missing = |what: &str| SaveError::Browser(format!("no {what} available"));
    let window = web_sys::window().ok_or_else(|| missing("window"))?;
    let document = window.document().ok_or_else(|| missing("document"))?;
    let body = document.body().ok_or_else(|| missing("document body"))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(DOCX_MIME);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(js_error)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(js_error)?;

    let link = document
        .create_element("a")
        .map_err(js_error)?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| SaveError::Browser("created element is not an anchor".to_owned()))?;
    link.set_href(&url);
    link.set_download(file_name);
    link.style()
        .set_property("display", "none")
        .map_err(js_error)?;

    body.append_child(&link).map_err(js_error)?;
    link.click();
    link.remove();
    log::info!("Triggered download for {}", file_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ConversionError;

    #[test]
    fn save_errors_become_conversion_errors() {
        let err: ConversionError = SaveError::Cancelled.into();
        assert_eq!(err, ConversionError::Save("save cancelled".to_owned()));
    }

    #[test]
    fn io_error_names_the_path() {
        let err = SaveError::Io {
            path: "out/report.docx".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to write out/report.docx: denied");
    }
}
