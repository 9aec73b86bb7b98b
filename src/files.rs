//! Turning picked and dropped files into [`SelectedFile`]s.

use poll_promise::Promise;

#[cfg(not(target_arch = "wasm32"))]
use crate::widget::is_markdown_name;
use crate::widget::SelectedFile;

/// `None` when the user closed the picker without choosing anything,
/// `Some(Err(_))` when the chosen file could not be read.
pub type PickPromise = Promise<Option<Result<SelectedFile, String>>>;

/// Opens the platform file picker, filtered to Markdown files.
pub fn pick_markdown_file() -> PickPromise {
    #[cfg(not(target_arch = "wasm32"))]
    {
        // The native dialog is modal and must run on the UI thread.
        let picked = rfd::FileDialog::new()
            .add_filter("Markdown", &["md"])
            .pick_file()
            .map(|path| from_path(&path));
        Promise::from_ready(picked)
    }
    #[cfg(target_arch = "wasm32")]
    {
        Promise::spawn_local(async {
            let handle = rfd::AsyncFileDialog::new()
                .add_filter("Markdown", &["md"])
                .pick_file()
                .await?;
            let name = handle.file_name();
            let bytes = handle.read().await;
            Some(Ok(SelectedFile::new(name, bytes)))
        })
    }
}

/// First dropped file, if any. Only one file is taken per drop.
pub fn from_dropped(files: &[egui::DroppedFile]) -> Option<Result<SelectedFile, String>> {
    let file = files.first()?;

    if let Some(bytes) = &file.bytes {
        return Some(Ok(SelectedFile::new(file.name.clone(), bytes.clone())));
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Some(path) = &file.path {
            return Some(from_path(path));
        }
    }

    Some(Err(format!(
        "Could not read dropped file {:?}: no content available",
        file.name
    )))
}

/// Reads a file from disk. Names the controller will reject are not read.
#[cfg(not(target_arch = "wasm32"))]
pub fn from_path(path: &std::path::Path) -> Result<SelectedFile, String> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !is_markdown_name(&name) {
        return Ok(SelectedFile::new(name, Vec::<u8>::new()));
    }

    std::fs::read(path)
        .map(|bytes| SelectedFile::new(name, bytes))
        .map_err(|e| format!("Could not read {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn dropped_bytes_are_used_directly() {
        let dropped = egui::DroppedFile {
            name: "notes.md".to_owned(),
            bytes: Some(Arc::from(&b"# Notes"[..])),
            ..Default::default()
        };
        let file = from_dropped(&[dropped]).unwrap().unwrap();
        assert_eq!(file.name(), "notes.md");
        assert_eq!(&file.bytes()[..], b"# Notes");
    }

    #[test]
    fn nothing_dropped_yields_nothing() {
        assert!(from_dropped(&[]).is_none());
    }

    #[test]
    fn dropped_file_without_content_is_an_error() {
        let dropped = egui::DroppedFile {
            name: "ghost.md".to_owned(),
            ..Default::default()
        };
        assert!(from_dropped(&[dropped]).unwrap().is_err());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn reads_markdown_from_disk() {
        let dir = std::env::temp_dir().join(format!("docx_uploader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("draft.md");
        std::fs::write(&path, "# Draft").unwrap();

        let file = from_path(&path).unwrap();
        assert_eq!(file.name(), "draft.md");
        assert_eq!(&file.bytes()[..], b"# Draft");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_markdown_path_is_not_read() {
        let file = from_path(std::path::Path::new("/definitely/missing/photo.png")).unwrap();
        assert_eq!(file.name(), "photo.png");
        assert!(file.bytes().is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn unreadable_markdown_is_an_error() {
        let err = from_path(std::path::Path::new("/definitely/missing/notes.md")).unwrap_err();
        assert!(err.starts_with("Could not read"));
    }
}
