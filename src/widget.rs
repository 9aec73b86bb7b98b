//! Upload widget state machine.
//!
//! The widget is a snapshot value: every event produces a new [`WidgetState`]
//! and at most one [`Effect`] for the host to carry out. Nothing here touches
//! the network, the file system or the UI.

use std::fmt;
use std::sync::Arc;

use crate::processing::ConversionError;

pub const MARKDOWN_SUFFIX: &str = ".md";
pub const DOCX_SUFFIX: &str = ".docx";

pub const INVALID_SELECTION_ALERT: &str = "Please select a Markdown (.md) file.";
pub const BUSY_SELECTION_ALERT: &str =
    "A conversion is in progress. Choose another file once it has finished.";

/// Case-sensitive suffix check; the content is never inspected.
pub fn is_markdown_name(name: &str) -> bool {
    name.ends_with(MARKDOWN_SUFFIX)
}

/// Name under which a converted document is saved.
///
/// Only the first `.md` is replaced, so `my.md.file.md` becomes
/// `my.docx.file.md`.
pub fn docx_file_name(name: &str) -> String {
    name.replacen(MARKDOWN_SUFFIX, DOCX_SUFFIX, 1)
}

/// A file chosen by the user. Cheap to clone, the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn docx_name(&self) -> String {
        docx_file_name(&self.name)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum WidgetEvent {
    FileSelected(SelectedFile),
    ConvertRequested,
    ConversionSucceeded,
    ConversionFailed(ConversionError),
}

/// Work the host has to perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Alert(String),
    StartConversion(SelectedFile),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Idle,
    FileReady(SelectedFile),
    Converting(SelectedFile),
    Succeeded(SelectedFile),
    Failed {
        file: SelectedFile,
        error: ConversionError,
    },
}

/// What the drop zone area shows. Exactly one of the two at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visual<'a> {
    DropZone,
    FileInfo { file_name: &'a str },
}

/// Text of the status line, derived from the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Converting,
    Succeeded,
    Failed(ConversionError),
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Failed(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::Converting => write!(f, "Converting..."),
            Status::Succeeded => write!(f, "Conversion successful! File downloaded."),
            // The server's answer is not surfaced, only the fact that it failed.
            Status::Failed(ConversionError::Server(_)) => write!(f, "Conversion failed."),
            Status::Failed(err) => write!(f, "Error: {}", err),
        }
    }
}

impl WidgetState {
    /// Pure transition. Returns the next snapshot and the effect to run, if any.
    pub fn apply(&self, event: WidgetEvent) -> (WidgetState, Option<Effect>) {
        match (self, event) {
            (_, WidgetEvent::FileSelected(file)) if !is_markdown_name(file.name()) => (
                self.clone(),
                Some(Effect::Alert(INVALID_SELECTION_ALERT.to_owned())),
            ),
            (WidgetState::Converting(_), WidgetEvent::FileSelected(file)) => {
                log::warn!(
                    "Refusing selection of {} while a conversion is in flight",
                    file.name()
                );
                (
                    self.clone(),
                    Some(Effect::Alert(BUSY_SELECTION_ALERT.to_owned())),
                )
            }
            (_, WidgetEvent::FileSelected(file)) => (WidgetState::FileReady(file), None),

            (WidgetState::Idle, WidgetEvent::ConvertRequested) => (WidgetState::Idle, None),
            (WidgetState::Converting(_), WidgetEvent::ConvertRequested) => {
                log::warn!("Convert requested while a conversion is in flight; ignoring");
                (self.clone(), None)
            }
            (state, WidgetEvent::ConvertRequested) => match state.selected_file() {
                Some(file) => (
                    WidgetState::Converting(file.clone()),
                    Some(Effect::StartConversion(file.clone())),
                ),
                None => (WidgetState::Idle, None),
            },

            (WidgetState::Converting(file), WidgetEvent::ConversionSucceeded) => {
                (WidgetState::Succeeded(file.clone()), None)
            }
            (WidgetState::Converting(file), WidgetEvent::ConversionFailed(error)) => (
                WidgetState::Failed {
                    file: file.clone(),
                    error,
                },
                None,
            ),
            (state, event) => {
                log::warn!("Ignoring {:?} in state {:?}", event, state);
                (state.clone(), None)
            }
        }
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        match self {
            WidgetState::Idle => None,
            WidgetState::FileReady(file)
            | WidgetState::Converting(file)
            | WidgetState::Succeeded(file)
            | WidgetState::Failed { file, .. } => Some(file),
        }
    }

    pub fn is_converting(&self) -> bool {
        matches!(self, WidgetState::Converting(_))
    }

    pub fn visual(&self) -> Visual<'_> {
        match self.selected_file() {
            None => Visual::DropZone,
            Some(file) => Visual::FileInfo {
                file_name: file.name(),
            },
        }
    }

    pub fn status(&self) -> Status {
        match self {
            WidgetState::Idle | WidgetState::FileReady(_) => Status::Idle,
            WidgetState::Converting(_) => Status::Converting,
            WidgetState::Succeeded(_) => Status::Succeeded,
            WidgetState::Failed { error, .. } => Status::Failed(error.clone()),
        }
    }
}
