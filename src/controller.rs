//! Upload Widget Controller.
//!
//! Glues the [`WidgetState`] machine to a [`ConversionClient`] and a
//! [`DocumentSink`]. All methods run on the UI thread; the conversion request
//! is the only thing that completes later, picked up by [`UploadController::poll`].

use chrono::{DateTime, Utc};

use crate::processing::{ConversionClient, ConversionPromise, Upload};
use crate::save::DocumentSink;
use crate::widget::{
    docx_file_name, Effect, SelectedFile, Status, Visual, WidgetEvent, WidgetState,
};

struct PendingConversion {
    file_name: String,
    started_at: DateTime<Utc>,
    promise: ConversionPromise,
}

pub struct UploadController<C, S> {
    state: WidgetState,
    drop_target_highlighted: bool,
    alert: Option<String>,
    pending: Option<PendingConversion>,
    client: C,
    sink: S,
}

impl<C: ConversionClient, S: DocumentSink> UploadController<C, S> {
    pub fn new(client: C, sink: S) -> Self {
        Self {
            state: WidgetState::Idle,
            drop_target_highlighted: false,
            alert: None,
            pending: None,
            client,
            sink,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn visual(&self) -> Visual<'_> {
        self.state.visual()
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn is_converting(&self) -> bool {
        self.state.is_converting()
    }

    pub fn is_drop_target_highlighted(&self) -> bool {
        self.drop_target_highlighted
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Picker or drop. Invalid names, or any selection while a conversion is
    /// running, raise an alert and change nothing else.
    pub fn select_file(&mut self, file: SelectedFile) {
        log::info!("File offered: {:?}", file);
        self.dispatch(WidgetEvent::FileSelected(file));
    }

    /// Highlights the drop zone, but only while it is on screen.
    pub fn drag_over(&mut self) {
        self.drop_target_highlighted = self.visual() == Visual::DropZone;
    }

    pub fn drag_leave(&mut self) {
        self.drop_target_highlighted = false;
    }

    /// Starts a conversion of the selected file. Does nothing without a file
    /// or while a conversion is already running.
    pub fn convert(&mut self) {
        self.dispatch(WidgetEvent::ConvertRequested);
    }

    /// Shows a blocking message outside the state machine (e.g. unreadable file).
    pub fn raise_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Resumes the in-flight conversion if its response has arrived.
    ///
    /// Returns `true` when a conversion finished during this call.
    pub fn poll(&mut self) -> bool {
        let Some(PendingConversion {
            file_name,
            started_at,
            promise,
        }) = self.pending.take()
        else {
            return false;
        };

        let result = match promise.try_take() {
            Ok(result) => result,
            Err(promise) => {
                self.pending = Some(PendingConversion {
                    file_name,
                    started_at,
                    promise,
                });
                return false;
            }
        };

        log::info!(
            "Conversion of {} finished after {} ms",
            file_name,
            (Utc::now() - started_at).num_milliseconds()
        );

        let event = match result {
            Ok(document) => {
                let docx_name = docx_file_name(&file_name);
                match self.sink.save(&docx_name, &document.bytes) {
                    Ok(()) => WidgetEvent::ConversionSucceeded,
                    Err(err) => {
                        log::error!("Saving {} failed: {}", docx_name, err);
                        WidgetEvent::ConversionFailed(err.into())
                    }
                }
            }
            Err(err) => {
                log::error!("Conversion of {} failed: {}", file_name, err);
                WidgetEvent::ConversionFailed(err)
            }
        };
        self.dispatch(event);
        true
    }

    fn dispatch(&mut self, event: WidgetEvent) {
        let (next, effect) = self.state.apply(event);
        self.state = next;

        match effect {
            Some(Effect::Alert(message)) => {
                log::warn!("{}", message);
                self.alert = Some(message);
            }
            Some(Effect::StartConversion(file)) => {
                let upload = Upload {
                    file_name: file.name().to_owned(),
                    bytes: file.bytes().clone(),
                };
                self.pending = Some(PendingConversion {
                    file_name: upload.file_name.clone(),
                    started_at: Utc::now(),
                    promise: self.client.convert(upload),
                });
            }
            None => {}
        }
    }
}
