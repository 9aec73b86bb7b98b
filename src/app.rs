use std::time::Duration;

use egui_commonmark::{CommonMarkCache, CommonMarkViewer};
use poll_promise::Promise;

use crate::controller::UploadController;
use crate::files::{self, PickPromise};
use crate::health::{self, ServerHealth};
use crate::processing::HttpConversionClient;
use crate::save::DownloadSink;
use crate::settings::{normalize_server_url, Settings};
use crate::widget::{SelectedFile, Status, Visual};

type Controller = UploadController<HttpConversionClient, DownloadSink>;

/// Main application state
pub struct UploadApp {
    settings: Settings,
    server_url_input: String,
    controller: Controller,
    pick_promise: Option<PickPromise>,
    health: ServerHealth,
    health_promise: Option<Promise<ServerHealth>>,
    preview_cache: CommonMarkCache,
}

impl UploadApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load(cc.storage);
        log::info!("Using conversion server {}", settings.server_url());

        let client = HttpConversionClient::new(settings.server_url());
        let mut app = Self {
            server_url_input: settings.server_url().to_owned(),
            settings,
            controller: UploadController::new(client, DownloadSink),
            pick_promise: None,
            health: ServerHealth::Unknown,
            health_promise: None,
            preview_cache: CommonMarkCache::default(),
        };
        app.check_health();
        app
    }

    fn check_health(&mut self) {
        self.health = ServerHealth::Checking;
        self.health_promise = Some(health::probe(self.settings.server_url()));
    }

    fn apply_server_url(&mut self) {
        self.settings.set_server_url(&self.server_url_input);
        let server_url = self.settings.server_url().to_owned();
        log::info!("Switching conversion server to {}", server_url);
        self.server_url_input = server_url.clone();
        self.controller.client_mut().set_server_url(server_url);
        self.check_health();
    }

    fn open_picker(&mut self) {
        if self.pick_promise.is_none() {
            self.pick_promise = Some(files::pick_markdown_file());
        }
    }

    fn accept(&mut self, picked: Result<SelectedFile, String>) {
        match picked {
            Ok(file) => self.controller.select_file(file),
            Err(message) => {
                log::error!("{}", message);
                self.controller.raise_alert(message);
            }
        }
    }

    fn is_waiting(&self) -> bool {
        self.controller.is_converting() || self.pick_promise.is_some() || self.health_promise.is_some()
    }

    /// Picks up whatever finished since the last frame.
    fn poll_background(&mut self) {
        self.controller.poll();

        if let Some(promise) = self.pick_promise.take() {
            match promise.try_take() {
                Ok(Some(picked)) => self.accept(picked),
                Ok(None) => log::info!("File picker closed without a selection."),
                Err(promise) => self.pick_promise = Some(promise),
            }
        }

        if let Some(promise) = self.health_promise.take() {
            match promise.try_take() {
                Ok(health) => {
                    log::info!("Server health: {}", health);
                    self.health = health;
                }
                Err(promise) => self.health_promise = Some(promise),
            }
        }
    }

    fn handle_drag_drop(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (!i.raw.hovered_files.is_empty(), i.raw.dropped_files.clone())
        });

        if hovering {
            self.controller.drag_over();
        } else {
            self.controller.drag_leave();
        }

        // The alert is modal; nothing else is accepted until it is dismissed.
        if self.controller.alert().is_some() {
            return;
        }
        if let Some(picked) = files::from_dropped(&dropped) {
            self.accept(picked);
        }
    }

    fn drop_zone_ui(&mut self, ui: &mut egui::Ui) {
        let highlighted = self.controller.is_drop_target_highlighted();
        let visuals = ui.visuals();
        let (fill, stroke_color) = if highlighted {
            (
                visuals.selection.bg_fill.gamma_multiply(0.3),
                visuals.selection.stroke.color,
            )
        } else {
            (
                visuals.extreme_bg_color,
                visuals.widgets.noninteractive.bg_stroke.color,
            )
        };

        let response = egui::Frame::group(ui.style())
            .fill(fill)
            .stroke(egui::Stroke::new(2.0, stroke_color))
            .inner_margin(egui::Margin::same(30))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.heading("📄");
                    ui.label("Drag & drop a Markdown (.md) file here");
                    ui.weak("or click to browse");
                });
            })
            .response
            .interact(egui::Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand);

        if response.clicked() {
            self.open_picker();
        }
    }

    fn file_info_ui(&mut self, ui: &mut egui::Ui, file_name: &str) {
        let converting = self.controller.is_converting();

        ui.horizontal(|ui| {
            ui.label("Selected file:");
            ui.strong(file_name);
        });
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            let button_text = if converting { "..." } else { "Convert to DOCX" };
            let convert_button =
                egui::Button::new(button_text).min_size(egui::vec2(140.0, 30.0));
            if ui.add_enabled(!converting, convert_button).clicked() {
                log::info!("Convert triggered for {}", file_name);
                self.controller.convert();
            }
            if ui
                .add_enabled(!converting, egui::Button::new("Choose another file"))
                .clicked()
            {
                self.open_picker();
            }
            if converting {
                ui.add(egui::Spinner::new());
            }
        });
    }

    fn status_ui(&self, ui: &mut egui::Ui) {
        let status = self.controller.status();
        let text = status.to_string();
        match status {
            Status::Idle => {}
            Status::Converting => {
                ui.label(text);
            }
            Status::Succeeded => {
                ui.colored_label(egui::Color32::from_rgb(0x2e, 0x9e, 0x44), text);
            }
            Status::Failed(_) => {
                ui.colored_label(egui::Color32::RED, text);
            }
        }
    }

    fn server_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Server:");
            let input = ui.add(
                egui::TextEdit::singleline(&mut self.server_url_input)
                    .desired_width(260.0)
                    .hint_text("http://127.0.0.1:8989"),
            );
            let submitted =
                input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let changed = normalize_server_url(&self.server_url_input) != self.settings.server_url();
            if ui.add_enabled(changed, egui::Button::new("Apply")).clicked()
                || (submitted && changed)
            {
                self.apply_server_url();
            }

            let health_color = match self.health {
                ServerHealth::Online => egui::Color32::from_rgb(0x2e, 0x9e, 0x44),
                ServerHealth::Offline(_) => egui::Color32::RED,
                ServerHealth::Unknown | ServerHealth::Checking => ui.visuals().weak_text_color(),
            };
            ui.colored_label(health_color, format!("● {}", self.health));
            if ui
                .add_enabled(self.health_promise.is_none(), egui::Button::new("Check"))
                .clicked()
            {
                self.check_health();
            }
        });
    }

    fn alert_ui(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.alert().map(str::to_owned) else {
            return;
        };

        let modal = egui::Modal::new(egui::Id::new("selection_alert")).show(ctx, |ui| {
            ui.set_width(300.0);
            ui.label(message);
            ui.add_space(10.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.button("OK").clicked()
            })
            .inner
        });

        if modal.inner || modal.should_close() {
            self.controller.dismiss_alert();
        }
    }
}

impl eframe::App for UploadApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.settings.save(storage);
    }

    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background();
        self.handle_drag_drop(ctx);

        // --- Top Panel ---
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.heading("Markdown → DOCX");
            });
        });

        // --- Bottom Panel (Status/Server/Footer) ---
        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(5.0);
                let panel_frame = egui::Frame::NONE.inner_margin(egui::Margin::symmetric(10, 5));
                panel_frame.show(ui, |ui| {
                    self.status_ui(ui);
                    ui.add_space(2.0);
                    self.server_ui(ui);

                    // --- Footer Row ---
                    ui.horizontal(|ui| {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.add_space(10.0);
                            egui::widgets::global_theme_preference_buttons(ui);
                            let is_web = cfg!(target_arch = "wasm32");
                            if !is_web && ui.button("Quit").clicked() {
                                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                            }
                        });
                    });
                });
                ui.add_space(5.0);
            });

        // --- Central Panel (Drop zone or file info + preview) ---
        egui::CentralPanel::default().show(ctx, |ui| {
            let selected_name = match self.controller.visual() {
                Visual::DropZone => None,
                Visual::FileInfo { file_name } => Some(file_name.to_owned()),
            };
            match selected_name {
                None => self.drop_zone_ui(ui),
                Some(file_name) => self.file_info_ui(ui, &file_name),
            }

            if let Some(file) = self.controller.state().selected_file() {
                ui.add_space(10.0);
                ui.separator();
                ui.label("Preview");
                let text = String::from_utf8_lossy(file.bytes());
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .show(ui, |ui| {
                            CommonMarkViewer::new().show(ui, &mut self.preview_cache, &text);
                        });
                });
            }
        });

        self.alert_ui(ctx);

        if self.is_waiting() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
