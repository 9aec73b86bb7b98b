use serde::{Deserialize, Serialize};

/// Server used when nothing else is configured (native builds).
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8989";

/// Environment variable overriding the server URL on native builds.
pub const SERVER_URL_ENV: &str = "MD_TO_DOCX_SERVER_URL";

/// User settings, persisted by eframe between sessions.
///
/// The environment override only lives for the session and is never saved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    server_url: String,
    #[serde(skip)]
    server_url_override: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: platform_default_server_url(),
            server_url_override: None,
        }
    }
}

impl Settings {
    /// Environment beats persisted settings, which beat the default.
    pub fn resolve(persisted: Option<Settings>, env_server_url: Option<String>) -> Self {
        let mut settings = persisted.unwrap_or_default();
        settings.server_url = normalize_server_url(&settings.server_url);
        settings.server_url_override = env_server_url
            .filter(|url| !url.trim().is_empty())
            .map(|url| normalize_server_url(&url));
        settings
    }

    /// URL in effect for this session.
    pub fn server_url(&self) -> &str {
        self.server_url_override
            .as_deref()
            .unwrap_or(&self.server_url)
    }

    /// A URL chosen in the UI is persisted and replaces any override.
    pub fn set_server_url(&mut self, url: &str) {
        self.server_url = normalize_server_url(url);
        self.server_url_override = None;
    }

    /// Loads persisted settings and applies the environment override.
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        let persisted = storage.and_then(|storage| eframe::get_value(storage, eframe::APP_KEY));
        Self::resolve(persisted, env_server_url())
    }

    pub fn save(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }
}

pub fn normalize_server_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

#[cfg(not(target_arch = "wasm32"))]
fn env_server_url() -> Option<String> {
    // A missing .env file is the normal case.
    dotenvy::dotenv().ok();
    std::env::var(SERVER_URL_ENV).ok()
}

#[cfg(target_arch = "wasm32")]
fn env_server_url() -> Option<String> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_default_server_url() -> String {
    DEFAULT_SERVER_URL.to_owned()
}

/// In the browser the widget talks to the server that served the page.
#[cfg(target_arch = "wasm32")]
fn platform_default_server_url() -> String {
    web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .unwrap_or_default()
}
