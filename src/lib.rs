#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod controller;
pub mod files;
pub mod health;
pub mod processing;
pub mod save;
pub mod settings;
pub mod widget;

pub use app::UploadApp;
