#[cfg(feature = "webview")]
mod engine;
pub mod navigation;

#[cfg(feature = "webview")]
pub use engine::Browser;
pub use navigation::{History, View, ViewKind};
