//! Valuecent training portal: course catalog, per-chapter progress shared
//! between windows, profile and theme preferences, and the pages that
//! present them.

pub mod ai;
pub mod app;
pub mod auth;
pub mod browser;
pub mod catalog;
pub mod config;
pub mod error;
pub mod profile;
pub mod progress;
pub mod storage;
pub mod theme;
pub mod ui;

pub use app::{Command, Completion, Dispatch, PendingTask, Portal, Screen, Services, Update};
pub use error::{PortalError, Result};
