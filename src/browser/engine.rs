use crate::app::{Command, Completion, Dispatch, Portal, Update};
use crate::storage::StorageEvent;
use crate::ui::PageInspector;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Runtime;

const WINDOW_TITLE: &str = "VALUECENT";

enum UserEvent {
    Ipc(String),
    Completed(Completion),
    StorageChanged,
}

/// Desktop window hosting the portal in a webview.
pub struct Browser {
    portal: Portal,
    runtime: Runtime,
}

impl Browser {
    pub fn new(portal: Portal, runtime: Runtime) -> Self {
        Self { portal, runtime }
    }

    pub fn run(self) -> Result<()> {
        // EventLoop must be created on the main thread (macOS requirement)
        use wry::{
            application::{
                dpi::LogicalSize,
                event::{Event, StartCause, WindowEvent},
                event_loop::{ControlFlow, EventLoopBuilder},
                window::{Theme as WindowTheme, WindowBuilder},
            },
            webview::WebViewBuilder,
        };

        let Browser {
            mut portal,
            runtime,
        } = self;
        let inspector = PageInspector::new();

        let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
        let proxy = event_loop.create_proxy();
        let completions = event_loop.create_proxy();
        let changes = Mutex::new(event_loop.create_proxy());
        let subscriptions = portal.subscribe_changes(Arc::new(move |event: &StorageEvent| {
            log::debug!("'{}' changed in storage", event.key);
            let _ = changes.lock().send_event(UserEvent::StorageChanged);
        }));

        let window = WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(1280.0, 800.0))
            .build(&event_loop)
            .context("Failed to create window")?;
        let mut prefers_dark = window.theme() == WindowTheme::Dark;

        let webview = WebViewBuilder::new(window)?
            .with_url(&data_url(&portal.render(prefers_dark)))?
            .with_ipc_handler(move |_, msg| {
                if proxy.send_event(UserEvent::Ipc(msg)).is_err() {
                    log::warn!("Event loop closed, dropping message");
                }
            })
            .with_devtools(cfg!(debug_assertions))
            .build()?;

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Wait;
            let _ = &subscriptions;

            let update = match event {
                Event::NewEvents(StartCause::Init) => {
                    log::info!("Portal window ready");
                    Update::NONE
                }
                Event::UserEvent(UserEvent::Ipc(msg)) => match Command::parse(&msg) {
                    Ok(command) => {
                        log::debug!("command: {:?}", command);
                        match portal.dispatch(command) {
                            Dispatch::Done(update) => update,
                            Dispatch::Pending { update, task } => {
                                // Login and suggestions must not hold up the event loop.
                                let proxy = completions.clone();
                                runtime.spawn(async move {
                                    let completion = task.await;
                                    if proxy.send_event(UserEvent::Completed(completion)).is_err() {
                                        log::debug!("Window closed before background work finished");
                                    }
                                });
                                update
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Ignoring malformed message {}: {}", msg, e);
                        Update::NONE
                    }
                },
                Event::UserEvent(UserEvent::Completed(completion)) => portal.complete(completion),
                Event::UserEvent(UserEvent::StorageChanged) => Update::RERENDER,
                Event::WindowEvent {
                    event: WindowEvent::ThemeChanged(theme),
                    ..
                } => {
                    prefers_dark = theme == WindowTheme::Dark;
                    Update::RERENDER
                }
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    *control_flow = ControlFlow::Exit;
                    Update::NONE
                }
                _ => Update::NONE,
            };

            if !update.rerender {
                return;
            }

            let html = portal.render(prefers_dark);
            match inspector.extract_title(&html) {
                Ok(Some(title)) => webview.window().set_title(&title),
                Ok(None) => webview.window().set_title(WINDOW_TITLE),
                Err(e) => log::debug!("No window title: {}", e),
            }

            let result = if update.scroll_to_top {
                webview.load_url(&data_url(&html));
                Ok(())
            } else {
                webview.evaluate_script(&rewrite_script(&html))
            };
            if let Err(e) = result {
                log::error!("Failed to update page: {}", e);
            }
        });

        // This line is unreachable because event_loop.run() blocks until exit
        #[allow(unreachable_code)]
        Ok(())
    }
}

fn data_url(html: &str) -> String {
    format!("data:text/html;base64,{}", base64::encode(html))
}

/// Replaces the open document in place, keeping the scroll position.
fn rewrite_script(html: &str) -> String {
    let literal = serde_json::to_string(html).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(function(){{var y=window.scrollY;document.open();document.write({literal});document.close();window.scrollTo(0,y);}})()"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_is_base64() {
        assert_eq!(data_url("<p>"), "data:text/html;base64,PHA+");
    }

    #[test]
    fn test_rewrite_script_quotes_document() {
        let script = rewrite_script(r#"<p class="x">it's</p>"#);
        assert!(script.contains(r#"document.write("<p class=\"x\">it's</p>")"#));
    }
}
