/// Tab Templates - Chrome Extension for saving and reopening tab sets
/// Built with Rust + WASM + Yew

pub mod background;
pub mod bridge;
pub mod error;
pub mod messages;
pub mod model;
pub mod query;
pub mod service;
pub mod storage;
pub mod tabs;
pub mod validate;
pub mod ui;

use wasm_bindgen::prelude::*;

use crate::background::{CommandOutcome, StartupAction};
use crate::bridge::chrome_service;
use crate::messages::{Request, Response};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the options page
#[wasm_bindgen]
pub fn start_options() {
    yew::Renderer::<ui::options::OptionsPage>::new().render();
}

// Start the Yew app for the startup template selector
#[wasm_bindgen]
pub fn start_startup_selector() {
    yew::Renderer::<ui::startup::StartupSelector>::new().render();
}

/// Entry for `chrome.runtime.onMessage`: route a cross-surface request and
/// hand back a `{success, ...}` object.
#[wasm_bindgen]
pub async fn handle_runtime_message(message: JsValue) -> JsValue {
    let request: Request = match serde_wasm_bindgen::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            let response = Response {
                success: false,
                error: Some(format!("unrecognized message: {}", e)),
                data: None,
            };
            return serde_wasm_bindgen::to_value(&response).unwrap_or(JsValue::NULL);
        }
    };

    let service = chrome_service();
    let response = background::dispatch_message(&service, request).await;
    serde_wasm_bindgen::to_value(&response).unwrap_or(JsValue::NULL)
}

/// Entry for `chrome.runtime.onStartup`.
#[wasm_bindgen]
pub async fn handle_browser_startup() {
    let service = chrome_service();
    match background::handle_startup(&service).await {
        StartupAction::Nothing => {}
        StartupAction::ShowSelector => {
            if let Err(e) = bridge::open_page("startup.html").await {
                log::error!("startup selector did not open: {}", e);
            }
        }
        StartupAction::Launched { template_id, opened } => {
            log::info!("auto-launched {} ({} tabs)", template_id, opened);
        }
    }
}

/// Entry for `chrome.runtime.onInstalled`.
#[wasm_bindgen]
pub async fn handle_installed() {
    let service = chrome_service();
    if let Err(e) = background::handle_install(&service).await {
        log::error!("install initialization failed: {}", e);
    }
}

/// Entry for `chrome.commands.onCommand`.
#[wasm_bindgen]
pub async fn handle_keyboard_command(command: String) {
    let service = chrome_service();
    match background::handle_command(&service, &command).await {
        CommandOutcome::Saved { template_id, name } => {
            log::info!("saved current tabs as {} ({})", name, template_id);
        }
        CommandOutcome::OpenFullView => {
            if let Err(e) = bridge::open_page("popup.html").await {
                log::error!("full view did not open: {}", e);
            }
        }
        CommandOutcome::Ignored => {}
    }
}
