/// JS bridge to the Chrome extension APIs
///
/// `bridge.js` wraps `chrome.storage.sync`, `chrome.tabs` and
/// `chrome.windows` in promise-returning functions; the structs here adapt
/// those into the gateway traits.

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::error::{Error, Result};
use crate::model::StorageInfo;
use crate::storage::StorageBackend;
use crate::tabs::{HostTab, TabHost};

#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn storageGet(key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(key: &str, value: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageRemove(key: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageKeys() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageBytesInUse() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getCurrentWindowTabs() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getFocusedWindow() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createWindow(url: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(
        window_id: i32,
        url: &str,
        active: bool,
    ) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn closeUnpinnedTabs(window_id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn openExtensionPage(path: &str) -> std::result::Result<(), JsValue>;

    pub fn exportToFile(data: &str, filename: &str);
}

/// Open one of the extension's own pages (options, startup selector,
/// full-page popup).
pub async fn open_page(path: &str) -> Result<()> {
    openExtensionPage(path)
        .await
        .map_err(|e| Error::from_js("openExtensionPage", e))
}

/// Hand a JSON document to the host for download.
pub fn export_to_file(data: &str, filename: &str) {
    exportToFile(data, filename);
}

/// [`StorageBackend`] over `chrome.storage.sync`.
#[derive(Default, Clone, Copy)]
pub struct ChromeSyncStorage;

impl StorageBackend for ChromeSyncStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let value = storageGet(key)
            .await
            .map_err(|e| Error::from_js("storage.get", e))?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        serde_wasm_bindgen::from_value(value)
            .map(Some)
            .map_err(|e| Error::Host(format!("storage.get: {} does not parse: {}", key, e)))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let js = serde_wasm_bindgen::to_value(&value)
            .map_err(|e| Error::Host(format!("storage.set: {} does not serialize: {}", key, e)))?;
        storageSet(key, js)
            .await
            .map_err(|e| Error::from_js("storage.set", e))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        storageRemove(key)
            .await
            .map_err(|e| Error::from_js("storage.remove", e))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let value = storageKeys()
            .await
            .map_err(|e| Error::from_js("storage keys", e))?;
        let keys: Vec<String> = serde_wasm_bindgen::from_value(value)
            .map_err(|e| Error::Host(format!("storage keys do not parse: {}", e)))?;
        Ok(keys.into_iter().filter(|k| k.starts_with(prefix)).collect())
    }

    async fn bytes_in_use(&self) -> Result<StorageInfo> {
        let value = storageBytesInUse()
            .await
            .map_err(|e| Error::from_js("storage quota", e))?;
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| Error::Host(format!("storage quota does not parse: {}", e)))
    }
}

/// [`TabHost`] over `chrome.tabs` / `chrome.windows`.
#[derive(Default, Clone, Copy)]
pub struct ChromeTabs;

impl TabHost for ChromeTabs {
    async fn current_window_tabs(&self) -> Result<Vec<HostTab>> {
        let value = getCurrentWindowTabs()
            .await
            .map_err(|e| Error::from_js("tabs.query", e))?;
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| Error::Host(format!("tab list does not parse: {}", e)))
    }

    async fn focused_window(&self) -> Result<i32> {
        let value = getFocusedWindow()
            .await
            .map_err(|e| Error::from_js("windows.getLastFocused", e))?;
        value
            .as_f64()
            .map(|id| id as i32)
            .ok_or_else(|| Error::Host("focused window id is not a number".to_string()))
    }

    async fn create_window(&self, url: &str) -> Result<i32> {
        let value = createWindow(url)
            .await
            .map_err(|e| Error::from_js("windows.create", e))?;
        value
            .as_f64()
            .map(|id| id as i32)
            .ok_or_else(|| Error::Host("created window id is not a number".to_string()))
    }

    async fn create_tab(&self, window_id: i32, url: &str, active: bool) -> Result<()> {
        createTab(window_id, url, active)
            .await
            .map_err(|e| Error::from_js("tabs.create", e))
    }

    async fn close_unpinned_tabs(&self, window_id: i32) -> Result<usize> {
        let value = closeUnpinnedTabs(window_id)
            .await
            .map_err(|e| Error::from_js("tabs.remove", e))?;
        Ok(value.as_f64().unwrap_or(0.0) as usize)
    }
}

/// The production service wiring: both gateways bound to the Chrome APIs.
pub fn chrome_service()
-> crate::service::TemplateService<ChromeSyncStorage, ChromeTabs> {
    crate::service::TemplateService::new(
        crate::storage::StorageGateway::new(ChromeSyncStorage),
        crate::tabs::TabGateway::new(ChromeTabs),
    )
}
