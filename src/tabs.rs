/// Tab gateway: host tab/window access and the three opening strategies

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{OpenBehavior, TabEntry};
use crate::validate::validate_url;

/// A tab as the host browser reports it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HostTab {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub incognito: bool,
}

/// Result of opening a template's tabs
#[derive(Debug, Clone, PartialEq)]
pub struct OpenOutcome {
    pub opened: usize,
    pub window_id: i32,
}

/// Async access to the host tab/window API. The production implementation
/// binds `chrome.tabs` / `chrome.windows`; tests substitute a fake that
/// records calls.
#[allow(async_fn_in_trait)]
pub trait TabHost {
    async fn current_window_tabs(&self) -> Result<Vec<HostTab>>;
    async fn focused_window(&self) -> Result<i32>;
    /// Create a window seeded with one tab; returns the new window's id.
    async fn create_window(&self, url: &str) -> Result<i32>;
    async fn create_tab(&self, window_id: i32, url: &str, active: bool) -> Result<()>;
    /// Close every non-pinned tab in the window; returns how many closed.
    async fn close_unpinned_tabs(&self, window_id: i32) -> Result<usize>;
}

/// True when a URL can be both stored and reopened. This is the same
/// http/https rule [`validate_url`] enforces, so a tab that survives the
/// filter never fails template validation later.
pub fn is_openable_url(url: &str) -> bool {
    validate_url(url).is_ok()
}

/// Drop entries that cannot be reopened (browser-internal pages, extension
/// pages, file/data/javascript URLs). These must never be persisted into a
/// template.
pub fn filter_openable_tabs(tabs: Vec<TabEntry>) -> Vec<TabEntry> {
    tabs.into_iter().filter(|t| is_openable_url(&t.url)).collect()
}

pub struct TabGateway<H: TabHost> {
    host: H,
}

#[cfg(test)]
impl<H: TabHost> TabGateway<H> {
    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: TabHost> TabGateway<H> {
    pub fn new(host: H) -> Self {
        TabGateway { host }
    }

    /// Tabs of the active window mapped to the template shape, with
    /// incognito tabs excluded.
    pub async fn get_current_window_tabs(&self) -> Result<Vec<TabEntry>> {
        let tabs = self.host.current_window_tabs().await?;
        Ok(tabs
            .into_iter()
            .filter(|t| !t.incognito)
            .map(|t| TabEntry::new(t.url, t.title, t.favicon))
            .collect())
    }

    /// Open a set of tabs with the given strategy. Every URL is validated
    /// up front, so an invalid entry fails the whole call before any host
    /// API is touched. A host failure partway through aborts the remaining
    /// creations; tabs already opened stay open.
    pub async fn open_tabs(
        &self,
        tabs: &[TabEntry],
        strategy: OpenBehavior,
        close_existing: bool,
    ) -> Result<OpenOutcome> {
        if tabs.is_empty() {
            return Err(Error::Validation("no tabs to open".to_string()));
        }
        for tab in tabs {
            validate_url(&tab.url)?;
        }

        match strategy {
            OpenBehavior::NewWindow => self.open_in_new_window(tabs).await,
            OpenBehavior::CurrentWindow => self.open_in_current_window(tabs).await,
            OpenBehavior::ReplaceTabs => self.replace_current_tabs(tabs, close_existing).await,
        }
    }

    async fn open_in_new_window(&self, tabs: &[TabEntry]) -> Result<OpenOutcome> {
        let window_id = self.host.create_window(&tabs[0].url).await?;
        for tab in &tabs[1..] {
            self.host.create_tab(window_id, &tab.url, false).await?;
        }
        Ok(OpenOutcome {
            opened: tabs.len(),
            window_id,
        })
    }

    async fn open_in_current_window(&self, tabs: &[TabEntry]) -> Result<OpenOutcome> {
        let window_id = self.host.focused_window().await?;
        for tab in tabs {
            self.host.create_tab(window_id, &tab.url, false).await?;
        }
        Ok(OpenOutcome {
            opened: tabs.len(),
            window_id,
        })
    }

    async fn replace_current_tabs(
        &self,
        tabs: &[TabEntry],
        close_existing: bool,
    ) -> Result<OpenOutcome> {
        let window_id = self.host.focused_window().await?;
        if close_existing {
            let closed = self.host.close_unpinned_tabs(window_id).await?;
            log::info!("replace_tabs: closed {} existing tabs", closed);
        }
        for tab in tabs {
            self.host.create_tab(window_id, &tab.url, false).await?;
        }
        Ok(OpenOutcome {
            opened: tabs.len(),
            window_id,
        })
    }
}
