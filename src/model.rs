/// Data structures for Tab Templates
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted URL length.
pub const MAX_URL_LEN: usize = 2048;
/// Maximum template name length.
pub const MAX_NAME_LEN: usize = 50;
/// Maximum template description length.
pub const MAX_DESCRIPTION_LEN: usize = 200;
/// Maximum number of tabs a template may hold.
pub const MAX_TABS: usize = 50;

/// Data-format version written alongside the stored records.
pub const DATA_VERSION: &str = "1.0.0";

/// Milliseconds since the Unix epoch, as the host reports it.
pub fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as f64)
            .unwrap_or(0.0)
    }
}

/// A saved tab within a template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabEntry {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl TabEntry {
    pub fn new(url: String, title: String, favicon: Option<String>) -> TabEntry {
        TabEntry { url, title, favicon }
    }

    /// Favicon URL for display, deriving `origin/favicon.ico` when none was
    /// captured with the tab.
    pub fn favicon_url(&self) -> Option<String> {
        if self.favicon.is_some() {
            return self.favicon.clone();
        }
        derive_favicon(&self.url)
    }
}

/// Derive a conventional favicon location from a page URL.
pub fn derive_favicon(page_url: &str) -> Option<String> {
    let parsed = url::Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("{}://{}/favicon.ico", parsed.scheme(), host))
}

/// A named, ordered collection of saved tabs that can be reopened together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tabs: Vec<TabEntry>,
    pub created_at: f64,
    #[serde(default)]
    pub last_used_at: Option<f64>,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_color() -> String {
    "#4A90D9".to_string()
}

fn default_icon() -> String {
    "folder".to_string()
}

impl Template {
    /// Build a fresh template with a generated id and zeroed usage.
    pub fn new(name: String, description: Option<String>, tabs: Vec<TabEntry>, now: f64) -> Template {
        Template {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            tabs,
            created_at: now,
            last_used_at: None,
            usage_count: 0,
            color: default_color(),
            icon: default_icon(),
        }
    }

    /// Clone into a new template: fresh id, "(Copy)" suffix, reset usage.
    pub fn duplicate(&self, now: f64) -> Template {
        Template {
            id: Uuid::new_v4().to_string(),
            name: format!("{} (Copy)", self.name),
            description: self.description.clone(),
            tabs: self.tabs.clone(),
            created_at: now,
            last_used_at: None,
            usage_count: 0,
            color: self.color.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Partial update applied to a template; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<TabEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl TemplatePatch {
    /// Shallow-merge this patch onto an existing record.
    pub fn apply(&self, template: &mut Template) {
        if let Some(name) = &self.name {
            template.name = name.clone();
        }
        if let Some(description) = &self.description {
            template.description = Some(description.clone());
        }
        if let Some(tabs) = &self.tabs {
            template.tabs = tabs.clone();
        }
        if let Some(color) = &self.color {
            template.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            template.icon = icon.clone();
        }
    }
}

/// Action taken automatically when the browser starts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartupBehavior {
    #[default]
    None,
    ShowSelector,
    AutoLaunch,
}

/// How launched tabs are placed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpenBehavior {
    #[default]
    NewWindow,
    CurrentWindow,
    ReplaceTabs,
}

/// Template list sort key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Name,
    Created,
    LastUsed,
    UsageCount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// Process-wide settings record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub startup_behavior: StartupBehavior,
    #[serde(default)]
    pub default_template_id: Option<String>,
    pub open_behavior: OpenBehavior,
    pub close_existing_tabs: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub theme: Theme,
    pub show_favicons: bool,
    pub confirm_delete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            startup_behavior: StartupBehavior::None,
            default_template_id: None,
            open_behavior: OpenBehavior::NewWindow,
            close_existing_tabs: false,
            sort_by: SortBy::Name,
            sort_order: SortOrder::Asc,
            theme: Theme::System,
            show_favicons: true,
            confirm_delete: true,
        }
    }
}

/// Partial update applied to the settings record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_behavior: Option<StartupBehavior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_template_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_behavior: Option<OpenBehavior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_existing_tabs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_favicons: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_delete: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.startup_behavior {
            settings.startup_behavior = v;
        }
        if let Some(v) = &self.default_template_id {
            settings.default_template_id = v.clone();
        }
        if let Some(v) = self.open_behavior {
            settings.open_behavior = v;
        }
        if let Some(v) = self.close_existing_tabs {
            settings.close_existing_tabs = v;
        }
        if let Some(v) = self.sort_by {
            settings.sort_by = v;
        }
        if let Some(v) = self.sort_order {
            settings.sort_order = v;
        }
        if let Some(v) = self.theme {
            settings.theme = v;
        }
        if let Some(v) = self.show_favicons {
            settings.show_favicons = v;
        }
        if let Some(v) = self.confirm_delete {
            settings.confirm_delete = v;
        }
    }
}

/// Export document: `{version, exportedAt, templates}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub version: String,
    pub exported_at: f64,
    pub templates: Vec<Template>,
}

/// Bytes-in-use vs quota, reported for operator visibility
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub bytes_in_use: u64,
    pub quota_bytes: u64,
}

impl StorageInfo {
    pub fn percent_used(&self) -> u64 {
        if self.quota_bytes == 0 {
            return 0;
        }
        self.bytes_in_use * 100 / self.quota_bytes
    }
}
