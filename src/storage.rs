/// Storage gateway over the synced key-value store
///
/// Templates are stored one record per key (`template:{id}`) so that two
/// surfaces mutating different templates never overwrite each other's write.
/// The settings record and a data-format version marker each get their own
/// key. The gateway keeps an in-memory mirror of the template list and
/// invalidates it wholesale on every mutation; reads hand out clones, never
/// the cached vector itself.

use std::cell::RefCell;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{
    now_ms, ExportFile, Settings, SettingsPatch, StorageInfo, Template, TemplatePatch,
    DATA_VERSION,
};
use crate::validate::{validate_settings, validate_template};

pub const TEMPLATE_KEY_PREFIX: &str = "template:";
pub const SETTINGS_KEY: &str = "settings";
pub const VERSION_KEY: &str = "version";

fn template_key(id: &str) -> String {
    format!("{}{}", TEMPLATE_KEY_PREFIX, id)
}

/// Async access to a string-keyed JSON store. The production implementation
/// binds `chrome.storage.sync`; tests substitute an in-memory map.
#[allow(async_fn_in_trait)]
pub trait StorageBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
    async fn bytes_in_use(&self) -> Result<StorageInfo>;
}

pub struct StorageGateway<B: StorageBackend> {
    backend: B,
    cache: RefCell<Option<Vec<Template>>>,
}

impl<B: StorageBackend> StorageGateway<B> {
    pub fn new(backend: B) -> Self {
        StorageGateway {
            backend,
            cache: RefCell::new(None),
        }
    }

    /// Ensure the settings record and version marker exist. Idempotent,
    /// called on every process start.
    pub async fn initialize(&self) -> Result<()> {
        if self.backend.get(SETTINGS_KEY).await?.is_none() {
            let defaults = serde_json::to_value(Settings::default())
                .map_err(|e| Error::Host(format!("settings do not serialize: {}", e)))?;
            self.backend.set(SETTINGS_KEY, defaults).await?;
        }
        if self.backend.get(VERSION_KEY).await?.is_none() {
            self.backend
                .set(VERSION_KEY, Value::String(DATA_VERSION.to_string()))
                .await?;
        }
        Ok(())
    }

    fn invalidate(&self) {
        *self.cache.borrow_mut() = None;
    }

    /// Fetch every stored template, ordered by creation time (id as
    /// tiebreak). This ordering is the "storage order" the service's stable
    /// sorts and statistics rely on.
    async fn fetch_templates(&self) -> Result<Vec<Template>> {
        let keys = self.backend.keys_with_prefix(TEMPLATE_KEY_PREFIX).await?;
        let mut templates = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.backend.get(&key).await? {
                let template: Template = serde_json::from_value(value).map_err(|e| {
                    Error::Host(format!("stored record {} does not parse: {}", key, e))
                })?;
                templates.push(template);
            }
        }
        templates.sort_by(|a, b| {
            a.created_at
                .total_cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(templates)
    }

    /// Cached-or-fetched template list, cloned so callers cannot corrupt
    /// the mirror.
    pub async fn get_templates(&self) -> Result<Vec<Template>> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let templates = self.fetch_templates().await?;
        *self.cache.borrow_mut() = Some(templates.clone());
        Ok(templates)
    }

    /// Single-record lookup; `None` is the not-found sentinel.
    pub async fn get_template(&self, id: &str) -> Result<Option<Template>> {
        match self.backend.get(&template_key(id)).await? {
            Some(value) => {
                let template: Template = serde_json::from_value(value).map_err(|e| {
                    Error::Host(format!("stored record for {} does not parse: {}", id, e))
                })?;
                Ok(Some(template))
            }
            None => Ok(None),
        }
    }

    async fn persist(&self, template: &Template) -> Result<()> {
        let value = serde_json::to_value(template)
            .map_err(|e| Error::Host(format!("template does not serialize: {}", e)))?;
        self.backend.set(&template_key(&template.id), value).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn save_template(&self, template: &Template) -> Result<()> {
        validate_template(template)?;
        if self.get_template(&template.id).await?.is_some() {
            return Err(Error::Validation(format!(
                "a template with id {} already exists",
                template.id
            )));
        }
        self.persist(template).await
    }

    /// Shallow-merge a patch onto the stored record, re-validate, persist.
    pub async fn update_template(&self, id: &str, patch: &TemplatePatch) -> Result<Template> {
        let mut template = self
            .get_template(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        patch.apply(&mut template);
        validate_template(&template)?;
        self.persist(&template).await?;
        Ok(template)
    }

    /// Removing an absent id is a no-op, not an error.
    pub async fn delete_template(&self, id: &str) -> Result<()> {
        self.backend.remove(&template_key(id)).await?;
        self.invalidate();
        Ok(())
    }

    /// Record a successful launch: bump the counter and move the last-used
    /// timestamp forward (never backward).
    pub async fn update_template_usage(&self, id: &str) -> Result<Template> {
        let mut template = self
            .get_template(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let now = now_ms();
        template.last_used_at = Some(match template.last_used_at {
            Some(prev) if prev > now => prev,
            _ => now,
        });
        template.usage_count = template.usage_count.saturating_add(1);
        self.persist(&template).await?;
        Ok(template)
    }

    pub async fn clear_templates(&self) -> Result<()> {
        let keys = self.backend.keys_with_prefix(TEMPLATE_KEY_PREFIX).await?;
        for key in keys {
            self.backend.remove(&key).await?;
        }
        self.invalidate();
        Ok(())
    }

    pub async fn get_settings(&self) -> Result<Settings> {
        match self.backend.get(SETTINGS_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| Error::Host(format!("stored settings do not parse: {}", e))),
            None => Ok(Settings::default()),
        }
    }

    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings> {
        let mut settings = self.get_settings().await?;
        patch.apply(&mut settings);
        validate_settings(&settings)?;
        let value = serde_json::to_value(&settings)
            .map_err(|e| Error::Host(format!("settings do not serialize: {}", e)))?;
        self.backend.set(SETTINGS_KEY, value).await?;
        Ok(settings)
    }

    pub async fn reset_settings(&self) -> Result<Settings> {
        let defaults = Settings::default();
        let value = serde_json::to_value(&defaults)
            .map_err(|e| Error::Host(format!("settings do not serialize: {}", e)))?;
        self.backend.set(SETTINGS_KEY, value).await?;
        Ok(defaults)
    }

    /// Wrap the current template list with a version stamp and timestamp.
    pub async fn export_data(&self) -> Result<ExportFile> {
        Ok(ExportFile {
            version: DATA_VERSION.to_string(),
            exported_at: now_ms(),
            templates: self.get_templates().await?,
        })
    }

    /// Import an export document. With `merge`, an imported template whose
    /// id collides with an existing record is skipped and the existing
    /// record wins. Without `merge`, the stored collection is replaced.
    pub async fn import_data(&self, data: Value, merge: bool) -> Result<usize> {
        if data.get("templates").map(Value::is_array) != Some(true) {
            return Err(Error::Validation(
                "import document has no templates array".to_string(),
            ));
        }
        let file: ExportFile = serde_json::from_value(data)
            .map_err(|e| Error::Validation(format!("import document does not parse: {}", e)))?;
        for template in &file.templates {
            validate_template(template)?;
        }

        if !merge {
            self.clear_templates().await?;
        }

        let mut imported = 0;
        for template in &file.templates {
            if merge && self.get_template(&template.id).await?.is_some() {
                log::info!("import: skipping existing template {}", template.id);
                continue;
            }
            self.persist(template).await?;
            imported += 1;
        }
        Ok(imported)
    }

    /// Bytes-in-use vs quota. Telemetry only: a backend failure degrades to
    /// `None` instead of propagating.
    pub async fn get_storage_info(&self) -> Option<StorageInfo> {
        match self.backend.bytes_in_use().await {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!("storage info unavailable: {}", e);
                None
            }
        }
    }
}
