/// Template service: orchestrates creation, mutation, search, launch and
/// import/export of templates over the storage and tab gateways.

use crate::error::{Error, Result};
use crate::model::{now_ms, OpenBehavior, TabEntry, Template, TemplatePatch, MAX_TABS};
use crate::query::{self, Statistics, TemplateQuery};
use crate::storage::{StorageBackend, StorageGateway};
use crate::tabs::{filter_openable_tabs, OpenOutcome, TabGateway, TabHost};
use crate::validate::{sanitize_name, validate_description, validate_name, validate_tab};

/// Per-launch overrides; when absent, the persisted settings decide.
#[derive(Debug, Clone, Copy)]
pub struct LaunchOptions {
    pub open_behavior: OpenBehavior,
    pub close_existing: bool,
}

pub struct TemplateService<B: StorageBackend, H: TabHost> {
    pub storage: StorageGateway<B>,
    pub tabs: TabGateway<H>,
}

impl<B: StorageBackend, H: TabHost> TemplateService<B, H> {
    pub fn new(storage: StorageGateway<B>, tabs: TabGateway<H>) -> Self {
        TemplateService { storage, tabs }
    }

    fn prepare_name(raw: &str) -> Result<String> {
        let name = sanitize_name(raw);
        validate_name(&name)?;
        Ok(name)
    }

    /// Snapshot the current window into a new template. Tabs the extension
    /// cannot reopen are dropped; an all-dropped window is an error.
    pub async fn create_from_current_tabs(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Template> {
        let name = Self::prepare_name(name)?;
        validate_description(description.as_deref())?;

        let current = self.tabs.get_current_window_tabs().await?;
        let tabs = filter_openable_tabs(current);
        if tabs.is_empty() {
            return Err(Error::Validation(
                "the current window has no savable tabs".to_string(),
            ));
        }
        if tabs.len() > MAX_TABS {
            return Err(Error::Capacity(format!(
                "the current window has more than {} savable tabs",
                MAX_TABS
            )));
        }

        let template = Template::new(name, description, tabs, now_ms());
        self.storage.save_template(&template).await?;
        Ok(template)
    }

    pub async fn create_empty(&self, name: &str, description: Option<String>) -> Result<Template> {
        let name = Self::prepare_name(name)?;
        validate_description(description.as_deref())?;

        let template = Template::new(name, description, Vec::new(), now_ms());
        self.storage.save_template(&template).await?;
        Ok(template)
    }

    pub async fn get_templates(&self, query: &TemplateQuery) -> Result<Vec<Template>> {
        let templates = self.storage.get_templates().await?;
        Ok(query::filter_and_sort(templates, query))
    }

    pub async fn get_template(&self, id: &str) -> Result<Option<Template>> {
        self.storage.get_template(id).await
    }

    pub async fn update_template(&self, id: &str, patch: &TemplatePatch) -> Result<Template> {
        let patch = match &patch.name {
            Some(raw) => TemplatePatch {
                name: Some(Self::prepare_name(raw)?),
                ..patch.clone()
            },
            None => patch.clone(),
        };
        self.storage.update_template(id, &patch).await
    }

    pub async fn delete_template(&self, id: &str) -> Result<()> {
        self.storage.delete_template(id).await
    }

    /// Append a tab, enforcing the per-template cap.
    pub async fn add_tab(&self, id: &str, tab: TabEntry) -> Result<Template> {
        validate_tab(&tab)?;
        let template = self
            .storage
            .get_template(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if template.tabs.len() >= MAX_TABS {
            return Err(Error::Capacity(format!(
                "template already holds {} tabs",
                MAX_TABS
            )));
        }
        let mut tabs = template.tabs;
        tabs.push(tab);
        let patch = TemplatePatch {
            tabs: Some(tabs),
            ..TemplatePatch::default()
        };
        self.storage.update_template(id, &patch).await
    }

    pub async fn remove_tab(&self, id: &str, index: usize) -> Result<Template> {
        let template = self
            .storage
            .get_template(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if index >= template.tabs.len() {
            return Err(Error::Validation(format!(
                "tab index {} out of range (template has {} tabs)",
                index,
                template.tabs.len()
            )));
        }
        let mut tabs = template.tabs;
        tabs.remove(index);
        let patch = TemplatePatch {
            tabs: Some(tabs),
            ..TemplatePatch::default()
        };
        self.storage.update_template(id, &patch).await
    }

    /// Open all of a template's tabs. Options fall back to the persisted
    /// settings; usage is recorded only after the open succeeded, so a
    /// failed launch never touches the counters.
    pub async fn launch_template(
        &self,
        id: &str,
        options: Option<LaunchOptions>,
    ) -> Result<OpenOutcome> {
        let template = self
            .storage
            .get_template(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if template.tabs.is_empty() {
            return Err(Error::Validation(format!(
                "template \"{}\" has no tabs to open",
                template.name
            )));
        }

        let options = match options {
            Some(options) => options,
            None => {
                let settings = self.storage.get_settings().await?;
                LaunchOptions {
                    open_behavior: settings.open_behavior,
                    close_existing: settings.close_existing_tabs,
                }
            }
        };

        let outcome = self
            .tabs
            .open_tabs(&template.tabs, options.open_behavior, options.close_existing)
            .await?;
        self.storage.update_template_usage(id).await?;
        log::info!(
            "launched template {} ({} tabs into window {})",
            id,
            outcome.opened,
            outcome.window_id
        );
        Ok(outcome)
    }

    pub async fn duplicate_template(&self, id: &str) -> Result<Template> {
        let template = self
            .storage
            .get_template(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let copy = template.duplicate(now_ms());
        self.storage.save_template(&copy).await?;
        Ok(copy)
    }

    pub async fn export_templates(&self) -> Result<crate::model::ExportFile> {
        self.storage.export_data().await
    }

    pub async fn import_templates(&self, data: serde_json::Value, merge: bool) -> Result<usize> {
        self.storage.import_data(data, merge).await
    }

    pub async fn get_statistics(&self) -> Result<Statistics> {
        let templates = self.storage.get_templates().await?;
        Ok(query::statistics(&templates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::MemoryBackend;
    use crate::tabs::testing::{FakeTabHost, HostCall};
    use crate::tabs::HostTab;
    use futures::executor::block_on;

    fn service_with(host: FakeTabHost) -> TemplateService<MemoryBackend, FakeTabHost> {
        TemplateService::new(
            StorageGateway::new(MemoryBackend::new()),
            TabGateway::new(host),
        )
    }

    fn service() -> TemplateService<MemoryBackend, FakeTabHost> {
        service_with(FakeTabHost::new())
    }

    fn host_tab(url: &str, title: &str) -> HostTab {
        HostTab {
            url: url.to_string(),
            title: title.to_string(),
            favicon: None,
            pinned: false,
            incognito: false,
        }
    }

    fn tab(url: &str) -> TabEntry {
        TabEntry::new(url.to_string(), "Tab".to_string(), None)
    }

    #[test]
    fn test_create_from_current_tabs_filters_internal_urls() {
        block_on(async {
            let svc = service_with(FakeTabHost::with_tabs(vec![
                host_tab("https://mail.example.com", "Mail"),
                host_tab("chrome://settings", "Settings"),
            ]));

            let template = svc
                .create_from_current_tabs("Work", Some("daily".to_string()))
                .await
                .unwrap();

            assert_eq!(template.tabs.len(), 1);
            assert_eq!(template.tabs[0].url, "https://mail.example.com");
            assert_eq!(template.usage_count, 0);
            assert_eq!(template.last_used_at, None);
        });
    }

    #[test]
    fn test_create_keeps_valid_tabs_alongside_odd_schemes() {
        block_on(async {
            let svc = service_with(FakeTabHost::with_tabs(vec![
                host_tab("https://mail.example.com", "Mail"),
                host_tab("data:text/html,hello", "Data"),
                host_tab("javascript:void(0)", "Bookmarklet"),
            ]));

            // The save must go through with the one reopenable tab, not
            // fail the whole window on the unstorable ones.
            let template = svc.create_from_current_tabs("Work", None).await.unwrap();

            assert_eq!(template.tabs.len(), 1);
            assert_eq!(template.tabs[0].url, "https://mail.example.com");
            assert_eq!(svc.storage.get_templates().await.unwrap().len(), 1);
        });
    }

    #[test]
    fn test_create_fails_when_nothing_savable() {
        block_on(async {
            let svc = service_with(FakeTabHost::with_tabs(vec![host_tab(
                "chrome://extensions",
                "Extensions",
            )]));

            let err = svc.create_from_current_tabs("Work", None).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
            assert!(svc.storage.get_templates().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_create_sanitizes_name() {
        block_on(async {
            let svc = service();
            let template = svc.create_empty("<b>Work</b>", None).await.unwrap();
            assert_eq!(template.name, "bWork/b");

            assert!(svc.create_empty("<>", None).await.is_err());
        });
    }

    #[test]
    fn test_add_tab_beyond_cap_fails_and_leaves_store_unchanged() {
        block_on(async {
            let svc = service();
            let template = svc.create_empty("Full", None).await.unwrap();

            for i in 0..MAX_TABS {
                svc.add_tab(&template.id, tab(&format!("https://example.com/{}", i)))
                    .await
                    .unwrap();
            }

            let err = svc
                .add_tab(&template.id, tab("https://example.com/extra"))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Capacity(_)));

            let stored = svc.get_template(&template.id).await.unwrap().unwrap();
            assert_eq!(stored.tabs.len(), MAX_TABS);
        });
    }

    #[test]
    fn test_remove_tab_range_checked() {
        block_on(async {
            let svc = service();
            let template = svc.create_empty("Work", None).await.unwrap();
            svc.add_tab(&template.id, tab("https://example.com"))
                .await
                .unwrap();

            assert!(svc.remove_tab(&template.id, 5).await.is_err());

            let updated = svc.remove_tab(&template.id, 0).await.unwrap();
            assert!(updated.tabs.is_empty());
        });
    }

    #[test]
    fn test_launch_scenario_work_template() {
        block_on(async {
            // create empty "Work" -> add a mail tab -> launch into a new
            // window -> exactly one window with that tab, usageCount = 1.
            let svc = service();
            let template = svc.create_empty("Work", None).await.unwrap();
            svc.add_tab(
                &template.id,
                TabEntry::new(
                    "https://mail.example.com".to_string(),
                    "Mail".to_string(),
                    None,
                ),
            )
            .await
            .unwrap();

            let outcome = svc
                .launch_template(
                    &template.id,
                    Some(LaunchOptions {
                        open_behavior: OpenBehavior::NewWindow,
                        close_existing: false,
                    }),
                )
                .await
                .unwrap();

            assert_eq!(outcome.opened, 1);
            let calls = svc.tabs.host().calls.borrow().clone();
            assert_eq!(
                calls,
                vec![HostCall::CreateWindow(
                    "https://mail.example.com".to_string()
                )]
            );

            let stored = svc.get_template(&template.id).await.unwrap().unwrap();
            assert_eq!(stored.usage_count, 1);
            assert!(stored.last_used_at.is_some());
        });
    }

    #[test]
    fn test_launch_empty_template_fails_without_usage_update() {
        block_on(async {
            let svc = service();
            let template = svc.create_empty("Empty", None).await.unwrap();

            let err = svc.launch_template(&template.id, None).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));

            let stored = svc.get_template(&template.id).await.unwrap().unwrap();
            assert_eq!(stored.usage_count, 0);
            assert_eq!(stored.last_used_at, None);
        });
    }

    #[test]
    fn test_launch_missing_template_is_not_found() {
        block_on(async {
            let svc = service();
            assert!(matches!(
                svc.launch_template("missing", None).await,
                Err(Error::NotFound(_))
            ));
        });
    }

    #[test]
    fn test_failed_open_records_no_usage() {
        block_on(async {
            let host = FakeTabHost {
                fail_create_at: Some(0),
                ..FakeTabHost::default()
            };
            let svc = service_with(host);
            let template = svc.create_empty("Work", None).await.unwrap();
            svc.add_tab(&template.id, tab("https://example.com"))
                .await
                .unwrap();

            let err = svc
                .launch_template(
                    &template.id,
                    Some(LaunchOptions {
                        open_behavior: OpenBehavior::CurrentWindow,
                        close_existing: false,
                    }),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Host(_)));

            let stored = svc.get_template(&template.id).await.unwrap().unwrap();
            assert_eq!(stored.usage_count, 0);
        });
    }

    #[test]
    fn test_launch_resolves_options_from_settings() {
        block_on(async {
            let svc = service();
            let patch = crate::model::SettingsPatch {
                open_behavior: Some(OpenBehavior::ReplaceTabs),
                close_existing_tabs: Some(true),
                ..crate::model::SettingsPatch::default()
            };
            svc.storage.update_settings(&patch).await.unwrap();

            let template = svc.create_empty("Work", None).await.unwrap();
            svc.add_tab(&template.id, tab("https://example.com"))
                .await
                .unwrap();

            svc.launch_template(&template.id, None).await.unwrap();

            let calls = svc.tabs.host().calls.borrow().clone();
            assert_eq!(calls[0], HostCall::CloseUnpinned(1));
        });
    }

    #[test]
    fn test_duplicate_template() {
        block_on(async {
            let svc = service();
            let template = svc.create_empty("Work", None).await.unwrap();
            svc.storage.update_template_usage(&template.id).await.unwrap();

            let copy = svc.duplicate_template(&template.id).await.unwrap();

            assert_eq!(copy.name, "Work (Copy)");
            assert_eq!(copy.usage_count, 0);
            assert_ne!(copy.id, template.id);
            assert_eq!(svc.storage.get_templates().await.unwrap().len(), 2);
        });
    }

    #[test]
    fn test_statistics_pass_through() {
        block_on(async {
            let svc = service();
            let a = svc.create_empty("A", None).await.unwrap();
            svc.add_tab(&a.id, tab("https://example.com")).await.unwrap();
            svc.create_empty("B", None).await.unwrap();

            let stats = svc.get_statistics().await.unwrap();
            assert_eq!(stats.template_count, 2);
            assert_eq!(stats.total_tabs, 1);
        });
    }

    #[test]
    fn test_get_templates_applies_query() {
        block_on(async {
            let svc = service();
            svc.create_empty("Zeta", None).await.unwrap();
            svc.create_empty("alpha", None).await.unwrap();
            svc.create_empty("Beta", None).await.unwrap();

            let listed = svc
                .get_templates(&TemplateQuery::default())
                .await
                .unwrap();
            let names: Vec<&str> = listed.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["alpha", "Beta", "Zeta"]);
        });
    }
}
