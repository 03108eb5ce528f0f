/// Background dispatcher: routes browser lifecycle events and cross-surface
/// messages into the template service.

use serde_json::json;

use crate::messages::{Request, Response};
use crate::model::{now_ms, StartupBehavior};
use crate::service::TemplateService;
use crate::storage::StorageBackend;
use crate::tabs::TabHost;

/// Keyboard command: snapshot the current window without opening the popup.
pub const COMMAND_SAVE_CURRENT: &str = "save-current-tabs";
/// Keyboard command: open the main UI as a full page.
pub const COMMAND_OPEN_POPUP: &str = "open-popup";

/// What the startup hook decided to do.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupAction {
    Nothing,
    ShowSelector,
    Launched { template_id: String, opened: usize },
}

/// What a keyboard command resolved to. Page opening itself is host-side;
/// the wasm entry maps `OpenFullView` onto the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Saved { template_id: String, name: String },
    OpenFullView,
    Ignored,
}

/// Route one cross-surface request. Every arm resolves to a response;
/// failures become `{success: false, error}` rather than propagating.
pub async fn dispatch_message<B: StorageBackend, H: TabHost>(
    service: &TemplateService<B, H>,
    request: Request,
) -> Response {
    match request {
        Request::LaunchTemplate { template_id } => {
            match service.launch_template(&template_id, None).await {
                Ok(outcome) => Response::ok_with(json!({
                    "opened": outcome.opened,
                    "windowId": outcome.window_id,
                })),
                Err(e) => Response::err(&e),
            }
        }
        Request::SaveCurrentTabs { name } => {
            match service.create_from_current_tabs(&name, None).await {
                Ok(template) => Response::ok_with(json!({"templateId": template.id})),
                Err(e) => Response::err(&e),
            }
        }
        Request::GetStartupBehavior => match service.storage.get_settings().await {
            Ok(settings) => Response::ok_with(json!({
                "startupBehavior": settings.startup_behavior,
                "defaultTemplateId": settings.default_template_id,
            })),
            Err(e) => Response::err(&e),
        },
        Request::TriggerSaveCurrent => match quick_save(service).await {
            Ok((template_id, name)) => {
                Response::ok_with(json!({"templateId": template_id, "name": name}))
            }
            Err(e) => Response::err(&e),
        },
    }
}

/// On browser start: read settings and either show the selector page,
/// silently launch the configured default template, or do nothing. A
/// missing or deleted default template is logged and ignored.
pub async fn handle_startup<B: StorageBackend, H: TabHost>(
    service: &TemplateService<B, H>,
) -> StartupAction {
    let settings = match service.storage.get_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("startup: settings unavailable: {}", e);
            return StartupAction::Nothing;
        }
    };

    match settings.startup_behavior {
        StartupBehavior::None => StartupAction::Nothing,
        StartupBehavior::ShowSelector => StartupAction::ShowSelector,
        StartupBehavior::AutoLaunch => {
            let Some(template_id) = settings.default_template_id else {
                log::warn!("startup: auto_launch configured without a default template");
                return StartupAction::Nothing;
            };
            match service.launch_template(&template_id, None).await {
                Ok(outcome) => StartupAction::Launched {
                    template_id,
                    opened: outcome.opened,
                },
                Err(e) => {
                    log::warn!("startup: auto-launch of {} skipped: {}", template_id, e);
                    StartupAction::Nothing
                }
            }
        }
    }
}

/// Route a named keyboard command. Unknown names are logged and ignored.
pub async fn handle_command<B: StorageBackend, H: TabHost>(
    service: &TemplateService<B, H>,
    command: &str,
) -> CommandOutcome {
    match command {
        COMMAND_SAVE_CURRENT => match quick_save(service).await {
            Ok((template_id, name)) => CommandOutcome::Saved { template_id, name },
            Err(e) => {
                log::error!("command {}: {}", command, e);
                CommandOutcome::Ignored
            }
        },
        COMMAND_OPEN_POPUP => CommandOutcome::OpenFullView,
        other => {
            log::warn!("unknown command: {}", other);
            CommandOutcome::Ignored
        }
    }
}

/// Run storage initialization on install/update.
pub async fn handle_install<B: StorageBackend, H: TabHost>(
    service: &TemplateService<B, H>,
) -> crate::error::Result<()> {
    service.storage.initialize().await?;
    log::info!("storage initialized");
    Ok(())
}

async fn quick_save<B: StorageBackend, H: TabHost>(
    service: &TemplateService<B, H>,
) -> crate::error::Result<(String, String)> {
    let name = quick_save_name();
    let template = service.create_from_current_tabs(&name, None).await?;
    Ok((template.id, template.name))
}

#[cfg(target_arch = "wasm32")]
fn quick_save_name() -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(now_ms()));
    format!(
        "Saved {:04}-{:02}-{:02} {:02}:{:02}",
        date.get_full_year(),
        date.get_month() + 1,
        date.get_date(),
        date.get_hours(),
        date.get_minutes()
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn quick_save_name() -> String {
    format!("Saved {}", now_ms() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OpenBehavior, SettingsPatch, TabEntry};
    use crate::storage::testing::MemoryBackend;
    use crate::storage::StorageGateway;
    use crate::tabs::testing::FakeTabHost;
    use crate::tabs::{HostTab, TabGateway};
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

    fn host_tab(url: &str) -> HostTab {
        HostTab {
            url: url.to_string(),
            title: "Tab".to_string(),
            favicon: None,
            pinned: false,
            incognito: false,
        }
    }

    async fn saved_template(svc: &TemplateService<MemoryBackend, FakeTabHost>) -> String {
        let template = svc.create_empty("Work", None).await.unwrap();
        svc.add_tab(
            &template.id,
            TabEntry::new("https://example.com".to_string(), "Tab".to_string(), None),
        )
        .await
        .unwrap();
        template.id
    }

    #[test]
    fn test_dispatch_launch() {
        block_on(async {
            let svc = service();
            let id = saved_template(&svc).await;

            let response = dispatch_message(
                &svc,
                Request::LaunchTemplate {
                    template_id: id.clone(),
                },
            )
            .await;

            assert!(response.success);
            assert_eq!(response.data.unwrap()["opened"], 1);
            let stored = svc.get_template(&id).await.unwrap().unwrap();
            assert_eq!(stored.usage_count, 1);
        });
    }

    #[test]
    fn test_dispatch_launch_missing_reports_error() {
        block_on(async {
            let svc = service();

            let response = dispatch_message(
                &svc,
                Request::LaunchTemplate {
                    template_id: "missing".to_string(),
                },
            )
            .await;

            assert!(!response.success);
            assert!(response.error.unwrap().contains("not found"));
        });
    }

    #[test]
    fn test_dispatch_save_current_tabs() {
        block_on(async {
            let svc = service_with(FakeTabHost::with_tabs(vec![host_tab(
                "https://example.com",
            )]));

            let response = dispatch_message(
                &svc,
                Request::SaveCurrentTabs {
                    name: "Snapshot".to_string(),
                },
            )
            .await;

            assert!(response.success);
            let templates = svc.storage.get_templates().await.unwrap();
            assert_eq!(templates.len(), 1);
            assert_eq!(templates[0].name, "Snapshot");
        });
    }

    #[test]
    fn test_dispatch_get_startup_behavior() {
        block_on(async {
            let svc = service();
            let patch = SettingsPatch {
                startup_behavior: Some(StartupBehavior::ShowSelector),
                ..SettingsPatch::default()
            };
            svc.storage.update_settings(&patch).await.unwrap();

            let response = dispatch_message(&svc, Request::GetStartupBehavior).await;

            assert!(response.success);
            assert_eq!(response.data.unwrap()["startupBehavior"], "show_selector");
        });
    }

    #[test]
    fn test_startup_none_and_selector() {
        block_on(async {
            let svc = service();
            assert_eq!(handle_startup(&svc).await, StartupAction::Nothing);

            let patch = SettingsPatch {
                startup_behavior: Some(StartupBehavior::ShowSelector),
                ..SettingsPatch::default()
            };
            svc.storage.update_settings(&patch).await.unwrap();
            assert_eq!(handle_startup(&svc).await, StartupAction::ShowSelector);
        });
    }

    #[test]
    fn test_startup_auto_launch() {
        block_on(async {
            let svc = service();
            let id = saved_template(&svc).await;
            let patch = SettingsPatch {
                startup_behavior: Some(StartupBehavior::AutoLaunch),
                default_template_id: Some(Some(id.clone())),
                open_behavior: Some(OpenBehavior::NewWindow),
                ..SettingsPatch::default()
            };
            svc.storage.update_settings(&patch).await.unwrap();

            let action = handle_startup(&svc).await;

            assert_eq!(
                action,
                StartupAction::Launched {
                    template_id: id,
                    opened: 1
                }
            );
        });
    }

    #[test]
    fn test_startup_auto_launch_deleted_template_is_ignored() {
        block_on(async {
            let svc = service();
            let id = saved_template(&svc).await;
            let patch = SettingsPatch {
                startup_behavior: Some(StartupBehavior::AutoLaunch),
                default_template_id: Some(Some(id.clone())),
                ..SettingsPatch::default()
            };
            svc.storage.update_settings(&patch).await.unwrap();
            svc.delete_template(&id).await.unwrap();

            let action = handle_startup(&svc).await;

            assert_eq!(action, StartupAction::Nothing);
            assert!(svc.tabs.host().calls.borrow().is_empty());
        });
    }

    #[test]
    fn test_startup_auto_launch_without_default_is_ignored() {
        block_on(async {
            let svc = service();
            let patch = SettingsPatch {
                startup_behavior: Some(StartupBehavior::AutoLaunch),
                ..SettingsPatch::default()
            };
            svc.storage.update_settings(&patch).await.unwrap();

            assert_eq!(handle_startup(&svc).await, StartupAction::Nothing);
        });
    }

    #[test]
    fn test_command_routing() {
        block_on(async {
            let svc = service_with(FakeTabHost::with_tabs(vec![host_tab(
                "https://example.com",
            )]));

            let saved = handle_command(&svc, COMMAND_SAVE_CURRENT).await;
            assert!(matches!(saved, CommandOutcome::Saved { .. }));
            assert_eq!(svc.storage.get_templates().await.unwrap().len(), 1);

            assert_eq!(
                handle_command(&svc, COMMAND_OPEN_POPUP).await,
                CommandOutcome::OpenFullView
            );
            assert_eq!(
                handle_command(&svc, "do-a-barrel-roll").await,
                CommandOutcome::Ignored
            );
        });
    }

    #[test]
    fn test_install_initializes_storage() {
        block_on(async {
            let svc = service();
            handle_install(&svc).await.unwrap();
            let settings = svc.storage.get_settings().await.unwrap();
            assert_eq!(settings, crate::model::Settings::default());
        });
    }

    #[test]
    fn test_dispatch_uses_persisted_open_behavior() {
        block_on(async {
            let svc = service();
            let id = saved_template(&svc).await;
            let patch = SettingsPatch {
                open_behavior: Some(OpenBehavior::CurrentWindow),
                ..SettingsPatch::default()
            };
            svc.storage.update_settings(&patch).await.unwrap();

            let response =
                dispatch_message(&svc, Request::LaunchTemplate { template_id: id }).await;

            assert!(response.success);
            assert_eq!(response.data.unwrap()["windowId"], 1);
        });
    }
}
