/// Options page: settings, import/export, statistics

use patternfly_yew::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

use crate::bridge::{self, chrome_service};
use crate::model::{now_ms, Settings, SettingsPatch, Template};
use crate::query::Statistics;

/// Wire spelling of an enum value, for `<select>` options.
fn wire<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Parse a `<select>` value back through its wire spelling.
fn parse_wire<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(Value::String(value.to_string())).ok()
}

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Idle,
    Saved,
    Error(String),
}

#[function_component(OptionsPage)]
pub fn options_page() -> Html {
    let state = use_state(|| ViewState::Loading);
    let settings = use_state(Settings::default);
    let templates = use_state(Vec::<Template>::new);
    let stats = use_state(|| None::<Statistics>);
    let import_text = use_state(String::new);
    let import_merge = use_state(|| true);

    let reload = {
        let state = state.clone();
        let settings = settings.clone();
        let templates = templates.clone();
        let stats = stats.clone();

        Callback::from(move |_: ()| {
            let state = state.clone();
            let settings = settings.clone();
            let templates = templates.clone();
            let stats = stats.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.storage.get_settings().await {
                    Ok(loaded) => settings.set(loaded),
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to load: {}", e)));
                        return;
                    }
                }
                match service.storage.get_templates().await {
                    Ok(loaded) => templates.set(loaded),
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to load: {}", e)));
                        return;
                    }
                }
                match service.get_statistics().await {
                    Ok(s) => stats.set(Some(s)),
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to load: {}", e)));
                        return;
                    }
                }
                state.set(ViewState::Idle);
            });
        })
    };

    {
        let reload = reload.clone();
        use_effect_with((), move |_| {
            reload.emit(());
            || ()
        });
    }

    // Persist one settings patch and refresh local state
    let apply_patch = {
        let state = state.clone();
        let settings = settings.clone();

        Callback::from(move |patch: SettingsPatch| {
            let state = state.clone();
            let settings = settings.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.storage.update_settings(&patch).await {
                    Ok(updated) => {
                        settings.set(updated);
                        state.set(ViewState::Saved);
                    }
                    Err(e) => {
                        state.set(ViewState::Error(format!("Save failed: {}", e)));
                    }
                }
            });
        })
    };

    let on_startup_change = {
        let apply_patch = apply_patch.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                if let Some(behavior) = parse_wire(&select.value()) {
                    apply_patch.emit(SettingsPatch {
                        startup_behavior: Some(behavior),
                        ..SettingsPatch::default()
                    });
                }
            }
        })
    };

    let on_default_template_change = {
        let apply_patch = apply_patch.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                let value = select.value();
                let id = if value.is_empty() { None } else { Some(value) };
                apply_patch.emit(SettingsPatch {
                    default_template_id: Some(id),
                    ..SettingsPatch::default()
                });
            }
        })
    };

    let on_open_behavior_change = {
        let apply_patch = apply_patch.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                if let Some(behavior) = parse_wire(&select.value()) {
                    apply_patch.emit(SettingsPatch {
                        open_behavior: Some(behavior),
                        ..SettingsPatch::default()
                    });
                }
            }
        })
    };

    let on_sort_by_change = {
        let apply_patch = apply_patch.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                if let Some(sort_by) = parse_wire(&select.value()) {
                    apply_patch.emit(SettingsPatch {
                        sort_by: Some(sort_by),
                        ..SettingsPatch::default()
                    });
                }
            }
        })
    };

    let on_sort_order_change = {
        let apply_patch = apply_patch.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                if let Some(order) = parse_wire(&select.value()) {
                    apply_patch.emit(SettingsPatch {
                        sort_order: Some(order),
                        ..SettingsPatch::default()
                    });
                }
            }
        })
    };

    let on_theme_change = {
        let apply_patch = apply_patch.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                if let Some(theme) = parse_wire(&select.value()) {
                    apply_patch.emit(SettingsPatch {
                        theme: Some(theme),
                        ..SettingsPatch::default()
                    });
                }
            }
        })
    };

    let toggle = |build: fn(bool) -> SettingsPatch| {
        let apply_patch = apply_patch.clone();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                apply_patch.emit(build(input.checked()));
            }
        })
    };

    let on_close_existing_toggle = toggle(|checked| SettingsPatch {
        close_existing_tabs: Some(checked),
        ..SettingsPatch::default()
    });
    let on_show_favicons_toggle = toggle(|checked| SettingsPatch {
        show_favicons: Some(checked),
        ..SettingsPatch::default()
    });
    let on_confirm_delete_toggle = toggle(|checked| SettingsPatch {
        confirm_delete: Some(checked),
        ..SettingsPatch::default()
    });

    let on_reset_settings = {
        let state = state.clone();
        let settings = settings.clone();

        Callback::from(move |_| {
            let state = state.clone();
            let settings = settings.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.storage.reset_settings().await {
                    Ok(defaults) => {
                        settings.set(defaults);
                        state.set(ViewState::Saved);
                    }
                    Err(e) => state.set(ViewState::Error(format!("Reset failed: {}", e))),
                }
            });
        })
    };

    let on_export = {
        let state = state.clone();

        Callback::from(move |_| {
            let state = state.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.export_templates().await {
                    Ok(file) => match serde_json::to_string_pretty(&file) {
                        Ok(json) => {
                            let filename =
                                format!("tab-templates-export-{}.json", now_ms() as i64);
                            bridge::export_to_file(&json, &filename);
                        }
                        Err(e) => {
                            state.set(ViewState::Error(format!("Export failed: {}", e)));
                        }
                    },
                    Err(e) => state.set(ViewState::Error(format!("Export failed: {}", e))),
                }
            });
        })
    };

    let on_import_input = {
        let import_text = import_text.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(area) = e.target_dyn_into::<HtmlTextAreaElement>() {
                import_text.set(area.value());
            }
        })
    };

    let on_import_merge_toggle = {
        let import_merge = import_merge.clone();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                import_merge.set(input.checked());
            }
        })
    };

    let on_import = {
        let state = state.clone();
        let import_text = import_text.clone();
        let import_merge = import_merge.clone();
        let reload = reload.clone();

        Callback::from(move |_| {
            let state = state.clone();
            let import_text = import_text.clone();
            let reload = reload.clone();
            let merge = *import_merge;
            let text = (*import_text).clone();

            spawn_local(async move {
                let data: Value = match serde_json::from_str(&text) {
                    Ok(data) => data,
                    Err(e) => {
                        state.set(ViewState::Error(format!("Import is not valid JSON: {}", e)));
                        return;
                    }
                };
                let service = chrome_service();
                match service.import_templates(data, merge).await {
                    Ok(count) => {
                        log::info!("imported {} templates", count);
                        import_text.set(String::new());
                        reload.emit(());
                    }
                    Err(e) => state.set(ViewState::Error(format!("Import failed: {}", e))),
                }
            });
        })
    };

    let on_clear_all = {
        let state = state.clone();
        let settings = settings.clone();
        let reload = reload.clone();

        Callback::from(move |_| {
            if settings.confirm_delete {
                let confirmed = web_sys::window()
                    .and_then(|w| w.confirm_with_message("Delete ALL templates?").ok())
                    .unwrap_or(false);
                if !confirmed {
                    return;
                }
            }

            let state = state.clone();
            let reload = reload.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.storage.clear_templates().await {
                    Ok(_) => reload.emit(()),
                    Err(e) => state.set(ViewState::Error(format!("Clear failed: {}", e))),
                }
            });
        })
    };

    html! {
        <div class="container">
            <h1 class="main-title">{"Tab Templates Options"}</h1>

            {match &*state {
                ViewState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading settings..."}</p>
                    </div>
                },
                ViewState::Saved => html! {
                    <Alert r#type={AlertType::Success} title={"Saved"} inline={true}>
                    </Alert>
                },
                ViewState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                ViewState::Idle => html! {}
            }}

            <section class="settings-section">
                <h2>{"Startup"}</h2>
                <label class="settings-row">
                    {"When the browser starts:"}
                    <select onchange={on_startup_change}>
                        <option value="none" selected={wire(&settings.startup_behavior) == "none"}>{"Do nothing"}</option>
                        <option value="show_selector" selected={wire(&settings.startup_behavior) == "show_selector"}>{"Show template selector"}</option>
                        <option value="auto_launch" selected={wire(&settings.startup_behavior) == "auto_launch"}>{"Open default template"}</option>
                    </select>
                </label>
                <label class="settings-row">
                    {"Default template:"}
                    <select onchange={on_default_template_change}>
                        <option value="" selected={settings.default_template_id.is_none()}>{"(none)"}</option>
                        {for templates.iter().map(|t| html! {
                            <option
                                value={t.id.clone()}
                                selected={settings.default_template_id.as_deref() == Some(t.id.as_str())}
                            >
                                {&t.name}
                            </option>
                        })}
                    </select>
                </label>
            </section>

            <section class="settings-section">
                <h2>{"Opening tabs"}</h2>
                <label class="settings-row">
                    {"Open templates in:"}
                    <select onchange={on_open_behavior_change}>
                        <option value="new_window" selected={wire(&settings.open_behavior) == "new_window"}>{"A new window"}</option>
                        <option value="current_window" selected={wire(&settings.open_behavior) == "current_window"}>{"The current window"}</option>
                        <option value="replace_tabs" selected={wire(&settings.open_behavior) == "replace_tabs"}>{"The current window, replacing tabs"}</option>
                    </select>
                </label>
                <label class="settings-row">
                    <input
                        type="checkbox"
                        checked={settings.close_existing_tabs}
                        onchange={on_close_existing_toggle}
                    />
                    {"Close existing tabs when replacing"}
                </label>
            </section>

            <section class="settings-section">
                <h2>{"Display"}</h2>
                <label class="settings-row">
                    {"Sort templates by:"}
                    <select onchange={on_sort_by_change}>
                        <option value="name" selected={wire(&settings.sort_by) == "name"}>{"Name"}</option>
                        <option value="created" selected={wire(&settings.sort_by) == "created"}>{"Created"}</option>
                        <option value="lastUsed" selected={wire(&settings.sort_by) == "lastUsed"}>{"Last used"}</option>
                        <option value="usageCount" selected={wire(&settings.sort_by) == "usageCount"}>{"Usage"}</option>
                    </select>
                    <select onchange={on_sort_order_change}>
                        <option value="asc" selected={wire(&settings.sort_order) == "asc"}>{"Ascending"}</option>
                        <option value="desc" selected={wire(&settings.sort_order) == "desc"}>{"Descending"}</option>
                    </select>
                </label>
                <label class="settings-row">
                    {"Theme:"}
                    <select onchange={on_theme_change}>
                        <option value="system" selected={wire(&settings.theme) == "system"}>{"System"}</option>
                        <option value="light" selected={wire(&settings.theme) == "light"}>{"Light"}</option>
                        <option value="dark" selected={wire(&settings.theme) == "dark"}>{"Dark"}</option>
                    </select>
                </label>
                <label class="settings-row">
                    <input
                        type="checkbox"
                        checked={settings.show_favicons}
                        onchange={on_show_favicons_toggle}
                    />
                    {"Show favicons"}
                </label>
                <label class="settings-row">
                    <input
                        type="checkbox"
                        checked={settings.confirm_delete}
                        onchange={on_confirm_delete_toggle}
                    />
                    {"Confirm before deleting"}
                </label>
                <Button onclick={on_reset_settings} variant={ButtonVariant::Secondary}>
                    {"Reset to defaults"}
                </Button>
            </section>

            <section class="settings-section">
                <h2>{"Import / Export"}</h2>
                <div class="settings-row">
                    <Button onclick={on_export} variant={ButtonVariant::Secondary}>
                        {"Export templates"}
                    </Button>
                </div>
                <div class="settings-row">
                    <textarea
                        placeholder="Paste an exported JSON document..."
                        value={(*import_text).clone()}
                        oninput={on_import_input}
                        class="import-textarea"
                    />
                </div>
                <label class="settings-row">
                    <input
                        type="checkbox"
                        checked={*import_merge}
                        onchange={on_import_merge_toggle}
                    />
                    {"Merge with existing templates (skip duplicates)"}
                </label>
                <Button onclick={on_import} disabled={import_text.is_empty()}>
                    {"Import"}
                </Button>
            </section>

            <section class="settings-section">
                <h2>{"Statistics"}</h2>
                if let Some(stats) = &*stats {
                    <div class="stats-box">
                        <p>{format!("{} templates, {} saved tabs", stats.template_count, stats.total_tabs)}</p>
                        <p>{format!("{} launches, {:.1} tabs per template", stats.total_usage, stats.average_tabs)}</p>
                        if let Some(most_used) = &stats.most_used {
                            <p>{format!("Most used: {} ({} launches)", most_used.name, most_used.usage_count)}</p>
                        }
                    </div>
                }
            </section>

            <section class="settings-section">
                <h2>{"Danger zone"}</h2>
                <Button onclick={on_clear_all} variant={ButtonVariant::Danger}>
                    {"Delete all templates"}
                </Button>
            </section>
        </div>
    }
}
