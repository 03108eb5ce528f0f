/// Popup UI for Tab Templates

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::bridge::{self, chrome_service};
use crate::model::{Settings, Template};
use crate::query::{filter_and_sort, TemplateQuery};

#[derive(Clone, PartialEq)]
enum AppState {
    Loading(String),
    Idle,
    Error(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Loading("Loading templates...".to_string()));
    let templates = use_state(Vec::<Template>::new);
    let settings = use_state(Settings::default);
    let search_query = use_state(String::new);
    let save_name = use_state(String::new);
    let storage_warning = use_state(|| None::<String>);

    let reload = {
        let state = state.clone();
        let templates = templates.clone();
        let settings = settings.clone();

        Callback::from(move |_: ()| {
            let state = state.clone();
            let templates = templates.clone();
            let settings = settings.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.storage.get_settings().await {
                    Ok(loaded) => settings.set(loaded),
                    Err(e) => {
                        state.set(AppState::Error(format!("Failed to load settings: {}", e)));
                        return;
                    }
                }
                match service.storage.get_templates().await {
                    Ok(loaded) => {
                        templates.set(loaded);
                        state.set(AppState::Idle);
                    }
                    Err(e) => {
                        state.set(AppState::Error(format!("Failed to load templates: {}", e)));
                    }
                }
            });
        })
    };

    // Load templates and check the storage quota on mount
    {
        let reload = reload.clone();
        let storage_warning = storage_warning.clone();

        use_effect_with((), move |_| {
            reload.emit(());
            spawn_local(async move {
                let service = chrome_service();
                if let Some(info) = service.storage.get_storage_info().await {
                    let percent = info.percent_used();
                    if percent >= 90 {
                        storage_warning.set(Some(format!("Storage {}% full!", percent)));
                    }
                }
            });
            || ()
        });
    }

    let on_search_input = {
        let search_query = search_query.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                search_query.set(input.value());
            }
        })
    };

    let on_save_name_input = {
        let save_name = save_name.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                save_name.set(input.value());
            }
        })
    };

    // Save the current window as a new template
    let on_save_current = {
        let state = state.clone();
        let save_name = save_name.clone();
        let reload = reload.clone();

        Callback::from(move |_| {
            let state = state.clone();
            let save_name = save_name.clone();
            let reload = reload.clone();
            let name = (*save_name).clone();

            state.set(AppState::Loading("Saving current tabs...".to_string()));

            spawn_local(async move {
                let service = chrome_service();
                match service.create_from_current_tabs(&name, None).await {
                    Ok(_) => {
                        save_name.set(String::new());
                        reload.emit(());
                    }
                    Err(e) => {
                        state.set(AppState::Error(format!("Save failed: {}", e)));
                    }
                }
            });
        })
    };

    let on_launch = {
        let state = state.clone();
        let reload = reload.clone();

        Callback::from(move |template_id: String| {
            let state = state.clone();
            let reload = reload.clone();

            state.set(AppState::Loading("Opening tabs...".to_string()));

            spawn_local(async move {
                let service = chrome_service();
                match service.launch_template(&template_id, None).await {
                    Ok(_) => {
                        reload.emit(());
                    }
                    Err(e) => {
                        state.set(AppState::Error(format!("Launch failed: {}", e)));
                    }
                }
            });
        })
    };

    let on_delete = {
        let state = state.clone();
        let settings = settings.clone();
        let reload = reload.clone();

        Callback::from(move |template_id: String| {
            if settings.confirm_delete {
                let confirmed = web_sys::window()
                    .and_then(|w| w.confirm_with_message("Delete this template?").ok())
                    .unwrap_or(false);
                if !confirmed {
                    return;
                }
            }

            let state = state.clone();
            let reload = reload.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.delete_template(&template_id).await {
                    Ok(_) => reload.emit(()),
                    Err(e) => state.set(AppState::Error(format!("Delete failed: {}", e))),
                }
            });
        })
    };

    let on_duplicate = {
        let state = state.clone();
        let reload = reload.clone();

        Callback::from(move |template_id: String| {
            let state = state.clone();
            let reload = reload.clone();

            spawn_local(async move {
                let service = chrome_service();
                match service.duplicate_template(&template_id).await {
                    Ok(_) => reload.emit(()),
                    Err(e) => state.set(AppState::Error(format!("Duplicate failed: {}", e))),
                }
            });
        })
    };

    let on_open_options = {
        Callback::from(move |_| {
            spawn_local(async move {
                let _ = bridge::open_page("options.html").await;
            });
        })
    };

    let is_busy = matches!(*state, AppState::Loading(_));

    // Filter and sort in memory with the persisted preferences
    let query = TemplateQuery {
        sort_by: settings.sort_by,
        sort_order: settings.sort_order,
        search: Some((*search_query).clone()),
    };
    let visible = filter_and_sort((*templates).clone(), &query);

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Tab Templates"}</h1>

            if let Some(warning) = (*storage_warning).clone() {
                <Alert r#type={AlertType::Warning} title={warning} inline={true}>
                </Alert>
            }

            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            // Save current window
            <div class="save-row">
                <input
                    type="text"
                    placeholder="Template name..."
                    value={(*save_name).clone()}
                    oninput={on_save_name_input}
                    class="save-name-input"
                />
                <Button onclick={on_save_current} disabled={is_busy}>
                    {"Save Current Tabs"}
                </Button>
            </div>

            // Search
            <div class="search-container">
                <input
                    type="text"
                    placeholder="Search templates..."
                    value={(*search_query).clone()}
                    oninput={on_search_input}
                    class="search-input"
                />
            </div>

            // Template list
            if visible.is_empty() {
                <div class="empty-state">
                    if search_query.is_empty() {
                        <p>{"No templates yet."}</p>
                        <p class="empty-state-hint">{"Save the current window to create one."}</p>
                    } else {
                        <p>{"No templates match your search."}</p>
                    }
                </div>
            } else {
                <div class="template-list">
                    {for visible.iter().map(|template| html! {
                        <super::components::TemplateCard
                            template={template.clone()}
                            show_favicons={settings.show_favicons}
                            on_launch={on_launch.clone()}
                            on_delete={Some(on_delete.clone())}
                            on_duplicate={Some(on_duplicate.clone())}
                        />
                    })}
                </div>
            }

            <div class="footer-popup">
                <Button onclick={on_open_options} variant={ButtonVariant::Link}>
                    {"Options"}
                </Button>
                <span>{format!("{} templates", templates.len())}</span>
            </div>
        </div>
    }
}
