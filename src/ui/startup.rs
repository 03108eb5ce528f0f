/// Startup template selector, shown on browser start when configured

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::bridge::chrome_service;
use crate::model::{Settings, Template};
use crate::query::{filter_and_sort, TemplateQuery};

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Idle,
    Launching,
    Error(String),
}

#[function_component(StartupSelector)]
pub fn startup_selector() -> Html {
    let state = use_state(|| ViewState::Loading);
    let templates = use_state(Vec::<Template>::new);
    let settings = use_state(Settings::default);

    {
        let state = state.clone();
        let templates = templates.clone();
        let settings = settings.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let service = chrome_service();
                let loaded_settings = match service.storage.get_settings().await {
                    Ok(s) => s,
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to load: {}", e)));
                        return;
                    }
                };
                settings.set(loaded_settings.clone());

                let query = TemplateQuery {
                    sort_by: loaded_settings.sort_by,
                    sort_order: loaded_settings.sort_order,
                    search: None,
                };
                match service.storage.get_templates().await {
                    Ok(loaded) => {
                        templates.set(filter_and_sort(loaded, &query));
                        state.set(ViewState::Idle);
                    }
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to load: {}", e)));
                    }
                }
            });
            || ()
        });
    }

    // Launch, then close this page
    let on_launch = {
        let state = state.clone();

        Callback::from(move |template_id: String| {
            let state = state.clone();
            state.set(ViewState::Launching);

            spawn_local(async move {
                let service = chrome_service();
                match service.launch_template(&template_id, None).await {
                    Ok(_) => {
                        if let Some(window) = web_sys::window() {
                            let _ = window.close();
                        }
                    }
                    Err(e) => {
                        state.set(ViewState::Error(format!("Launch failed: {}", e)));
                    }
                }
            });
        })
    };

    let on_skip = {
        Callback::from(move |_| {
            if let Some(window) = web_sys::window() {
                let _ = window.close();
            }
        })
    };

    html! {
        <div class="container">
            <h1 class="main-title">{"Pick a template to open"}</h1>

            {match &*state {
                ViewState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading templates..."}</p>
                    </div>
                },
                ViewState::Launching => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Opening tabs..."}</p>
                    </div>
                },
                ViewState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                ViewState::Idle => html! {}
            }}

            if matches!(*state, ViewState::Idle) {
                if templates.is_empty() {
                    <div class="empty-state">
                        <p>{"No templates saved yet."}</p>
                    </div>
                } else {
                    <div class="template-list">
                        {for templates.iter().map(|template| html! {
                            <super::components::TemplateCard
                                template={template.clone()}
                                show_favicons={settings.show_favicons}
                                on_launch={on_launch.clone()}
                            />
                        })}
                    </div>
                }
            }

            <div class="footer">
                <Button onclick={on_skip} variant={ButtonVariant::Link}>
                    {"Skip"}
                </Button>
            </div>
        </div>
    }
}
