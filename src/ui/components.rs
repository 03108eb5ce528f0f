/// Reusable UI components

use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::model::Template;

/// Render a millisecond timestamp as a short local date.
#[cfg(target_arch = "wasm32")]
pub fn format_date(ms: f64) -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(ms));
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        date.get_full_year(),
        date.get_month() + 1,
        date.get_date(),
        date.get_hours(),
        date.get_minutes()
    )
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(ms: f64) -> String {
    format!("{}", ms as u64)
}

#[derive(Properties, PartialEq)]
pub struct TemplateCardProps {
    pub template: Template,
    #[prop_or(true)]
    pub show_favicons: bool,
    pub on_launch: Callback<String>,
    #[prop_or_default]
    pub on_delete: Option<Callback<String>>,
    #[prop_or_default]
    pub on_duplicate: Option<Callback<String>>,
}

#[function_component(TemplateCard)]
pub fn template_card(props: &TemplateCardProps) -> Html {
    let expanded = use_state(|| false);
    let template = &props.template;

    let toggle_expanded = {
        let expanded = expanded.clone();
        Callback::from(move |_| {
            expanded.set(!*expanded);
        })
    };

    let usage_line = match template.last_used_at {
        Some(ms) => format!(
            "{} tabs • used {} times • last {}",
            template.tabs.len(),
            template.usage_count,
            format_date(ms)
        ),
        None => format!("{} tabs • never used", template.tabs.len()),
    };

    html! {
        <div class="template-card" style={format!("border-left: 4px solid {};", template.color)}>
            <div class="template-header">
                <div class="template-title-container">
                    <h3 class="template-title" onclick={toggle_expanded.clone()}>
                        {&template.name}
                    </h3>
                    if let Some(description) = &template.description {
                        <p class="template-description">{description}</p>
                    }
                    <p class="template-meta">{usage_line}</p>
                </div>

                <div class="template-actions">
                    <Button
                        onclick={props.on_launch.reform({
                            let id = template.id.clone();
                            move |_| id.clone()
                        })}
                    >
                        {"Open"}
                    </Button>
                    if let Some(on_duplicate) = &props.on_duplicate {
                        <Button
                            onclick={on_duplicate.reform({
                                let id = template.id.clone();
                                move |_| id.clone()
                            })}
                            variant={ButtonVariant::Secondary}
                        >
                            {"Duplicate"}
                        </Button>
                    }
                    if let Some(on_delete) = &props.on_delete {
                        <Button
                            onclick={on_delete.reform({
                                let id = template.id.clone();
                                move |_| id.clone()
                            })}
                            variant={ButtonVariant::Danger}
                        >
                            {"Delete"}
                        </Button>
                    }
                </div>
            </div>

            if *expanded {
                <div class="template-tabs">
                    {for template.tabs.iter().map(|tab| html! {
                        <div key={tab.url.clone()} class="template-tab-row">
                            if props.show_favicons {
                                if let Some(favicon) = tab.favicon_url() {
                                    <img class="template-tab-favicon" src={favicon} alt="" width="16" height="16" />
                                }
                            }
                            <div class="template-tab-text">
                                <div class="template-tab-title">{&tab.title}</div>
                                <div class="template-tab-url">{&tab.url}</div>
                            </div>
                        </div>
                    })}
                </div>
            }
        </div>
    }
}
