/// Shape, length and scheme validation for templates and settings
///
/// Every function here is pure and side-effect free; composite checks
/// short-circuit on the first invalid field and surface a single message.

use crate::error::{Error, Result};
use crate::model::{
    Settings, TabEntry, Template, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_TABS, MAX_URL_LEN,
};

/// A URL is storable when it parses and uses http or https. Browser-internal
/// schemes are rejected here so they never reach storage.
pub fn validate_url(raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(Error::Validation("URL is empty".to_string()));
    }
    if raw.len() > MAX_URL_LEN {
        return Err(Error::Validation(format!(
            "URL exceeds {} characters",
            MAX_URL_LEN
        )));
    }
    let parsed = url::Url::parse(raw)
        .map_err(|_| Error::Validation(format!("URL does not parse: {}", raw)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Validation(format!(
            "unsupported URL scheme: {}",
            other
        ))),
    }
}

/// Strip angle brackets and surrounding whitespace from a user-supplied name.
pub fn sanitize_name(raw: &str) -> String {
    raw.replace(['<', '>'], "").trim().to_string()
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

pub fn validate_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(Error::Validation(format!(
            "description exceeds {} characters",
            MAX_DESCRIPTION_LEN
        ))),
        _ => Ok(()),
    }
}

pub fn validate_tab(tab: &TabEntry) -> Result<()> {
    validate_url(&tab.url)?;
    if tab.title.trim().is_empty() {
        return Err(Error::Validation("tab title must not be empty".to_string()));
    }
    Ok(())
}

pub fn validate_template(template: &Template) -> Result<()> {
    if template.id.is_empty() {
        return Err(Error::Validation("template id is missing".to_string()));
    }
    validate_name(&template.name)?;
    validate_description(template.description.as_deref())?;
    if template.tabs.len() > MAX_TABS {
        return Err(Error::Validation(format!(
            "template holds more than {} tabs",
            MAX_TABS
        )));
    }
    for tab in &template.tabs {
        validate_tab(tab)?;
    }
    if !template.created_at.is_finite() || template.created_at <= 0.0 {
        return Err(Error::Validation(
            "createdAt is not a valid timestamp".to_string(),
        ));
    }
    if let Some(last_used) = template.last_used_at {
        if !last_used.is_finite() || last_used <= 0.0 {
            return Err(Error::Validation(
                "lastUsedAt is not a valid timestamp".to_string(),
            ));
        }
    }
    Ok(())
}

/// The enum and boolean fields of [`Settings`] are closed by construction;
/// the only representable inconsistency left to check is an empty default
/// template reference.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if let Some(id) = &settings.default_template_id {
        if id.is_empty() {
            return Err(Error::Validation(
                "defaultTemplateId must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Template;

    fn create_test_template() -> Template {
        Template::new(
            "Work".to_string(),
            Some("daily sites".to_string()),
            vec![TabEntry::new(
                "https://mail.example.com".to_string(),
                "Mail".to_string(),
                None,
            )],
            1_698_508_200_000.0,
        )
    }

    #[test]
    fn test_validate_url_schemes() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/path?q=1").is_ok());
        assert!(validate_url("chrome://settings").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("chrome-extension://abc/popup.html").is_err());
    }

    #[test]
    fn test_validate_url_shape() {
        assert!(validate_url("").is_err());
        assert!(validate_url("not a url").is_err());

        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(validate_url(&long).is_err());
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  Work <b>stuff</b>  "), "Work bstuff/b");
        assert_eq!(sanitize_name("<>"), "");
        assert_eq!(sanitize_name("Plain"), "Plain");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Work").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some("short")).is_ok());
        assert!(validate_description(Some(&"x".repeat(MAX_DESCRIPTION_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_tab() {
        let ok = TabEntry::new("https://example.com".to_string(), "Example".to_string(), None);
        assert!(validate_tab(&ok).is_ok());

        let no_title = TabEntry::new("https://example.com".to_string(), " ".to_string(), None);
        assert!(validate_tab(&no_title).is_err());

        let bad_url = TabEntry::new("about:blank".to_string(), "Blank".to_string(), None);
        assert!(validate_tab(&bad_url).is_err());
    }

    #[test]
    fn test_validate_template_ok() {
        assert!(validate_template(&create_test_template()).is_ok());
    }

    #[test]
    fn test_validate_template_short_circuits() {
        let mut t = create_test_template();
        t.name = String::new();
        t.tabs[0].url = "chrome://settings".to_string();

        // First invalid field wins: the name error, not the tab error.
        let err = validate_template(&t).unwrap_err();
        assert_eq!(err, Error::Validation("name must not be empty".to_string()));
    }

    #[test]
    fn test_validate_template_too_many_tabs() {
        let mut t = create_test_template();
        let tab = t.tabs[0].clone();
        t.tabs = vec![tab; MAX_TABS + 1];
        assert!(validate_template(&t).is_err());
    }

    #[test]
    fn test_validate_template_bad_timestamp() {
        let mut t = create_test_template();
        t.created_at = f64::NAN;
        assert!(validate_template(&t).is_err());
    }

    #[test]
    fn test_validate_settings() {
        assert!(validate_settings(&Settings::default()).is_ok());

        let bad = Settings {
            default_template_id: Some(String::new()),
            ..Settings::default()
        };
        assert!(validate_settings(&bad).is_err());
    }
}
