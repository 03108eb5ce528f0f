/// Template list operations: search filter, sorting, statistics

use std::cmp::Ordering;

use crate::model::{SortBy, SortOrder, Template};

/// Query parameters for listing templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateQuery {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub search: Option<String>,
}

/// Case-insensitive substring match over name and description.
pub fn matches_search(template: &Template, query: &str) -> bool {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    template.name.to_lowercase().contains(&needle)
        || template
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false)
}

/// Filter then stable-sort a template list. Ties compare equal, so storage
/// order is preserved between equal keys.
pub fn filter_and_sort(
    templates: Vec<Template>,
    query: &TemplateQuery,
) -> Vec<Template> {
    let mut result: Vec<Template> = match &query.search {
        Some(s) if !s.is_empty() => templates
            .into_iter()
            .filter(|t| matches_search(t, s))
            .collect(),
        _ => templates,
    };

    result.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_by);
        match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    result
}

fn compare(a: &Template, b: &Template, key: SortBy) -> Ordering {
    match key {
        SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortBy::Created => a.created_at.total_cmp(&b.created_at),
        // A never-used template sorts as earliest.
        SortBy::LastUsed => a
            .last_used_at
            .unwrap_or(0.0)
            .total_cmp(&b.last_used_at.unwrap_or(0.0)),
        SortBy::UsageCount => a.usage_count.cmp(&b.usage_count),
    }
}

/// Aggregate statistics over the stored templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub template_count: usize,
    pub total_tabs: usize,
    pub total_usage: u64,
    pub average_tabs: f64,
    pub most_used: Option<Template>,
}

/// Compute statistics in storage order; the most-used tie resolves to the
/// first-encountered template.
pub fn statistics(templates: &[Template]) -> Statistics {
    let template_count = templates.len();
    let total_tabs: usize = templates.iter().map(|t| t.tabs.len()).sum();
    let total_usage: u64 = templates.iter().map(|t| t.usage_count as u64).sum();
    let average_tabs = if template_count == 0 {
        0.0
    } else {
        total_tabs as f64 / template_count as f64
    };

    let mut most_used: Option<&Template> = None;
    for template in templates {
        match most_used {
            Some(current) if current.usage_count >= template.usage_count => {}
            _ => most_used = Some(template),
        }
    }

    Statistics {
        template_count,
        total_tabs,
        total_usage,
        average_tabs,
        most_used: most_used.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TabEntry;

    fn create_test_template(name: &str, created: f64) -> Template {
        Template::new(name.to_string(), None, Vec::new(), created)
    }

    fn tab(url: &str) -> TabEntry {
        TabEntry::new(url.to_string(), "Tab".to_string(), None)
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let templates = vec![
            create_test_template("Zeta", 1.0),
            create_test_template("alpha", 2.0),
            create_test_template("Beta", 3.0),
        ];

        let sorted = filter_and_sort(templates, &TemplateQuery::default());

        let names: Vec<&str> = sorted.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn test_sort_descending_flips() {
        let templates = vec![
            create_test_template("alpha", 1.0),
            create_test_template("Beta", 2.0),
        ];

        let query = TemplateQuery {
            sort_order: SortOrder::Desc,
            ..TemplateQuery::default()
        };
        let sorted = filter_and_sort(templates, &query);

        assert_eq!(sorted[0].name, "Beta");
        assert_eq!(sorted[1].name, "alpha");
    }

    #[test]
    fn test_sort_last_used_missing_is_earliest() {
        let mut used = create_test_template("used", 1.0);
        used.last_used_at = Some(5_000.0);
        let never = create_test_template("never", 2.0);

        let query = TemplateQuery {
            sort_by: SortBy::LastUsed,
            ..TemplateQuery::default()
        };
        let sorted = filter_and_sort(vec![used, never], &query);

        assert_eq!(sorted[0].name, "never");
        assert_eq!(sorted[1].name, "used");
    }

    #[test]
    fn test_sort_ties_keep_storage_order() {
        let first = create_test_template("same", 1.0);
        let second = create_test_template("same", 2.0);
        let first_id = first.id.clone();

        let sorted = filter_and_sort(vec![first, second], &TemplateQuery::default());

        assert_eq!(sorted[0].id, first_id);
    }

    #[test]
    fn test_search_matches_name_and_description() {
        let mut described = create_test_template("Projects", 1.0);
        described.description = Some("client WORK items".to_string());
        let other = create_test_template("Reading", 2.0);

        let query = TemplateQuery {
            search: Some("work".to_string()),
            ..TemplateQuery::default()
        };
        let found = filter_and_sort(vec![described, other], &query);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Projects");
    }

    #[test]
    fn test_statistics() {
        let mut a = create_test_template("a", 1.0);
        a.tabs = vec![tab("https://one.example.com"), tab("https://two.example.com")];
        a.usage_count = 3;
        let mut b = create_test_template("b", 2.0);
        b.tabs = vec![tab("https://three.example.com")];
        b.usage_count = 5;

        let stats = statistics(&[a, b]);

        assert_eq!(stats.template_count, 2);
        assert_eq!(stats.total_tabs, 3);
        assert_eq!(stats.total_usage, 8);
        assert!((stats.average_tabs - 1.5).abs() < f64::EPSILON);
        assert_eq!(stats.most_used.unwrap().name, "b");
    }

    #[test]
    fn test_statistics_most_used_tie_first_encountered() {
        let mut a = create_test_template("a", 1.0);
        a.usage_count = 4;
        let mut b = create_test_template("b", 2.0);
        b.usage_count = 4;

        let stats = statistics(&[a, b]);

        assert_eq!(stats.most_used.unwrap().name, "a");
    }

    #[test]
    fn test_statistics_empty() {
        let stats = statistics(&[]);
        assert_eq!(stats.template_count, 0);
        assert_eq!(stats.average_tabs, 0.0);
        assert!(stats.most_used.is_none());
    }
}
