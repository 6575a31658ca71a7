//! List filter types and filter specification for the admin.
//!
//! This module provides the [`SimpleListFilter`] trait for custom filters,
//! the [`DateRange`] choices offered by date filters, matching helpers used by
//! the change list, and the [`FilterSpec`] type describing a sidebar filter
//! with its choices and current selection.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lookups::{lookup_values, relation_pks, RelatedObjects};
use crate::model_admin::{FieldSchema, FieldType, FilterChoice, ModelAdmin};

/// A custom list filter with a fixed set of lookups.
///
/// # Examples
///
/// ```
/// use backoffice_admin::filters::SimpleListFilter;
/// use backoffice_admin::model_admin::FilterChoice;
/// use serde_json::Value;
///
/// struct Flagged;
///
/// impl SimpleListFilter for Flagged {
///     fn title(&self) -> &str { "Flagged" }
///     fn parameter_name(&self) -> &str { "flagged" }
///     fn lookups(&self) -> Vec<FilterChoice> {
///         vec![FilterChoice::new("Only flagged", "1")]
///     }
///     fn queryset(&self, _value: &str, objects: Vec<Value>) -> Vec<Value> {
///         objects.into_iter().filter(|o| o["flag"] == true).collect()
///     }
/// }
/// ```
pub trait SimpleListFilter: Send + Sync {
    /// Sidebar title.
    fn title(&self) -> &str;

    /// Query parameter carrying the selected lookup.
    fn parameter_name(&self) -> &str;

    /// The available choices.
    fn lookups(&self) -> Vec<FilterChoice>;

    /// Narrows `objects` for the selected `value`.
    ///
    /// Only called when a non-empty value is selected.
    fn queryset(&self, value: &str, objects: Vec<Value>) -> Vec<Value>;
}

/// Relative date ranges offered by date filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// From midnight today (UTC).
    Today,
    /// From midnight seven days ago.
    PastSevenDays,
    /// From the first of the current month.
    ThisMonth,
    /// From the first of January.
    ThisYear,
}

impl DateRange {
    /// All ranges in sidebar order.
    pub const ALL: [Self; 4] = [Self::Today, Self::PastSevenDays, Self::ThisMonth, Self::ThisYear];

    /// Parses a query parameter value.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.value() == value)
    }

    /// The query parameter value.
    pub const fn value(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::PastSevenDays => "past_7_days",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
        }
    }

    /// The display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::PastSevenDays => "Past 7 days",
            Self::ThisMonth => "This month",
            Self::ThisYear => "This year",
        }
    }

    /// Returns the half-open `[start, end)` interval relative to `now`.
    pub fn bounds(self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let tomorrow = today.succ_opt()?;
        let (start, end) = match self {
            Self::Today => (today, tomorrow),
            Self::PastSevenDays => (today - Duration::days(7), tomorrow),
            Self::ThisMonth => {
                let first = today.with_day(1)?;
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
                };
                (first, next)
            }
            Self::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
            ),
        };
        Some((
            start.and_hms_opt(0, 0, 0)?.and_utc(),
            end.and_hms_opt(0, 0, 0)?.and_utc(),
        ))
    }

    /// Returns `true` if the RFC 3339 timestamp falls in this range.
    pub fn contains(self, timestamp: &str, now: DateTime<Utc>) -> bool {
        let Ok(ts) = DateTime::parse_from_rfc3339(timestamp) else {
            return false;
        };
        let ts = ts.with_timezone(&Utc);
        self.bounds(now)
            .is_some_and(|(start, end)| start <= ts && ts < end)
    }
}

/// Returns `true` if `obj` matches a field filter value.
///
/// Foreign keys compare the related id, many-to-many fields test membership,
/// booleans accept `"true"`/`"false"`, anything else compares its text.
pub fn matches_field(field: &FieldSchema, obj: &Value, value: &str) -> bool {
    match field.field_type {
        FieldType::ForeignKey | FieldType::ManyToManyField => value
            .parse::<i64>()
            .is_ok_and(|pk| relation_pks(obj, &field.name).contains(&pk)),
        _ => obj.get(&field.name).is_some_and(|v| match v {
            Value::String(s) => s == value,
            Value::Number(n) => n.to_string() == value,
            Value::Bool(b) => b.to_string() == value,
            Value::Null => value.is_empty() || value == "null",
            _ => false,
        }),
    }
}

/// Splits a search query into lowercase terms.
pub fn search_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Applies a search query across the admin's search fields.
///
/// Every term must match at least one search field (case-insensitive
/// substring). Relation paths need their related tables cached in `related`.
pub fn apply_search(
    admin: &ModelAdmin,
    related: &RelatedObjects,
    objects: Vec<Value>,
    query: &str,
) -> Vec<Value> {
    let terms = search_terms(query);
    if terms.is_empty() || admin.search_fields.is_empty() {
        return objects;
    }

    objects
        .into_iter()
        .filter(|obj| {
            let haystack: Vec<String> = admin
                .search_fields
                .iter()
                .flat_map(|path| lookup_values(admin, related, obj, path))
                .map(|s| s.to_lowercase())
                .collect();
            terms
                .iter()
                .all(|term| haystack.iter().any(|text| text.contains(term.as_str())))
        })
        .collect()
}

/// A resolved filter specification with its available choices and current selection.
///
/// Generated per request from the registered
/// [`ListFilter`](crate::model_admin::ListFilter)s and the current query
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    /// The query parameter of this filter.
    pub parameter: String,
    /// Human-readable title for this filter.
    pub title: String,
    /// Available filter choices.
    pub choices: Vec<FilterChoice>,
    /// The currently selected value, if any.
    pub selected: Option<String>,
}

impl FilterSpec {
    /// Creates a new filter specification with an "All" choice.
    pub fn new(parameter: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            title: title.into(),
            choices: vec![FilterChoice::new("All", "")],
            selected: None,
        }
    }

    /// Adds a choice to this filter.
    #[must_use]
    pub fn add_choice(mut self, choice: FilterChoice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Adds several choices to this filter.
    #[must_use]
    pub fn add_choices(mut self, choices: impl IntoIterator<Item = FilterChoice>) -> Self {
        self.choices.extend(choices);
        self
    }

    /// Sets the currently selected value.
    #[must_use]
    pub fn selected(mut self, value: Option<&str>) -> Self {
        self.selected = value.filter(|v| !v.is_empty()).map(String::from);
        self
    }

    /// Creates a boolean filter specification with "Yes"/"No" choices.
    pub fn boolean(parameter: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(parameter, title)
            .add_choice(FilterChoice::new("Yes", "true"))
            .add_choice(FilterChoice::new("No", "false"))
    }

    /// Creates a date filter specification with the relative ranges.
    pub fn date(parameter: impl Into<String>, title: impl Into<String>) -> Self {
        let mut spec = Self::new(parameter, title);
        spec.choices[0].display = "Any date".to_string();
        spec.add_choices(
            DateRange::ALL
                .into_iter()
                .map(|r| FilterChoice::new(r.label(), r.value())),
        )
    }

    /// Returns the display label of the selected choice.
    pub fn selected_display(&self) -> Option<&str> {
        let selected = self.selected.as_deref()?;
        self.choices
            .iter()
            .find(|c| c.value == selected)
            .map(|c| c.display.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_filter_spec_new_has_all_choice() {
        let spec = FilterSpec::new("status", "Status");
        assert_eq!(spec.parameter, "status");
        assert_eq!(spec.title, "Status");
        assert_eq!(spec.choices, vec![FilterChoice::new("All", "")]);
        assert!(spec.selected.is_none());
    }

    #[test]
    fn test_filter_spec_add_choice_and_selected() {
        let spec = FilterSpec::new("status", "Status")
            .add_choice(FilterChoice::new("Active", "active"))
            .add_choice(FilterChoice::new("Inactive", "inactive"))
            .selected(Some("inactive"));
        assert_eq!(spec.choices.len(), 3);
        assert_eq!(spec.selected_display(), Some("Inactive"));
    }

    #[test]
    fn test_filter_spec_empty_selection_is_none() {
        let spec = FilterSpec::new("status", "Status").selected(Some(""));
        assert!(spec.selected.is_none());
    }

    #[test]
    fn test_filter_spec_boolean() {
        let spec = FilterSpec::boolean("is_active", "Active");
        assert_eq!(spec.choices.len(), 3);
        assert_eq!(spec.choices[0].display, "All");
        assert_eq!(spec.choices[1].display, "Yes");
        assert_eq!(spec.choices[1].value, "true");
        assert_eq!(spec.choices[2].display, "No");
        assert_eq!(spec.choices[2].value, "false");
    }

    #[test]
    fn test_filter_spec_date() {
        let spec = FilterSpec::date("created", "created");
        let labels: Vec<_> = spec.choices.iter().map(|c| c.display.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Any date", "Today", "Past 7 days", "This month", "This year"]
        );
    }

    #[test]
    fn test_date_range_parse() {
        assert_eq!(DateRange::parse("past_7_days"), Some(DateRange::PastSevenDays));
        assert_eq!(DateRange::parse("yesterday"), None);
    }

    #[test]
    fn test_date_range_today_and_week() {
        let now = at(2024, 5, 15, 12);
        assert!(DateRange::Today.contains("2024-05-15T00:00:00.000000Z", now));
        assert!(!DateRange::Today.contains("2024-05-14T23:59:59.000000Z", now));
        assert!(DateRange::PastSevenDays.contains("2024-05-08T01:00:00Z", now));
        assert!(!DateRange::PastSevenDays.contains("2024-05-07T23:00:00Z", now));
        assert!(!DateRange::Today.contains("not a date", now));
    }

    #[test]
    fn test_date_range_month_and_year_boundaries() {
        let now = at(2024, 12, 31, 23);
        assert!(DateRange::ThisMonth.contains("2024-12-01T00:00:00Z", now));
        assert!(!DateRange::ThisMonth.contains("2024-11-30T23:59:59Z", now));
        assert!(DateRange::ThisYear.contains("2024-01-01T00:00:00Z", now));
        assert!(!DateRange::ThisYear.contains("2025-01-01T00:00:00Z", now));
        assert!(DateRange::ThisYear.contains("2024-06-01T10:00:00+02:00", now));
    }

    #[test]
    fn test_matches_field_scalars() {
        let title = FieldSchema::new("status", FieldType::CharField);
        let flag = FieldSchema::new("active", FieldType::BooleanField);
        let obj = json!({"status": "draft", "active": true});
        assert!(matches_field(&title, &obj, "draft"));
        assert!(!matches_field(&title, &obj, "live"));
        assert!(matches_field(&flag, &obj, "true"));
        assert!(!matches_field(&flag, &obj, "false"));
    }

    #[test]
    fn test_matches_field_relations() {
        let fk = FieldSchema::foreign_key("brand", "shop.brand");
        let m2m = FieldSchema::many_to_many("labels", "shop.label");
        let obj = json!({"brand": 2, "labels": [1, 3]});
        assert!(matches_field(&fk, &obj, "2"));
        assert!(!matches_field(&fk, &obj, "1"));
        assert!(matches_field(&m2m, &obj, "3"));
        assert!(!matches_field(&m2m, &obj, "2"));
        assert!(!matches_field(&m2m, &obj, "abc"));
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(search_terms("  Rust   Tips "), vec!["rust", "tips"]);
        assert!(search_terms("   ").is_empty());
    }

    #[test]
    fn test_apply_search_all_terms_any_field() {
        let admin = ModelAdmin::new("news", "article")
            .fields_schema(vec![
                FieldSchema::new("title", FieldType::CharField),
                FieldSchema::new("body", FieldType::TextField),
            ])
            .search_fields(vec!["title", "body"]);
        let related = RelatedObjects::new();
        let objects = vec![
            json!({"title": "Rust tips", "body": "ownership"}),
            json!({"title": "Go tips", "body": "goroutines"}),
            json!({"title": "Rust news", "body": "release"}),
        ];
        let found = apply_search(&admin, &related, objects.clone(), "RUST tips");
        assert_eq!(found, vec![objects[0].clone()]);
        let found = apply_search(&admin, &related, objects.clone(), "ownership rust");
        assert_eq!(found.len(), 1);
        let found = apply_search(&admin, &related, objects.clone(), "");
        assert_eq!(found.len(), 3);
    }
}
