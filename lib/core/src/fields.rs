//! Lead field table
//!
//! Every raw field a lead record carries, with the kind that decides how it
//! becomes features. Training and inference both read this table; neither
//! ever guesses a field's kind from the data it happens to receive.

use serde::{Deserialize, Serialize};

/// Field holding the outcome label
pub const LABEL_FIELD: &str = "conversion_status";

/// Field holding the comma-separated technology list
pub const TAG_FIELD: &str = "technologies_used";

/// Prefix for technology presence columns
pub const TAG_COLUMN_PREFIX: &str = "tech_";

/// How a raw field is turned into features
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Record identifier, never a feature
    Identifier,
    /// Small fixed vocabulary, expanded to indicator columns
    Category,
    /// Comma-separated tag list, expanded to presence columns
    Tags,
    /// Whole number, used as is
    Integer,
    /// Real number, used as is
    Float,
    /// true/false, encoded as 1/0
    Boolean,
    /// Outcome label, the training target
    Label,
}

/// One entry of the field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Conditional fields are only populated for converted leads and
    /// default to zero when absent.
    pub imputed: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, imputed: false }
    }

    const fn conditional(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Float, imputed: true }
    }

    /// Whether the field contributes a single numeric column
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Integer | FieldKind::Float | FieldKind::Boolean)
    }
}

/// The lead field table, in column order
pub const LEAD_FIELDS: &[FieldSpec] = &[
    // Firmographics
    FieldSpec::new("company_id", FieldKind::Identifier),
    FieldSpec::new("industry", FieldKind::Category),
    FieldSpec::new("company_size_employees", FieldKind::Integer),
    FieldSpec::new("company_size_revenue_usd", FieldKind::Float),
    FieldSpec::new("company_location_country", FieldKind::Category),
    FieldSpec::new("company_location_state", FieldKind::Category),
    FieldSpec::new("is_public_company", FieldKind::Boolean),
    FieldSpec::new(TAG_FIELD, FieldKind::Tags),
    // Contact
    FieldSpec::new("contact_id", FieldKind::Identifier),
    FieldSpec::new("job_title", FieldKind::Category),
    FieldSpec::new("seniority_level", FieldKind::Category),
    FieldSpec::new("department", FieldKind::Category),
    FieldSpec::new("contact_location_country", FieldKind::Category),
    FieldSpec::new("contact_location_state", FieldKind::Category),
    // Engagement
    FieldSpec::new("website_pages_visited_count", FieldKind::Integer),
    FieldSpec::new("website_time_on_site_seconds", FieldKind::Float),
    FieldSpec::new("website_downloads_count", FieldKind::Integer),
    FieldSpec::new("website_form_submissions_count", FieldKind::Integer),
    FieldSpec::new("email_opens_count", FieldKind::Integer),
    FieldSpec::new("email_clicks_count", FieldKind::Integer),
    FieldSpec::new("email_unsubscribed", FieldKind::Boolean),
    FieldSpec::new("crm_sales_calls_count", FieldKind::Integer),
    FieldSpec::new("crm_meetings_scheduled_count", FieldKind::Integer),
    FieldSpec::new("crm_email_exchanges_count", FieldKind::Integer),
    FieldSpec::new("crm_current_stage", FieldKind::Category),
    FieldSpec::new("social_media_interactions_count", FieldKind::Integer),
    FieldSpec::new("product_trial_features_used_count", FieldKind::Integer),
    FieldSpec::new("product_trial_frequency_score", FieldKind::Float),
    // Source
    FieldSpec::new("lead_source", FieldKind::Category),
    FieldSpec::new("marketing_campaign_id", FieldKind::Category),
    // Outcome
    FieldSpec::new(LABEL_FIELD, FieldKind::Label),
    FieldSpec::conditional("time_to_conversion_days"),
    FieldSpec::conditional("deal_value_usd"),
];

/// Look up a field by name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    LEAD_FIELDS.iter().find(|f| f.name == name)
}

/// Fields used directly as numeric columns, in table order
pub fn numeric_fields() -> impl Iterator<Item = &'static FieldSpec> {
    LEAD_FIELDS.iter().filter(|f| f.is_numeric())
}

/// Fields expanded into indicator columns, in table order
pub fn categorical_fields() -> impl Iterator<Item = &'static FieldSpec> {
    LEAD_FIELDS.iter().filter(|f| f.kind == FieldKind::Category)
}

/// Column name for a technology tag: `tech_` + lower-cased tag with
/// spaces replaced by underscores.
pub fn tag_column(tag: &str) -> String {
    format!("{}{}", TAG_COLUMN_PREFIX, tag.to_lowercase().replace(' ', "_"))
}

/// Column name for a categorical indicator
pub fn category_column(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_label_and_tag_field() {
        let labels = LEAD_FIELDS.iter().filter(|f| f.kind == FieldKind::Label).count();
        let tags = LEAD_FIELDS.iter().filter(|f| f.kind == FieldKind::Tags).count();
        assert_eq!(labels, 1);
        assert_eq!(tags, 1);
        assert_eq!(field(LABEL_FIELD).unwrap().kind, FieldKind::Label);
        assert_eq!(field(TAG_FIELD).unwrap().kind, FieldKind::Tags);
    }

    #[test]
    fn test_categorical_fields_exclude_ids_and_label() {
        let names: Vec<_> = categorical_fields().map(|f| f.name).collect();
        assert_eq!(names.len(), 11);
        assert!(!names.contains(&"company_id"));
        assert!(!names.contains(&"contact_id"));
        assert!(!names.contains(&LABEL_FIELD));
        assert!(!names.contains(&TAG_FIELD));
    }

    #[test]
    fn test_conditional_fields() {
        let deal = field("deal_value_usd").unwrap();
        assert!(deal.imputed);
        assert!(deal.is_numeric());
        assert!(!field("company_id").unwrap().is_numeric());
        assert!(!field("industry").unwrap().imputed);
    }

    #[test]
    fn test_column_names() {
        assert_eq!(tag_column("Google Cloud"), "tech_google_cloud");
        assert_eq!(tag_column("AWS"), "tech_aws");
        assert_eq!(category_column("industry", "SaaS"), "industry_SaaS");
    }
}
