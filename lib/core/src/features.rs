//! Feature schema and feature matrices
//!
//! A [`FeatureSchema`] is learned once from a training batch and then used
//! to project any batch of lead records onto the same ordered column list:
//!
//! 1. numeric, integer and boolean fields, in field-table order
//!    (conditional fields read as 0 when absent)
//! 2. one presence column per technology tag seen in training, tags sorted
//! 3. one indicator column per categorical value seen in training, minus the
//!    lexically first value of each field, which acts as the baseline
//!
//! Tags and category values the schema has never seen produce no column and
//! no error. Identifier and label fields never become columns.

use crate::fields::{self, FieldSpec, TAG_FIELD};
use crate::record::LeadRecord;
use crate::{Error, Result};
use ahash::AHashMap;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Current feature schema layout version
pub const SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCHEMA_VERSION
}

/// A technology tag and the column it lights up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagFeature {
    pub tag: String,
    pub column: usize,
}

/// A non-baseline category value and its indicator column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryLevel {
    pub value: String,
    pub column: usize,
}

/// Indicator encoding learned for one categorical field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEncoding {
    pub field: String,
    /// Value that gets no column; a record with it has all indicators at 0
    pub baseline: Option<String>,
    /// Remaining values, sorted
    pub levels: Vec<CategoryLevel>,
}

impl CategoryEncoding {
    fn level(&self, value: &str) -> Option<&CategoryLevel> {
        self.levels
            .binary_search_by(|l| l.value.as_str().cmp(value))
            .ok()
            .map(|i| &self.levels[i])
    }
}

/// The fixed set and order of classifier input columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureSchema {
    #[serde(default = "default_version")]
    pub version: u32,
    numeric: Vec<String>,
    /// Sorted by tag
    tags: Vec<TagFeature>,
    categories: Vec<CategoryEncoding>,
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Learn the schema from a training batch
    pub fn fit(records: &[LeadRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::InsufficientData("no training records".to_string()));
        }

        let tag_spec = tag_field()?;
        let mut seen_tags = BTreeSet::new();
        let mut seen_values: BTreeMap<&'static str, BTreeSet<String>> = fields::categorical_fields()
            .map(|spec| (spec.name, BTreeSet::new()))
            .collect();

        for record in records {
            seen_tags.extend(record.tags(tag_spec)?);
            for spec in fields::categorical_fields() {
                let value = record.category(spec)?;
                if let Some(values) = seen_values.get_mut(spec.name) {
                    values.insert(value);
                }
            }
        }

        let mut columns = ColumnSet::default();

        let numeric: Vec<String> = fields::numeric_fields()
            .map(|spec| {
                columns.push(spec.name.to_string());
                spec.name.to_string()
            })
            .collect();

        let tags = seen_tags
            .into_iter()
            .map(|tag| {
                let column = columns.push(fields::tag_column(&tag));
                TagFeature { tag, column }
            })
            .collect();

        let categories = fields::categorical_fields()
            .map(|spec| {
                let mut values = seen_values.remove(spec.name).unwrap_or_default().into_iter();
                let baseline = values.next();
                let levels = values
                    .map(|value| {
                        let column = columns.push(fields::category_column(spec.name, &value));
                        CategoryLevel { value, column }
                    })
                    .collect();
                CategoryEncoding {
                    field: spec.name.to_string(),
                    baseline,
                    levels,
                }
            })
            .collect();

        Ok(Self {
            version: SCHEMA_VERSION,
            numeric,
            tags,
            categories,
            columns: columns.names,
        })
    }

    /// Project records onto this schema's columns
    pub fn transform(&self, records: &[LeadRecord]) -> Result<FeatureMatrix> {
        let tag_spec = tag_field()?;
        let numeric_specs = self
            .numeric
            .iter()
            .map(|name| lookup(name))
            .collect::<Result<Vec<_>>>()?;
        let category_specs = self
            .categories
            .iter()
            .map(|enc| lookup(&enc.field))
            .collect::<Result<Vec<_>>>()?;

        let mut values = Array2::<f64>::zeros((records.len(), self.columns.len()));

        for (i, record) in records.iter().enumerate() {
            let mut row = values.row_mut(i);

            for (j, spec) in numeric_specs.iter().enumerate() {
                row[j] = record.number(spec)?;
            }

            for tag in record.tags(tag_spec)? {
                if let Some(feature) = self.tag(&tag) {
                    row[feature.column] = 1.0;
                }
            }

            for (encoding, spec) in self.categories.iter().zip(&category_specs) {
                let value = record.category(spec)?;
                if let Some(level) = encoding.level(&value) {
                    row[level.column] = 1.0;
                }
            }
        }

        Ok(FeatureMatrix {
            columns: self.columns.clone(),
            values,
        })
    }

    /// Ordered column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_features(&self) -> usize {
        self.columns.len()
    }

    pub fn numeric_fields(&self) -> &[String] {
        &self.numeric
    }

    /// Tags seen during training, sorted
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.tag.as_str())
    }

    /// Names of the fields expanded into indicator columns
    pub fn categorical_fields(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.field.as_str())
    }

    pub fn category(&self, field: &str) -> Option<&CategoryEncoding> {
        self.categories.iter().find(|c| c.field == field)
    }

    fn tag(&self, tag: &str) -> Option<&TagFeature> {
        self.tags
            .binary_search_by(|t| t.tag.as_str().cmp(tag))
            .ok()
            .map(|i| &self.tags[i])
    }
}

/// Column names in insertion order; names that normalize to the same
/// column share it.
#[derive(Default)]
struct ColumnSet {
    names: Vec<String>,
    index: AHashMap<String, usize>,
}

impl ColumnSet {
    fn push(&mut self, name: String) -> usize {
        if let Some(&existing) = self.index.get(&name) {
            return existing;
        }
        let column = self.names.len();
        self.index.insert(name.clone(), column);
        self.names.push(name);
        column
    }
}

fn tag_field() -> Result<&'static FieldSpec> {
    lookup(TAG_FIELD)
}

fn lookup(name: &str) -> Result<&'static FieldSpec> {
    fields::field(name)
        .ok_or_else(|| Error::SchemaMismatch(format!("unknown field '{}' in feature schema", name)))
}

/// A dense row-major feature matrix with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// A column by name
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|j| self.values.column(j))
    }

    /// Copy out the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::LABEL_FIELD;

    fn lead(industry: &str, techs: &str, status: &str) -> LeadRecord {
        LeadRecord::new()
            .with("company_id", "COMP_0")
            .with("contact_id", "CONT_0")
            .with("industry", industry)
            .with("company_size_employees", 120)
            .with("company_size_revenue_usd", 2_500_000.0)
            .with("company_location_country", "USA")
            .with("company_location_state", "CA")
            .with("is_public_company", false)
            .with(TAG_FIELD, techs)
            .with("job_title", "CTO")
            .with("seniority_level", "C-level")
            .with("department", "IT")
            .with("contact_location_country", "USA")
            .with("contact_location_state", "NY")
            .with("website_pages_visited_count", 12)
            .with("website_time_on_site_seconds", 340.0)
            .with("website_downloads_count", 1)
            .with("website_form_submissions_count", 0)
            .with("email_opens_count", 4)
            .with("email_clicks_count", 1)
            .with("email_unsubscribed", false)
            .with("crm_sales_calls_count", 2)
            .with("crm_meetings_scheduled_count", 1)
            .with("crm_email_exchanges_count", 5)
            .with("crm_current_stage", "Qualified")
            .with("social_media_interactions_count", 3)
            .with("product_trial_features_used_count", 2)
            .with("product_trial_frequency_score", 0.4)
            .with("lead_source", "Referral")
            .with("marketing_campaign_id", "CAMP_2023_Q1")
            .with(LABEL_FIELD, status)
    }

    fn batch() -> Vec<LeadRecord> {
        vec![
            lead("SaaS", "AWS, Salesforce", "Closed-Won"),
            lead("Finance", "", "Closed-Lost"),
            lead("Healthcare", "Google Cloud", "Disqualified"),
        ]
    }

    #[test]
    fn test_fit_tags_sorted() {
        let schema = FeatureSchema::fit(&batch()).unwrap();
        let tags: Vec<_> = schema.tags().collect();
        assert_eq!(tags, vec!["AWS", "Google Cloud", "Salesforce"]);
        assert!(schema.columns().contains(&"tech_google_cloud".to_string()));
        assert!(!schema.columns().contains(&TAG_FIELD.to_string()));
    }

    #[test]
    fn test_fit_drops_baseline_value() {
        let schema = FeatureSchema::fit(&batch()).unwrap();
        let industry = schema.category("industry").unwrap();
        assert_eq!(industry.baseline.as_deref(), Some("Finance"));
        let values: Vec<_> = industry.levels.iter().map(|l| l.value.as_str()).collect();
        assert_eq!(values, vec!["Healthcare", "SaaS"]);
        assert!(!schema.columns().contains(&"industry_Finance".to_string()));

        // Single observed value: baseline only, no columns
        let country = schema.category("company_location_country").unwrap();
        assert!(country.levels.is_empty());
    }

    #[test]
    fn test_identifiers_and_label_excluded() {
        let schema = FeatureSchema::fit(&batch()).unwrap();
        for name in ["company_id", "contact_id", LABEL_FIELD] {
            assert!(!schema.columns().iter().any(|c| c.starts_with(name)));
        }
        assert!(!schema.categorical_fields().any(|f| f == LABEL_FIELD));
    }

    #[test]
    fn test_column_order() {
        let schema = FeatureSchema::fit(&batch()).unwrap();
        let columns = schema.columns();
        let n_numeric = schema.numeric_fields().len();
        assert_eq!(&columns[..n_numeric], schema.numeric_fields());
        assert_eq!(columns[n_numeric], "tech_aws");
        assert_eq!(columns[n_numeric + 3], "industry_Healthcare");
    }

    #[test]
    fn test_transform_encodes_values() {
        let records = batch();
        let schema = FeatureSchema::fit(&records).unwrap();
        let matrix = schema.transform(&records).unwrap();

        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), schema.num_features());
        assert_eq!(matrix.column("tech_aws").unwrap().to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(matrix.column("industry_SaaS").unwrap().to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(matrix.column("company_size_employees").unwrap()[0], 120.0);
    }

    #[test]
    fn test_unseen_values_ignored() {
        let schema = FeatureSchema::fit(&batch()).unwrap();
        let novel = lead("Aerospace", "QuantumDB", "Unknown");
        let matrix = schema.transform(&[novel]).unwrap();

        assert_eq!(matrix.columns(), schema.columns());
        assert!(matrix.column("tech_quantumdb").is_none());
        for column in schema.columns().iter().filter(|c| c.starts_with("tech_") || c.starts_with("industry_")) {
            assert_eq!(matrix.column(column).unwrap()[0], 0.0);
        }
    }

    #[test]
    fn test_conditional_fields_imputed() {
        let records = batch();
        let schema = FeatureSchema::fit(&records).unwrap();
        let mut record = records[0].clone();
        record.remove("deal_value_usd");
        record.remove("time_to_conversion_days");

        let matrix = schema.transform(&[record]).unwrap();
        assert_eq!(matrix.column("deal_value_usd").unwrap()[0], 0.0);
        assert_eq!(matrix.column("time_to_conversion_days").unwrap()[0], 0.0);
    }

    #[test]
    fn test_missing_field_is_mismatch() {
        let records = batch();
        let schema = FeatureSchema::fit(&records).unwrap();
        let mut record = records[0].clone();
        record.remove("industry");
        assert!(matches!(schema.transform(&[record.clone()]), Err(Error::SchemaMismatch(_))));
        assert!(matches!(FeatureSchema::fit(&[record]), Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_colliding_tag_names_share_column() {
        let records = vec![
            lead("SaaS", "Power BI", "Closed-Won"),
            lead("SaaS", "power bi", "Closed-Lost"),
        ];
        let schema = FeatureSchema::fit(&records).unwrap();
        let count = schema.columns().iter().filter(|c| *c == "tech_power_bi").count();
        assert_eq!(count, 1);

        let matrix = schema.transform(&records).unwrap();
        assert_eq!(matrix.column("tech_power_bi").unwrap().to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_fit_empty_batch() {
        assert!(matches!(FeatureSchema::fit(&[]), Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_schema_serde_roundtrip() {
        let schema = FeatureSchema::fit(&batch()).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
        assert_eq!(parsed.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_select_rows() {
        let records = batch();
        let schema = FeatureSchema::fit(&records).unwrap();
        let matrix = schema.transform(&records).unwrap();
        let subset = matrix.select_rows(&[2, 0]);
        assert_eq!(subset.nrows(), 2);
        assert_eq!(subset.row(0), matrix.row(2));
        assert_eq!(subset.row(1), matrix.row(0));
    }
}
