//! Deterministic lead fixtures for unit tests

use crate::fields::{LABEL_FIELD, TAG_FIELD};
use crate::record::LeadRecord;

const INDUSTRIES: &[&str] = &["SaaS", "Healthcare", "Finance", "Retail"];
const TECHS: &[&str] = &["AWS, Salesforce", "", "Google Cloud", "Azure, HubSpot, Tableau", "AWS"];
const STAGES: &[&str] = &["New Lead", "Qualified", "Proposal", "Negotiation"];
const SOURCES: &[&str] = &["Referral", "Webinar", "Paid Ad"];

/// One lead, varied by `i`, with engagement leaning on `status`
pub(crate) fn sample_lead(i: usize, status: &str) -> LeadRecord {
    let won = status == "Closed-Won";
    let lift: usize = match status {
        "Closed-Won" => 3,
        "Closed-Lost" => 1,
        _ => 0,
    };

    let mut record = LeadRecord::new()
        .with("company_id", format!("COMP_{}", i))
        .with("contact_id", format!("CONT_{}", i))
        .with("industry", INDUSTRIES[i % INDUSTRIES.len()])
        .with("company_size_employees", 50 + (i * 37) % 900)
        .with("company_size_revenue_usd", 250_000.0 + (i as f64) * 12_345.0)
        .with("company_location_country", if i % 3 == 0 { "USA" } else { "Canada" })
        .with("company_location_state", if i % 2 == 0 { "CA" } else { "NY" })
        .with("is_public_company", i % 5 == 0)
        .with(TAG_FIELD, TECHS[i % TECHS.len()])
        .with("job_title", if i % 2 == 0 { "CTO" } else { "Data Scientist" })
        .with("seniority_level", if i % 3 == 0 { "VP" } else { "Manager" })
        .with("department", if i % 4 == 0 { "Sales" } else { "IT" })
        .with("contact_location_country", "USA")
        .with("contact_location_state", if i % 2 == 0 { "TX" } else { "WA" })
        .with("website_pages_visited_count", 5 + lift * 10 + i % 7)
        .with("website_time_on_site_seconds", 60.0 + (i % 11) as f64 * 30.0)
        .with("website_downloads_count", i % 4)
        .with("website_form_submissions_count", lift)
        .with("email_opens_count", 2 + lift * 3 + i % 3)
        .with("email_clicks_count", lift + i % 2)
        .with("email_unsubscribed", i % 9 == 0)
        .with("crm_sales_calls_count", lift * 2 + i % 3)
        .with("crm_meetings_scheduled_count", lift)
        .with("crm_email_exchanges_count", 3 + lift * 4)
        .with("crm_current_stage", STAGES[i % STAGES.len()])
        .with("social_media_interactions_count", i % 13)
        .with("product_trial_features_used_count", lift + i % 2)
        .with("product_trial_frequency_score", 0.1 + lift as f64 * 0.25)
        .with("lead_source", SOURCES[i % SOURCES.len()])
        .with("marketing_campaign_id", if i % 2 == 0 { "CAMP_2023_Q1" } else { "CAMP_SUMMER_SALE" })
        .with(LABEL_FIELD, status);

    if won {
        record.insert("time_to_conversion_days", 10.0 + (i % 170) as f64);
        record.insert("deal_value_usd", 1_000.0 + (i as f64) * 250.0);
    }
    record
}

/// `count` leads per `(status, count)` pair, ids running across the batch
pub(crate) fn sample_batch(classes: &[(&str, usize)]) -> Vec<LeadRecord> {
    classes
        .iter()
        .flat_map(|&(status, count)| std::iter::repeat(status).take(count))
        .enumerate()
        .map(|(i, status)| sample_lead(i, status))
        .collect()
}
