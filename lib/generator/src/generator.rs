use leadscore_core::{LeadRecord, LABEL_FIELD, TAG_FIELD};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// The positive outcome
pub const WON_STATUS: &str = "Closed-Won";

/// Outcome labels with their draw probabilities
pub const CONVERSION_STATUSES: &[(&str, f64)] = &[
    (WON_STATUS, 0.20),
    ("Closed-Lost", 0.50),
    ("Disqualified", 0.30),
];

const INDUSTRIES: &[&str] = &[
    "SaaS", "Healthcare", "Manufacturing", "Retail", "Finance", "Education", "Technology", "Marketing",
];
const JOB_TITLES: &[&str] = &[
    "Software Engineer", "Marketing Manager", "Sales Representative", "CEO", "CTO", "CFO",
    "Data Scientist", "Product Manager", "HR Manager",
];
const SENIORITY_LEVELS: &[&str] = &["Entry", "Associate", "Manager", "Director", "VP", "C-level"];
const DEPARTMENTS: &[&str] = &[
    "Marketing", "Sales", "IT", "Engineering", "Human Resources", "Finance", "Operations",
];
const CRM_STAGES: &[&str] = &[
    "New Lead", "Qualified", "Discovery", "Proposal", "Negotiation", "Closed-Won", "Closed-Lost",
];
const LEAD_SOURCES: &[&str] = &[
    "Organic Search", "Paid Ad", "Referral", "Webinar", "Social Media", "Email Campaign", "Direct Mail",
];
const COUNTRIES: &[&str] = &["USA", "Canada", "UK", "Germany", "Australia"];
const STATES: &[&str] = &["CA", "NY", "TX", "FL", "IL", "WA", "MA", "GA", "PA", "OH"];
const TECHNOLOGIES: &[&str] = &[
    "AWS", "Azure", "Google Cloud", "Salesforce", "SAP", "Oracle", "Microsoft Dynamics", "HubSpot",
    "Tableau", "Power BI", "Python", "Java", "React", "Angular",
];
const CAMPAIGNS: &[&str] = &[
    "CAMP_2023_Q1", "CAMP_2023_Q2", "CAMP_2023_Q3", "CAMP_2023_Q4", "CAMP_LAUNCH_PROD_A", "CAMP_SUMMER_SALE",
];

/// Produces batches of synthetic labeled leads
#[derive(Debug, Clone)]
pub struct LeadGenerator {
    n_records: usize,
    rng: StdRng,
}

impl LeadGenerator {
    /// Generator seeded from the OS; every batch differs
    pub fn new(n_records: usize) -> Self {
        Self {
            n_records,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible generator
    pub fn with_seed(n_records: usize, seed: u64) -> Self {
        Self {
            n_records,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Draw a fresh batch of `n_records` leads
    pub fn generate(&mut self) -> Vec<LeadRecord> {
        (0..self.n_records).map(|i| self.lead(i)).collect()
    }

    fn lead(&mut self, i: usize) -> LeadRecord {
        let status = self.status();
        let won = status == WON_STATUS;
        let technologies = self.technologies();

        let rng = &mut self.rng;
        let mut record = LeadRecord::new()
            .with("company_id", format!("COMP_{}", i))
            .with("industry", pick(rng, INDUSTRIES))
            .with("company_size_employees", rng.random_range(10u32..5000))
            .with("company_size_revenue_usd", rng.random_range(100_000.0f64..50_000_000.0))
            .with("company_location_country", pick(rng, COUNTRIES))
            .with("company_location_state", pick(rng, STATES))
            .with("is_public_company", rng.random_bool(0.2))
            .with(TAG_FIELD, technologies)
            .with("contact_id", format!("CONT_{}", i))
            .with("job_title", pick(rng, JOB_TITLES))
            .with("seniority_level", pick(rng, SENIORITY_LEVELS))
            .with("department", pick(rng, DEPARTMENTS))
            .with("contact_location_country", pick(rng, COUNTRIES))
            .with("contact_location_state", pick(rng, STATES))
            .with("website_pages_visited_count", rng.random_range(0u32..100))
            .with("website_time_on_site_seconds", rng.random_range(10.0f64..1200.0))
            .with("website_downloads_count", rng.random_range(0u32..10))
            .with("website_form_submissions_count", rng.random_range(0u32..5))
            .with("email_opens_count", rng.random_range(0u32..20))
            .with("email_clicks_count", rng.random_range(0u32..10))
            .with("email_unsubscribed", rng.random_bool(0.1))
            .with("crm_sales_calls_count", rng.random_range(0u32..15))
            .with("crm_meetings_scheduled_count", rng.random_range(0u32..5))
            .with("crm_email_exchanges_count", rng.random_range(0u32..30))
            .with("crm_current_stage", pick(rng, CRM_STAGES))
            .with("social_media_interactions_count", rng.random_range(0u32..50))
            .with("product_trial_features_used_count", rng.random_range(0u32..10))
            .with("product_trial_frequency_score", rng.random_range(0.0f64..1.0))
            .with("lead_source", pick(rng, LEAD_SOURCES))
            .with("marketing_campaign_id", pick(rng, CAMPAIGNS))
            .with(LABEL_FIELD, status);

        let (days, value) = if won {
            (
                f64::from(rng.random_range(10u32..180)),
                rng.random_range(1_000.0f64..100_000.0),
            )
        } else {
            (0.0, 0.0)
        };
        record.insert("time_to_conversion_days", days);
        record.insert("deal_value_usd", value);
        record
    }

    fn status(&mut self) -> &'static str {
        let draw: f64 = self.rng.random();
        let mut cumulative = 0.0;
        for &(status, p) in CONVERSION_STATUSES {
            cumulative += p;
            if draw < cumulative {
                return status;
            }
        }
        CONVERSION_STATUSES[CONVERSION_STATUSES.len() - 1].0
    }

    /// 0 to 3 distinct technologies, joined with ", "
    fn technologies(&mut self) -> String {
        let count = self.rng.random_range(0..4);
        TECHNOLOGIES
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn pick(rng: &mut StdRng, values: &'static [&'static str]) -> &'static str {
    values.choose(rng).copied().unwrap_or_default()
}
