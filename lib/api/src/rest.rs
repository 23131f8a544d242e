use actix_web::{web, App, HttpServer, HttpResponse, Result as ActixResult};
use actix_cors::Cors;
use chrono::{DateTime, Utc};
use leadscore_core::{ClassificationReport, Error, LeadRecord, ScoringPipeline};
use leadscore_generator::{LeadGenerator, WON_STATUS};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Shared state behind every handler
pub struct AppState {
    pipeline: Arc<ScoringPipeline>,
    live: Mutex<LeadGenerator>,
}

impl AppState {
    /// `live` produces the simulated incoming leads for `/leads` and `/stats`
    pub fn new(pipeline: Arc<ScoringPipeline>, live: LeadGenerator) -> Self {
        Self {
            pipeline,
            live: Mutex::new(live),
        }
    }

    pub fn pipeline(&self) -> &Arc<ScoringPipeline> {
        &self.pipeline
    }

    fn live_batch(&self) -> Vec<LeadRecord> {
        self.live.lock().generate()
    }
}

/// A single lead submitted for scoring
///
/// The firmographic basics are required; everything else falls back to a
/// neutral default so a lead can be typed in by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadInput {
    pub industry: String,
    pub lead_source: String,
    pub company_size_employees: i64,
    pub company_size_revenue_usd: f64,
    /// Comma-separated
    pub technologies_used: String,
    pub crm_current_stage: String,
    #[serde(flatten)]
    pub details: LeadDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadDetails {
    pub job_title: String,
    pub seniority_level: String,
    pub department: String,
    pub company_id: String,
    pub contact_id: String,
    pub company_location_country: String,
    pub company_location_state: String,
    pub contact_location_country: String,
    pub contact_location_state: String,
    pub is_public_company: bool,
    pub email_unsubscribed: bool,
    pub website_pages_visited_count: i64,
    pub website_time_on_site_seconds: f64,
    pub website_downloads_count: i64,
    pub website_form_submissions_count: i64,
    pub email_opens_count: i64,
    pub email_clicks_count: i64,
    pub crm_sales_calls_count: i64,
    pub crm_meetings_scheduled_count: i64,
    pub crm_email_exchanges_count: i64,
    pub social_media_interactions_count: i64,
    pub product_trial_features_used_count: i64,
    pub product_trial_frequency_score: f64,
    pub marketing_campaign_id: String,
    /// Placeholder; ignored when scoring
    pub conversion_status: String,
    pub time_to_conversion_days: f64,
    pub deal_value_usd: f64,
}

impl Default for LeadDetails {
    fn default() -> Self {
        Self {
            job_title: "Manager".to_string(),
            seniority_level: "Manager".to_string(),
            department: "Sales".to_string(),
            company_id: "MANUAL_ENTRY".to_string(),
            contact_id: "MANUAL_ENTRY".to_string(),
            company_location_country: "USA".to_string(),
            company_location_state: "CA".to_string(),
            contact_location_country: "USA".to_string(),
            contact_location_state: "CA".to_string(),
            is_public_company: false,
            email_unsubscribed: false,
            website_pages_visited_count: 5,
            website_time_on_site_seconds: 0.0,
            website_downloads_count: 0,
            website_form_submissions_count: 0,
            email_opens_count: 0,
            email_clicks_count: 0,
            crm_sales_calls_count: 0,
            crm_meetings_scheduled_count: 0,
            crm_email_exchanges_count: 0,
            social_media_interactions_count: 0,
            product_trial_features_used_count: 0,
            product_trial_frequency_score: 0.5,
            marketing_campaign_id: "None".to_string(),
            conversion_status: "Unknown".to_string(),
            time_to_conversion_days: 0.0,
            deal_value_usd: 0.0,
        }
    }
}

impl LeadInput {
    pub fn into_record(self) -> Result<LeadRecord, Error> {
        let value = serde_json::to_value(self)
            .map_err(|e| Error::SchemaMismatch(e.to_string()))?;
        LeadRecord::from_value(value)
    }
}

#[derive(Deserialize)]
struct LeadsQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ModelStats {
    accuracy: f64,
    classes: Vec<String>,
    confusion_matrix: Vec<Vec<usize>>,
    classification_report: ClassificationReport,
    trained_at: DateTime<Utc>,
    training_records: usize,
    schema_version: u32,
    feature_count: usize,
}

#[derive(Serialize)]
struct DashboardStats {
    total_leads: usize,
    conversion_rate: f64,
    avg_deal_value: f64,
    industry_distribution: BTreeMap<String, usize>,
    conversion_by_source: BTreeMap<String, usize>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(Self::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register all routes; expects `web::Data<Arc<AppState>>` in app data
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/", web::get().to(read_root))
            .route("/predict", web::post().to(predict_lead))
            .route("/leads", web::get().to(get_leads))
            .route("/model-stats", web::get().to(get_model_stats))
            .route("/stats", web::get().to(get_stats));
    }
}

fn error_response(err: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        Error::ModelNotReady => HttpResponse::ServiceUnavailable().json(body),
        Error::SchemaMismatch(_) => HttpResponse::UnprocessableEntity().json(body),
        Error::InsufficientData(_) => HttpResponse::BadRequest().json(body),
    }
}

async fn read_root() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Lead Scoring API v2 (ML Enabled) is running"
    })))
}

async fn predict_lead(
    state: web::Data<Arc<AppState>>,
    req: web::Json<LeadInput>,
) -> ActixResult<HttpResponse> {
    let record = match req.into_inner().into_record() {
        Ok(r) => r,
        Err(e) => return Ok(error_response(&e)),
    };

    match state.pipeline.predict(std::slice::from_ref(&record)) {
        Ok(mut results) if !results.is_empty() => Ok(HttpResponse::Ok().json(results.swap_remove(0))),
        Ok(_) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "no prediction produced"
        }))),
        Err(e) => {
            warn!("Prediction failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

async fn get_leads(
    state: web::Data<Arc<AppState>>,
    query: web::Query<LeadsQuery>,
) -> ActixResult<HttpResponse> {
    let limit = query.limit.unwrap_or(100);
    let mut leads = state.live_batch();
    leads.truncate(limit);

    let predictions = match state.pipeline.predict(&leads) {
        Ok(p) => p,
        Err(e) => {
            warn!("Scoring live leads failed: {}", e);
            return Ok(error_response(&e));
        }
    };

    let mut rows = Vec::with_capacity(leads.len());
    for (lead, prediction) in leads.into_iter().zip(predictions) {
        let mut row = lead.into_map();
        row.insert("predicted_status".to_string(), prediction.predicted_status.into());
        row.insert("confidence_score".to_string(), prediction.confidence_score.into());
        row.insert(
            "probabilities".to_string(),
            serde_json::to_value(prediction.probabilities)?,
        );
        rows.push(serde_json::Value::Object(row));
    }

    Ok(HttpResponse::Ok().json(rows))
}

async fn get_model_stats(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    let model = match state.pipeline.model() {
        Ok(m) => m,
        Err(e) => return Ok(error_response(&e)),
    };
    let evaluation = model.evaluation();

    Ok(HttpResponse::Ok().json(ModelStats {
        accuracy: evaluation.accuracy,
        classes: evaluation.classes.clone(),
        confusion_matrix: evaluation.confusion_matrix.clone(),
        classification_report: evaluation.classification_report.clone(),
        trained_at: model.trained_at(),
        training_records: model.training_records(),
        schema_version: model.schema().version,
        feature_count: model.schema().num_features(),
    }))
}

async fn get_stats(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(dashboard_stats(&state.live_batch())))
}

fn dashboard_stats(leads: &[LeadRecord]) -> DashboardStats {
    let text = |lead: &LeadRecord, field: &str| {
        lead.get(field).and_then(|v| v.as_str()).unwrap_or_default().to_string()
    };

    let mut industry_distribution = BTreeMap::new();
    let mut conversion_by_source = BTreeMap::new();
    let mut won = 0usize;
    let mut deal_total = 0.0;

    for lead in leads {
        *industry_distribution.entry(text(lead, "industry")).or_insert(0) += 1;

        if lead.label().map(|l| l == WON_STATUS).unwrap_or(false) {
            won += 1;
            deal_total += lead.get("deal_value_usd").and_then(|v| v.as_f64()).unwrap_or(0.0);
            *conversion_by_source.entry(text(lead, "lead_source")).or_insert(0) += 1;
        }
    }

    let conversion_rate = if leads.is_empty() {
        0.0
    } else {
        won as f64 / leads.len() as f64 * 100.0
    };
    let avg_deal_value = if won == 0 { 0.0 } else { deal_total / won as f64 };

    DashboardStats {
        total_leads: leads.len(),
        conversion_rate: round2(conversion_rate),
        avg_deal_value: round2(avg_deal_value),
        industry_distribution,
        conversion_by_source,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
