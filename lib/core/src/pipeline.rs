use crate::classifier::{argmax, LogisticRegression, SolverConfig};
use crate::features::{FeatureMatrix, FeatureSchema};
use crate::metrics::Evaluation;
use crate::record::LeadRecord;
use crate::split::stratified_split;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for training
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    /// Share of records held out for evaluation
    pub test_fraction: f64,
    /// Seed for the stratified split
    pub random_state: u64,
    pub solver: SolverConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            random_state: 42,
            solver: SolverConfig::default(),
        }
    }
}

/// Feature preparation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareMode {
    /// Learn a fresh schema from the batch and extract labels
    Train,
    /// Project onto the trained schema
    Infer,
}

/// Output of feature preparation
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub matrix: FeatureMatrix,
    /// The schema `matrix` follows
    pub schema: Arc<FeatureSchema>,
    /// Target labels, Train mode only
    pub labels: Option<Vec<String>>,
}

/// Score for one lead
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionResult {
    pub predicted_status: String,
    /// Probability of `predicted_status`
    pub confidence_score: f64,
    /// Probability per class, summing to 1
    pub probabilities: BTreeMap<String, f64>,
}

/// Everything produced by one training run
///
/// Never mutated after construction; retraining builds a new one.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    schema: Arc<FeatureSchema>,
    classifier: LogisticRegression,
    evaluation: Evaluation,
    trained_at: DateTime<Utc>,
    training_records: usize,
}

impl TrainedModel {
    /// Learn schema and classifier from labeled records
    pub fn fit(records: &[LeadRecord], config: &TrainingConfig) -> Result<Self> {
        let prepared = prepare_train(records)?;
        let labels = prepared.labels.unwrap_or_default();

        let classes: Vec<String> = labels.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        if classes.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "at least 2 label classes are needed, found {}",
                classes.len()
            )));
        }
        let targets: Vec<usize> = labels
            .iter()
            .map(|label| classes.partition_point(|c| c < label))
            .collect();

        let split = stratified_split(&targets, &classes, config.test_fraction, config.random_state)?;
        let pick = |rows: &[usize]| rows.iter().map(|&i| targets[i]).collect::<Vec<_>>();

        let train_x = prepared.matrix.select_rows(&split.train);
        let classifier = LogisticRegression::fit(
            train_x.values(),
            &pick(&split.train),
            classes.clone(),
            &config.solver,
        )?;
        debug!(
            iterations = classifier.n_iter(),
            converged = classifier.converged(),
            "classifier fitted"
        );

        let test_x = prepared.matrix.select_rows(&split.test);
        let predicted = classifier.predict(test_x.values())?;
        let evaluation = Evaluation::compute(&classes, &pick(&split.test), &predicted);

        Ok(Self {
            schema: prepared.schema,
            classifier,
            evaluation,
            trained_at: Utc::now(),
            training_records: records.len(),
        })
    }

    /// Score records, in input order
    pub fn predict(&self, records: &[LeadRecord]) -> Result<Vec<PredictionResult>> {
        let matrix = self.schema.transform(records)?;
        let probs = self.classifier.predict_proba(matrix.values())?;
        let classes = self.classifier.classes();

        Ok(probs
            .rows()
            .into_iter()
            .map(|row| {
                let best = argmax(row.iter().copied());
                PredictionResult {
                    predicted_status: classes[best].clone(),
                    confidence_score: row[best],
                    probabilities: classes.iter().cloned().zip(row.iter().copied()).collect(),
                }
            })
            .collect())
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn training_records(&self) -> usize {
        self.training_records
    }
}

/// Train-once, predict-many scoring pipeline
///
/// The trained state is a single [`TrainedModel`] snapshot. Readers clone
/// the `Arc` under a short read lock and work on it unlocked, so they see
/// either the previous model or the new one, never a mix. Training runs are
/// serialized: a second call waits for the first to finish.
pub struct ScoringPipeline {
    config: TrainingConfig,
    model: RwLock<Option<Arc<TrainedModel>>>,
    training: Mutex<()>,
}

impl Default for ScoringPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringPipeline {
    pub fn new() -> Self {
        Self::with_config(TrainingConfig::default())
    }

    pub fn with_config(config: TrainingConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
            training: Mutex::new(()),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_some()
    }

    /// Current model snapshot
    #[inline]
    pub fn model(&self) -> Result<Arc<TrainedModel>> {
        self.model.read().clone().ok_or(Error::ModelNotReady)
    }

    /// Turn records into a feature matrix
    ///
    /// Train mode learns a new schema from `records` without touching the
    /// stored model. Infer mode needs a trained model.
    pub fn prepare(&self, records: &[LeadRecord], mode: PrepareMode) -> Result<PreparedBatch> {
        match mode {
            PrepareMode::Train => prepare_train(records),
            PrepareMode::Infer => {
                let schema = self.model()?.schema.clone();
                let matrix = schema.transform(records)?;
                Ok(PreparedBatch { matrix, schema, labels: None })
            }
        }
    }

    /// Train on labeled records and swap in the result
    ///
    /// On error the previous model, if any, stays in place.
    pub fn train(&self, records: &[LeadRecord]) -> Result<Evaluation> {
        let _guard = self.training.lock();
        info!("Training lead scoring model on {} records", records.len());

        let model = TrainedModel::fit(records, &self.config)?;
        let evaluation = model.evaluation.clone();
        info!(
            "Model trained with accuracy: {:.4} ({} features, {} classes)",
            evaluation.accuracy,
            model.schema.num_features(),
            model.classes().len()
        );

        *self.model.write() = Some(Arc::new(model));
        Ok(evaluation)
    }

    /// Score records with the current model
    pub fn predict(&self, records: &[LeadRecord]) -> Result<Vec<PredictionResult>> {
        let model = self.model()?;
        debug!(records = records.len(), "scoring batch");
        model.predict(records)
    }

    /// Held-out metrics of the current model
    pub fn evaluation(&self) -> Result<Evaluation> {
        Ok(self.model()?.evaluation.clone())
    }
}

fn prepare_train(records: &[LeadRecord]) -> Result<PreparedBatch> {
    let labels = records
        .iter()
        .map(LeadRecord::label)
        .collect::<Result<Vec<_>>>()?;
    let schema = Arc::new(FeatureSchema::fit(records)?);
    let matrix = schema.transform(records)?;
    Ok(PreparedBatch {
        matrix,
        schema,
        labels: Some(labels),
    })
}
