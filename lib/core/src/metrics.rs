//! Held-out evaluation: accuracy, confusion matrix, classification report
//!
//! Classes are always listed in the classifier's (sorted) class order.
//! Ratios with a zero denominator are reported as 0.

use serde::Serialize;
use std::collections::BTreeMap;

/// Precision, recall and F1 for one class or one average
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class metrics plus aggregate rows
///
/// Serializes to a flat map: one key per class label, then `accuracy`,
/// `macro avg` and `weighted avg`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassificationReport {
    #[serde(flatten)]
    pub classes: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

/// Everything measured on the held-out subset after training
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Evaluation {
    pub accuracy: f64,
    /// Row and column order of the confusion matrix
    pub classes: Vec<String>,
    /// `confusion_matrix[true][predicted]`
    pub confusion_matrix: Vec<Vec<usize>>,
    pub classification_report: ClassificationReport,
}

impl Evaluation {
    pub fn compute(classes: &[String], y_true: &[usize], y_pred: &[usize]) -> Self {
        let matrix = confusion_matrix(y_true, y_pred, classes.len());
        let report = ClassificationReport::from_confusion(classes, &matrix);
        Self {
            accuracy: accuracy(y_true, y_pred),
            classes: classes.to_vec(),
            confusion_matrix: matrix,
            classification_report: report,
        }
    }
}

/// Fraction of matching labels
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Count table indexed by `[true class][predicted class]`
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        matrix[t][p] += 1;
    }
    matrix
}

impl ClassificationReport {
    pub fn from_confusion(classes: &[String], matrix: &[Vec<usize>]) -> Self {
        let k = classes.len();
        let total: usize = matrix.iter().flatten().sum();
        let correct: usize = (0..k).map(|i| matrix[i][i]).sum();

        let per_class: Vec<ClassMetrics> = (0..k)
            .map(|i| {
                let tp = matrix[i][i] as f64;
                let support: usize = matrix[i].iter().sum();
                let predicted: usize = matrix.iter().map(|row| row[i]).sum();
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                ClassMetrics {
                    precision,
                    recall,
                    f1_score: ratio(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let macro_avg = average(&per_class, |_| 1.0, total);
        let weighted_avg = average(&per_class, |m| m.support as f64, total);

        Self {
            classes: classes.iter().cloned().zip(per_class).collect(),
            accuracy: ratio(correct as f64, total as f64),
            macro_avg,
            weighted_avg,
        }
    }
}

fn average(rows: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64, support: usize) -> ClassMetrics {
    let total_weight: f64 = rows.iter().map(&weight).sum();
    let mean = |f: fn(&ClassMetrics) -> f64| {
        ratio(rows.iter().map(|m| f(m) * weight(m)).sum(), total_weight)
    };
    ClassMetrics {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1_score: mean(|m| m.f1_score),
        support,
    }
}

#[inline]
fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["Closed-Lost".into(), "Closed-Won".into(), "Disqualified".into()]
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 1], &[0, 1, 1, 1]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let m = confusion_matrix(&[0, 0, 1, 2], &[0, 1, 1, 0], 3);
        assert_eq!(m, vec![vec![1, 1, 0], vec![0, 1, 0], vec![1, 0, 0]]);
    }

    #[test]
    fn test_report_values() {
        let y_true = [0, 0, 0, 1, 1, 2];
        let y_pred = [0, 0, 1, 1, 1, 0];
        let eval = Evaluation::compute(&labels(), &y_true, &y_pred);

        let lost = eval.classification_report.classes["Closed-Lost"];
        assert!((lost.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((lost.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(lost.support, 3);

        // never predicted, never right
        let disq = eval.classification_report.classes["Disqualified"];
        assert_eq!(disq.precision, 0.0);
        assert_eq!(disq.f1_score, 0.0);

        assert!((eval.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(eval.classification_report.weighted_avg.support, 6);
    }

    #[test]
    fn test_report_json_shape() {
        let eval = Evaluation::compute(&labels(), &[0, 1, 2], &[0, 1, 2]);
        let json = serde_json::to_value(&eval.classification_report).unwrap();

        for key in ["Closed-Lost", "Closed-Won", "Disqualified", "macro avg", "weighted avg"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["accuracy"], 1.0);
        assert_eq!(json["Closed-Won"]["f1-score"], 1.0);
    }
}
