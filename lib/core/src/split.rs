//! Stratified train/test split
//!
//! Each class contributes to the held-out subset in proportion to its size.
//! Per-class quotas are assigned by largest remainder, then nudged so every
//! class keeps at least one row on each side. Rows inside a class are
//! shuffled with a seeded RNG, so identical input yields identical splits.

use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of the two subsets, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows by class
///
/// `targets[i]` is the class index of row `i` into `classes`.
pub fn stratified_split(
    targets: &[usize],
    classes: &[String],
    test_fraction: f64,
    seed: u64,
) -> Result<StratifiedSplit> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(Error::InsufficientData(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); classes.len()];
    for (row, &class) in targets.iter().enumerate() {
        groups[class].push(row);
    }

    if let Some((class, group)) = groups.iter().enumerate().find(|(_, g)| g.len() < 2) {
        return Err(Error::InsufficientData(format!(
            "class '{}' has {} record(s), at least 2 are needed to stratify",
            classes[class],
            group.len()
        )));
    }

    let n = targets.len();
    let n_test = (test_fraction * n as f64 - 1e-9).ceil() as usize;
    let n_train = n - n_test;
    if n_test < classes.len() || n_train < classes.len() {
        return Err(Error::InsufficientData(format!(
            "{} records cannot be split into train ({}) and test ({}) subsets covering {} classes",
            n,
            n_train,
            n_test,
            classes.len()
        )));
    }

    let counts: Vec<usize> = groups.iter().map(Vec::len).collect();
    let quotas = allocate(&counts, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (mut group, quota) in groups.into_iter().zip(quotas) {
        group.shuffle(&mut rng);
        test.extend_from_slice(&group[..quota]);
        train.extend_from_slice(&group[quota..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    Ok(StratifiedSplit { train, test })
}

/// Number of test rows per class, summing to `n_test`, with every class
/// keeping at least one row in each subset.
fn allocate(counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * n_test as f64 / n as f64)
        .collect();
    let mut quotas: Vec<usize> = exact.iter().map(|q| q.floor() as usize).collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });
    let mut remaining = n_test - quotas.iter().sum::<usize>();
    for &class in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        quotas[class] += 1;
        remaining -= 1;
    }

    // Every class needs a test row
    for class in 0..quotas.len() {
        if quotas[class] == 0 {
            if let Some(donor) = (0..quotas.len())
                .filter(|&j| quotas[j] > 1)
                .max_by_key(|&j| quotas[j])
            {
                quotas[donor] -= 1;
                quotas[class] = 1;
            }
        }
    }

    // ...and a train row
    for class in 0..quotas.len() {
        while quotas[class] >= counts[class] {
            let receiver = (0..quotas.len())
                .filter(|&j| j != class && quotas[j] + 1 < counts[j])
                .max_by_key(|&j| counts[j] - quotas[j]);
            match receiver {
                Some(j) => {
                    quotas[class] -= 1;
                    quotas[j] += 1;
                }
                None => break,
            }
        }
    }

    quotas
}
