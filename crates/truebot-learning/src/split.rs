//! Seeded stratified train/test partitioning.
//!
//! The test partition receives `ceil(test_size * n)` rows. That count is
//! shared between classes in proportion to their size using the largest
//! remainder method, then each class is shuffled with a seeded RNG and its
//! first rows go to the test side. Every class keeps at least one row in the
//! training partition.

use crate::error::{LearningError, Result};
use crate::types::Label;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Row indices of the two partitions, each in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition `labels` into train and test row indices.
///
/// # Errors
///
/// - [`LearningError::EmptyCorpus`] if `labels` is empty
/// - [`LearningError::InvalidData`] if only one class is present, a class has
///   fewer than two rows, or either partition would be empty
pub fn stratified_split(labels: &[Label], test_size: f64, seed: u64) -> Result<Split> {
    let n = labels.len();
    if n == 0 {
        return Err(LearningError::EmptyCorpus);
    }

    let classes = [Label::Fake, Label::Real];
    let members: Vec<Vec<usize>> = classes
        .iter()
        .map(|class| {
            labels
                .iter()
                .enumerate()
                .filter(|(_, l)| *l == class)
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    if members.iter().any(Vec::is_empty) {
        return Err(LearningError::InvalidData(format!(
            "stratified split needs both classes, found only {} {} rows",
            n,
            labels[0]
        )));
    }
    for (class, rows) in classes.iter().zip(&members) {
        if rows.len() < 2 {
            return Err(LearningError::InvalidData(format!(
                "class {class} has {} row(s), at least 2 are needed to stratify",
                rows.len()
            )));
        }
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(LearningError::InvalidData(format!(
            "test_size {test_size} leaves an empty partition for {n} rows"
        )));
    }

    let sizes: Vec<usize> = members.iter().map(Vec::len).collect();
    let per_class = allocate(&sizes, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::with_capacity(n - n_test),
        test: Vec::with_capacity(n_test),
    };
    for (mut rows, take) in members.into_iter().zip(per_class) {
        rows.shuffle(&mut rng);
        split.test.extend_from_slice(&rows[..take]);
        split.train.extend_from_slice(&rows[take..]);
    }
    split.train.sort_unstable();
    split.test.sort_unstable();

    debug!(
        "Stratified split: {} train rows, {} test rows",
        split.train.len(),
        split.test.len()
    );

    Ok(split)
}

/// Share `total` among classes of the given sizes, proportionally.
///
/// Each class gets at most `size - 1`, so it keeps a training row.
fn allocate(sizes: &[usize], total: usize) -> Vec<usize> {
    let n: usize = sizes.iter().sum();
    let ideal: Vec<f64> = sizes
        .iter()
        .map(|&size| total as f64 * size as f64 / n as f64)
        .collect();

    let mut counts: Vec<usize> = ideal
        .iter()
        .zip(sizes)
        .map(|(&x, &size)| (x.floor() as usize).min(size - 1))
        .collect();

    // Largest fractional remainder first; ties go to the lower class index.
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = ideal[a] - ideal[a].floor();
        let rb = ideal[b] - ideal[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    let mut remaining = total.saturating_sub(counts.iter().sum());
    while remaining > 0 {
        let mut progressed = false;
        for &class in &order {
            if remaining == 0 {
                break;
            }
            if counts[class] < sizes[class] - 1 {
                counts[class] += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    counts
}
