//! Binary decision trees over sparse rows.
//!
//! One builder serves both tree ensembles. What differs between them (how a
//! node is scored, what a leaf predicts, which splits are admissible) lives
//! behind [`SplitCriterion`]. Absent sparse entries are treated as `0.0`.
//!
//! A row goes to the left child when its feature value is `<= threshold`.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Add, Sub};
use truebot_processing::SparseVector;

/// Per-row statistic accumulated over nodes.
pub(crate) trait NodeStats:
    Copy + Default + Add<Output = Self> + Sub<Output = Self>
{
}

impl<T> NodeStats for T where T: Copy + Default + Add<Output = T> + Sub<Output = T> {}

/// How a tree scores candidate splits and what its leaves hold.
pub(crate) trait SplitCriterion {
    type Stats: NodeStats;

    /// Quality of a node; a split gains `score(left) + score(right) - score(parent)`.
    fn score(&self, stats: &Self::Stats) -> f64;

    /// Prediction stored in a leaf.
    fn leaf_value(&self, stats: &Self::Stats) -> f64;

    /// Whether a node with these totals should not be split any further.
    fn is_terminal(&self, _stats: &Self::Stats) -> bool {
        false
    }

    /// Whether a child with these totals is allowed.
    fn valid_child(&self, _stats: &Self::Stats) -> bool {
        true
    }

    /// Whether a split with this gain is worth making.
    fn accepts(&self, gain: f64) -> bool;
}

/// Growth limits shared by all criteria.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    /// `None` grows until leaves are pure or unsplittable.
    pub max_depth: Option<usize>,
    /// Minimum distinct rows a node needs to be split.
    pub min_samples_split: usize,
    /// Features examined per split; `None` examines every non-constant one.
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree over `rows`, restricted to the row indices in `sample`.
    ///
    /// `stats[i]` is the statistic of row `i`; rows outside `sample` are
    /// never read.
    pub fn grow<C, R>(
        data: &[SparseVector],
        stats: &[C::Stats],
        sample: Vec<usize>,
        criterion: &C,
        params: TreeParams,
        rng: &mut R,
    ) -> Self
    where
        C: SplitCriterion,
        R: Rng + ?Sized,
    {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut pending = vec![(0usize, sample, 0usize)];

        while let Some((slot, rows, depth)) = pending.pop() {
            let total = rows
                .iter()
                .fold(C::Stats::default(), |acc, &row| acc + stats[row]);

            let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
            let splittable = !depth_reached
                && rows.len() >= params.min_samples_split
                && !criterion.is_terminal(&total);

            let split = if splittable {
                best_split(data, stats, &rows, total, criterion, params, rng)
            } else {
                None
            };

            match split {
                Some(split) => {
                    let (left_rows, right_rows) = partition(data, &rows, &split);
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes[slot] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };
                    pending.push((right, right_rows, depth + 1));
                    pending.push((left, left_rows, depth + 1));
                }
                None => {
                    nodes[slot] = Node::Leaf {
                        value: criterion.leaf_value(&total),
                    };
                }
            }
        }

        Self { nodes }
    }

    /// Leaf value reached by `row`.
    pub fn predict(&self, row: &SparseVector) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Scale every leaf value by `factor`.
    pub fn scale_leaves(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = self.nodes[idx] {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }

    /// Largest feature index referenced, if any split exists.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    /// Whether every child index points inside the node table and after its
    /// parent, so prediction always terminates.
    pub fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { value } => value.is_finite(),
                Node::Split {
                    left,
                    right,
                    threshold,
                    ..
                } => {
                    *left > idx
                        && *right > idx
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                        && !threshold.is_nan()
                }
            })
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
}

fn best_split<C, R>(
    data: &[SparseVector],
    stats: &[C::Stats],
    rows: &[usize],
    total: C::Stats,
    criterion: &C,
    params: TreeParams,
    rng: &mut R,
) -> Option<Split>
where
    C: SplitCriterion,
    R: Rng + ?Sized,
{
    // Non-zero entries of the node, bucketed by feature.
    let mut entries: HashMap<usize, Vec<(f64, usize)>> = HashMap::new();
    for &row in rows {
        for (feature, value) in data[row].iter() {
            entries.entry(feature).or_default().push((value, row));
        }
    }

    let mut candidates: Vec<usize> = entries
        .iter()
        .filter(|(_, values)| is_non_constant(values, rows.len()))
        .map(|(&feature, _)| feature)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_unstable();

    if let Some(k) = params.max_features {
        if k < candidates.len() {
            let (chosen, _) = candidates.partial_shuffle(rng, k);
            let mut chosen = chosen.to_vec();
            chosen.sort_unstable();
            candidates = chosen;
        }
    }

    let parent_score = criterion.score(&total);
    let mut best: Option<(f64, Split)> = None;

    for feature in candidates {
        let Some(values) = entries.get(&feature) else {
            continue;
        };
        if let Some((gain, threshold)) =
            best_threshold(values, rows.len(), stats, total, parent_score, criterion)
        {
            if best.is_none_or(|(best_gain, _)| gain > best_gain) {
                best = Some((gain, Split { feature, threshold }));
            }
        }
    }

    best.filter(|(gain, _)| criterion.accepts(*gain))
        .map(|(_, split)| split)
}

fn is_non_constant(values: &[(f64, usize)], node_rows: usize) -> bool {
    if values.len() < node_rows {
        return true;
    }
    let first = values[0].0;
    values.iter().any(|(v, _)| *v != first)
}

/// Best threshold on one feature: `(gain, threshold)`.
fn best_threshold<C: SplitCriterion>(
    values: &[(f64, usize)],
    node_rows: usize,
    stats: &[C::Stats],
    total: C::Stats,
    parent_score: f64,
    criterion: &C,
) -> Option<(f64, f64)> {
    let mut sorted: Vec<(f64, C::Stats)> =
        values.iter().map(|&(v, row)| (v, stats[row])).collect();

    // Rows without an entry form one block at value zero.
    if values.len() < node_rows {
        let nonzero = sorted
            .iter()
            .fold(C::Stats::default(), |acc, (_, s)| acc + *s);
        sorted.push((0.0, total - nonzero));
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Merge equal values into groups.
    let mut groups: Vec<(f64, C::Stats)> = Vec::with_capacity(sorted.len());
    for (value, stat) in sorted {
        match groups.last_mut() {
            Some((last, acc)) if *last == value => *acc = *acc + stat,
            _ => groups.push((value, stat)),
        }
    }

    let mut best: Option<(f64, f64)> = None;
    let mut left = C::Stats::default();
    for pair in groups.windows(2) {
        let (low, stat) = pair[0];
        let high = pair[1].0;
        left = left + stat;
        let right = total - left;
        if !criterion.valid_child(&left) || !criterion.valid_child(&right) {
            continue;
        }
        let gain = criterion.score(&left) + criterion.score(&right) - parent_score;
        if best.is_none_or(|(best_gain, _)| gain > best_gain) {
            let mut threshold = low + (high - low) / 2.0;
            if threshold >= high {
                threshold = low;
            }
            best = Some((gain, threshold));
        }
    }
    best
}

fn partition(data: &[SparseVector], rows: &[usize], split: &Split) -> (Vec<usize>, Vec<usize>) {
    rows.iter()
        .copied()
        .partition(|&row| data[row].get(split.feature) <= split.threshold)
}
