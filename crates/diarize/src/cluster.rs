// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Centroid-linkage hierarchical agglomerative clustering, ported
//! line-for-line from the cut-point search over `scipy`'s
//! `linkage(..., method="centroid")` / `fcluster(..., criterion="distance")`:
//! build the full dendrogram, cut it at the configured distance threshold,
//! and if the resulting "large cluster" count misses `[min_speakers,
//! max_speakers]`, re-rank every merge step's distance by closeness to the
//! threshold and re-cut at whichever merge gets the cluster count closest to
//! the target (exact match preferred, ties broken by smallest distance
//! delta, then by earliest iteration).
//!
//! No `scipy`-equivalent crate is part of this stack, and the cut-point
//! search needs direct access to per-iteration merge order and distances
//! that a black-box clustering API would not expose, so the dendrogram is
//! an explicit struct built by hand rather than a call into an external
//! clustering crate.

/// One step of the dendrogram: clusters `a` and `b` (leaf indices belonging
/// to each, at the time of the merge) were joined at `distance`, forming a
/// new cluster containing `members`.
#[derive(Debug, Clone)]
pub struct Merge {
    pub iteration: usize,
    pub distance: f64,
    pub members_a: Vec<usize>,
    pub members_b: Vec<usize>,
    pub members: Vec<usize>,
}

/// L2-normalizes each row in place, treating an all-zero row as already
/// normalized (no division by zero, no NaN propagation), per spec §4.4
/// step 3.
pub fn l2_normalize_rows(embeddings: &mut [Vec<f64>]) {
    for row in embeddings {
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in row.iter_mut() {
                *v /= norm;
            }
        }
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();
    let na = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let nb = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        1.0
    } else {
        1.0 - dot / (na * nb)
    }
}

fn centroid(embeddings: &[Vec<f64>], members: &[usize]) -> Vec<f64> {
    let dims = embeddings[0].len();
    let mut sum = vec![0.0; dims];
    for &i in members {
        for (d, v) in embeddings[i].iter().enumerate() {
            sum[d] += v;
        }
    }
    let n = members.len() as f64;
    for v in &mut sum {
        *v /= n;
    }
    sum
}

/// Builds the full centroid-linkage dendrogram over `n` L2-normalized
/// embeddings (`n - 1` merges). Returns an empty vec if `n < 2`.
#[must_use]
pub fn centroid_linkage(embeddings: &[Vec<f64>]) -> Vec<Merge> {
    let n = embeddings.len();
    if n < 2 {
        return Vec::new();
    }

    let mut active: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut merges = Vec::with_capacity(n - 1);

    for iteration in 0.. {
        if active.len() < 2 {
            break;
        }

        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..active.len() {
            let ci = centroid(embeddings, &active[i]);
            for j in (i + 1)..active.len() {
                let cj = centroid(embeddings, &active[j]);
                let d = euclidean(&ci, &cj);
                if best.is_none_or(|(_, _, bd)| d < bd) {
                    best = Some((i, j, d));
                }
            }
        }

        let Some((i, j, distance)) = best else { break };
        let members_a = active[i].clone();
        let members_b = active[j].clone();
        let mut members = members_a.clone();
        members.extend_from_slice(&members_b);

        // remove the higher index first so the lower index stays valid
        active.remove(j);
        active.remove(i);
        active.push(members.clone());

        merges.push(Merge { iteration, distance, members_a, members_b, members });
    }

    merges
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Cuts the dendrogram at `cut`: any merge with `distance <= cut` joins its
/// two clusters. Returns one cluster id per original leaf (`0..n`), dense
/// but not necessarily contiguous from 0.
#[must_use]
pub fn cut_at_distance(n: usize, merges: &[Merge], cut: f64) -> Vec<usize> {
    let mut uf = UnionFind::new(n);
    for merge in merges {
        if merge.distance <= cut {
            if let (Some(&a0), Some(&b0)) = (merge.members_a.first(), merge.members_b.first()) {
                for &x in &merge.members_a {
                    uf.union(a0, x);
                }
                for &x in &merge.members_b {
                    uf.union(b0, x);
                }
                uf.union(a0, b0);
            }
        }
    }
    (0..n).map(|i| uf.find(i)).collect()
}

fn large_cluster_count(labels: &[usize], min_cluster_size: usize) -> usize {
    let mut sizes = std::collections::HashMap::new();
    for &l in labels {
        *sizes.entry(l).or_insert(0usize) += 1;
    }
    sizes.values().filter(|&&size| size >= min_cluster_size).count()
}

/// Implements spec §4.4 step 4: cut at `threshold`, and if the resulting
/// large-cluster count misses `[min_speakers, max_speakers]`, search every
/// merge's distance for the cut that gets closest to the implied target
/// (exact match preferred; ties broken by smallest `|distance - threshold|`,
/// then earliest iteration).
#[must_use]
pub fn cut_for_speaker_bounds(
    n: usize,
    merges: &[Merge],
    threshold: f64,
    min_cluster_size: usize,
    min_speakers: usize,
    max_speakers: usize,
) -> Vec<usize> {
    let provisional = cut_at_distance(n, merges, threshold);
    let k = large_cluster_count(&provisional, min_cluster_size);

    let target = if k < min_speakers {
        min_speakers
    } else if k > max_speakers {
        max_speakers
    } else {
        return provisional;
    };

    let mut best: Option<(usize, f64, usize)> = None; // (count_delta-ranked win, abs_diff, iteration)
    let mut best_cut = provisional;

    for merge in merges {
        let candidate = cut_at_distance(n, merges, merge.distance);
        let count = large_cluster_count(&candidate, min_cluster_size);
        let exact = count == target;
        let count_delta = count.abs_diff(target);
        let abs_diff = (merge.distance - threshold).abs();

        let is_better = match best {
            None => true,
            Some((best_delta, best_abs_diff, best_iter)) => {
                let best_exact = best_delta == 0;
                if exact && !best_exact {
                    true
                } else if !exact && best_exact {
                    false
                } else if count_delta != best_delta {
                    count_delta < best_delta
                } else if (abs_diff - best_abs_diff).abs() > f64::EPSILON {
                    abs_diff < best_abs_diff
                } else {
                    merge.iteration < best_iter
                }
            },
        };

        if is_better {
            best = Some((count_delta, abs_diff, merge.iteration));
            best_cut = candidate;
        }
    }

    best_cut
}

/// Reassigns members of any cluster smaller than `min_cluster_size` to the
/// nearest large cluster's centroid by cosine distance (spec §4.4 step 5).
/// If no large cluster exists, labels are left unchanged.
pub fn reassign_small_clusters(embeddings: &[Vec<f64>], labels: &mut [usize], min_cluster_size: usize) {
    let mut by_label: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
    for (i, &l) in labels.iter().enumerate() {
        by_label.entry(l).or_default().push(i);
    }

    let large: Vec<(usize, Vec<f64>)> = by_label
        .iter()
        .filter(|(_, members)| members.len() >= min_cluster_size)
        .map(|(&label, members)| (label, centroid(embeddings, members)))
        .collect();

    if large.is_empty() {
        return;
    }

    for (&label, members) in &by_label {
        if members.len() >= min_cluster_size {
            continue;
        }
        for &i in members {
            let nearest = large
                .iter()
                .min_by(|(_, ca), (_, cb)| {
                    cosine_distance(&embeddings[i], ca).total_cmp(&cosine_distance(&embeddings[i], cb))
                })
                .expect("large is non-empty");
            labels[i] = nearest.0;
        }
        let _ = label;
    }
}

/// Densely relabels cluster ids to `speaker_0..speaker_{K-1}` in order of
/// first appearance across the original segment sequence (spec §4.4 step 6).
#[must_use]
pub fn relabel_by_first_appearance(labels: &[usize]) -> Vec<String> {
    let mut order = Vec::new();
    for &l in labels {
        if !order.contains(&l) {
            order.push(l);
        }
    }
    labels
        .iter()
        .map(|l| {
            let k = order.iter().position(|o| o == l).expect("label was recorded in order");
            format!("발언자_{k}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> Vec<f64> {
        vec![x, y]
    }

    #[test]
    fn l2_normalize_leaves_zero_row_untouched() {
        let mut rows = vec![vec![0.0, 0.0], vec![3.0, 4.0]];
        l2_normalize_rows(&mut rows);
        assert_eq!(rows[0], vec![0.0, 0.0]);
        assert!((rows[1][0] - 0.6).abs() < 1e-9);
        assert!((rows[1][1] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn centroid_linkage_produces_n_minus_one_merges() {
        let embeddings = vec![point(0.0, 0.0), point(0.1, 0.0), point(5.0, 5.0), point(5.1, 5.0)];
        let merges = centroid_linkage(&embeddings);
        assert_eq!(merges.len(), embeddings.len() - 1);
    }

    #[test]
    fn two_tight_pairs_cut_into_two_clusters() {
        let embeddings = vec![point(0.0, 0.0), point(0.1, 0.0), point(5.0, 5.0), point(5.1, 5.0)];
        let merges = centroid_linkage(&embeddings);
        let labels = cut_at_distance(4, &merges, 1.0);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn speaker_bound_search_respects_max_speakers() {
        let embeddings = vec![point(0.0, 0.0), point(1.0, 0.0), point(2.0, 0.0), point(3.0, 0.0)];
        let merges = centroid_linkage(&embeddings);
        let labels = cut_for_speaker_bounds(4, &merges, 100.0, 1, 1, 2);
        let distinct = large_cluster_count(&labels, 1);
        assert!(distinct <= 2);
    }

    #[test]
    fn relabel_preserves_first_appearance_order() {
        let labels = vec![7, 7, 3, 3, 9];
        let relabeled = relabel_by_first_appearance(&labels);
        assert_eq!(relabeled, vec!["발언자_0", "발언자_0", "발언자_1", "발언자_1", "발언자_2"]);
    }

    #[test]
    fn reassign_small_clusters_merges_singleton_into_nearest_large() {
        let embeddings = vec![point(0.0, 0.0), point(0.1, 0.0), point(0.2, 0.0), point(10.0, 10.0)];
        let mut labels = vec![0, 0, 0, 1];
        reassign_small_clusters(&embeddings, &mut labels, 2);
        assert_eq!(labels[3], 0);
    }
}
