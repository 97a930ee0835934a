//! In-process nearest-neighbor index over unit vectors.
//!
//! Two layouts behind one enum: exact brute-force scan for small corpora and
//! an inverted-file (coarse k-means) layout above `FLAT_SEARCH_LIMIT`
//! records. Scores are inner products, which equal cosine similarity because
//! every stored vector and every query is normalized to unit length first.

use serde::{Deserialize, Serialize};

/// Corpus size at which search switches from exact scan to clustered search.
/// Below it the layout choice is purely a performance matter; rankings are
/// identical either way.
pub const FLAT_SEARCH_LIMIT: usize = 10_000;

/// Clustered-search probe width. One cluster per query keeps lookups cheap;
/// the coarse centroids decide which cluster that is.
const DEFAULT_NPROBE: usize = 1;

const KMEANS_ITERATIONS: usize = 10;

/// Cluster count for a corpus of `count` vectors.
pub fn nlist_for(count: usize) -> usize {
    (count / 100).clamp(1, 100)
}

/// Scale a vector to unit length in place. Zero vectors stay zero.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vector {
            *val /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Rank `(row, score)` pairs by score descending; ties break on row order so
/// a rebuilt or reloaded index always ranks identically.
fn sort_hits(hits: &mut Vec<(usize, f32)>, k: usize) {
    hits.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    hits.truncate(k);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VectorIndex {
    Flat(FlatIndex),
    Ivf(IvfIndex),
}

impl VectorIndex {
    /// Build the layout appropriate for the corpus size. `vectors` must
    /// already be unit length.
    pub fn build(vectors: Vec<Vec<f32>>, dimension: usize) -> Self {
        if vectors.len() < FLAT_SEARCH_LIMIT {
            VectorIndex::Flat(FlatIndex::new(vectors, dimension))
        } else {
            let nlist = nlist_for(vectors.len());
            VectorIndex::Ivf(IvfIndex::build(vectors, dimension, nlist))
        }
    }

    /// Top-`k` rows by inner product, descending. The query must be unit
    /// length; an unnormalized query silently produces wrong rankings.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        match self {
            VectorIndex::Flat(flat) => flat.search(query, k),
            VectorIndex::Ivf(ivf) => ivf.search(query, k),
        }
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        match self {
            VectorIndex::Flat(flat) => flat.vectors.len(),
            VectorIndex::Ivf(ivf) => ivf.vectors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        match self {
            VectorIndex::Flat(flat) => flat.dimension,
            VectorIndex::Ivf(ivf) => ivf.dimension,
        }
    }
}

/// Exact search: score every vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(vectors: Vec<Vec<f32>>, dimension: usize) -> Self {
        Self { dimension, vectors }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, vec)| (row, dot(query, vec)))
            .collect();
        sort_hits(&mut hits, k);
        hits
    }
}

/// Inverted-file search: vectors are binned under coarse k-means centroids
/// at build time, and a query scans only the closest bins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfIndex {
    dimension: usize,
    nprobe: usize,
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<u32>>,
    vectors: Vec<Vec<f32>>,
}

impl IvfIndex {
    /// Train centroids, then bin every vector. Training must finish before
    /// any vector is inserted; bins only exist once centroids do.
    pub fn build(vectors: Vec<Vec<f32>>, dimension: usize, nlist: usize) -> Self {
        let nlist = nlist.clamp(1, vectors.len().max(1));
        let centroids = train_centroids(&vectors, dimension, nlist);

        let mut lists: Vec<Vec<u32>> = vec![Vec::new(); centroids.len()];
        for (row, vec) in vectors.iter().enumerate() {
            let cluster = nearest_centroid(&centroids, vec);
            lists[cluster].push(row as u32);
        }

        Self {
            dimension,
            nprobe: DEFAULT_NPROBE,
            centroids,
            lists,
            vectors,
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut ranked_lists: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(cluster, centroid)| (cluster, dot(query, centroid)))
            .collect();
        ranked_lists.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut hits = Vec::new();
        for &(cluster, _) in ranked_lists.iter().take(self.nprobe.max(1)) {
            for &row in &self.lists[cluster] {
                let row = row as usize;
                hits.push((row, dot(query, &self.vectors[row])));
            }
        }
        sort_hits(&mut hits, k);
        hits
    }
}

/// Deterministic k-means over unit vectors: seeds are evenly spaced rows,
/// assignment is by inner product, means are renormalized each round. An
/// empty cluster keeps its previous centroid.
fn train_centroids(vectors: &[Vec<f32>], dimension: usize, nlist: usize) -> Vec<Vec<f32>> {
    if vectors.is_empty() {
        return vec![vec![0.0; dimension]];
    }

    let mut centroids: Vec<Vec<f32>> = (0..nlist)
        .map(|i| vectors[i * vectors.len() / nlist].clone())
        .collect();

    for _ in 0..KMEANS_ITERATIONS {
        let mut sums: Vec<Vec<f32>> = vec![vec![0.0; dimension]; nlist];
        let mut counts = vec![0usize; nlist];

        for vec in vectors {
            let cluster = nearest_centroid(&centroids, vec);
            counts[cluster] += 1;
            for (sum_val, &val) in sums[cluster].iter_mut().zip(vec) {
                *sum_val += val;
            }
        }

        for (cluster, sum) in sums.iter_mut().enumerate() {
            if counts[cluster] == 0 {
                continue;
            }
            for val in sum.iter_mut() {
                *val /= counts[cluster] as f32;
            }
            normalize_l2(sum);
            centroids[cluster] = sum.clone();
        }
    }

    centroids
}

fn nearest_centroid(centroids: &[Vec<f32>], vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (cluster, centroid) in centroids.iter().enumerate() {
        let score = dot(vector, centroid);
        if score > best_score {
            best = cluster;
            best_score = score;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(mut v: Vec<f32>) -> Vec<f32> {
        normalize_l2(&mut v);
        v
    }

    #[test]
    fn small_corpus_gets_flat_layout() {
        let vectors = vec![unit(vec![1.0, 0.0]), unit(vec![0.0, 1.0])];
        let index = VectorIndex::build(vectors, 2);
        assert!(matches!(index, VectorIndex::Flat(_)));
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), 2);
    }

    #[test]
    fn nlist_tracks_corpus_size() {
        assert_eq!(nlist_for(10_000), 100);
        assert_eq!(nlist_for(5_000), 50);
        assert_eq!(nlist_for(1_000_000), 100);
        assert_eq!(nlist_for(50), 1);
    }

    #[test]
    fn flat_search_ranks_by_inner_product() {
        let vectors = vec![
            unit(vec![1.0, 0.0, 0.0]),
            unit(vec![0.8, 0.6, 0.0]),
            unit(vec![0.0, 1.0, 0.0]),
        ];
        let index = VectorIndex::build(vectors, 3);

        let hits = index.search(&unit(vec![1.0, 0.0, 0.0]), 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 0);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].0, 1);
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn search_never_exceeds_k_and_handles_large_k() {
        let vectors = vec![unit(vec![1.0, 0.0]), unit(vec![0.0, 1.0])];
        let index = VectorIndex::build(vectors, 2);

        assert_eq!(index.search(&unit(vec![1.0, 0.0]), 1).len(), 1);
        assert_eq!(index.search(&unit(vec![1.0, 0.0]), 100).len(), 2);
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let index = VectorIndex::build(Vec::new(), 4);
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn clustered_search_finds_vectors_in_the_probed_cluster() {
        // Two clearly separated clusters around e1 and e2.
        let vectors = vec![
            unit(vec![1.0, 0.05, 0.0]),
            unit(vec![1.0, -0.05, 0.0]),
            unit(vec![0.98, 0.1, 0.0]),
            unit(vec![0.05, 1.0, 0.0]),
            unit(vec![-0.05, 1.0, 0.0]),
            unit(vec![0.1, 0.98, 0.0]),
        ];
        let index = IvfIndex::build(vectors, 3, 2);

        let hits = index.search(&unit(vec![1.0, 0.0, 0.0]), 2);
        assert_eq!(hits.len(), 2);
        for (row, score) in &hits {
            assert!(*row < 3, "expected a row from the e1 cluster, got {row}");
            assert!(*score > 0.9);
        }
    }

    #[test]
    fn clustered_build_is_deterministic() {
        let vectors: Vec<Vec<f32>> = (0..40)
            .map(|i| unit(vec![(i % 7) as f32 + 0.5, (i % 3) as f32 + 0.5, 1.0]))
            .collect();

        let a = IvfIndex::build(vectors.clone(), 3, 4);
        let b = IvfIndex::build(vectors, 3, 4);
        let query = unit(vec![2.0, 1.0, 1.0]);
        assert_eq!(a.search(&query, 5), b.search(&query, 5));
    }

    #[test]
    fn ties_break_on_row_order() {
        let vectors = vec![
            unit(vec![0.0, 1.0]),
            unit(vec![1.0, 0.0]),
            unit(vec![1.0, 0.0]),
        ];
        let index = VectorIndex::build(vectors, 2);

        let hits = index.search(&unit(vec![1.0, 0.0]), 3);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 2);
        assert_eq!(hits[2].0, 0);
    }

    #[test]
    fn index_survives_serialization() {
        let vectors = vec![
            unit(vec![1.0, 0.0]),
            unit(vec![0.6, 0.8]),
            unit(vec![0.0, 1.0]),
        ];
        let index = VectorIndex::build(vectors, 2);
        let query = unit(vec![0.9, 0.1]);
        let before = index.search(&query, 3);

        let json = serde_json::to_string(&index).unwrap();
        let restored: VectorIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.search(&query, 3), before);
    }

    #[test]
    fn normalize_l2_produces_unit_vectors() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize_l2(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }
}
