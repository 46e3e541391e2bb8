//! Speaker profiles: per-identity embedding sets with a unit-normalized
//! centroid, matched by cosine similarity.

use verbatim_core::error::Result;
use verbatim_store::{SpeakerRecords, SpeakerStore};

/// Normalize a vector to unit length; an all-zero vector stays zero.
pub fn unit(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// One enrolled identity. The centroid is the unit-normalized mean of the
/// unit-normalized samples and is recomputed on every push.
#[derive(Debug, Clone)]
pub struct SpeakerProfile {
    pub name: String,
    samples: Vec<Vec<f32>>,
    centroid: Vec<f32>,
}

impl SpeakerProfile {
    pub fn new(name: impl Into<String>, samples: Vec<Vec<f32>>) -> Self {
        let mut profile = Self {
            name: name.into(),
            samples,
            centroid: Vec::new(),
        };
        profile.recompute();
        profile
    }

    fn recompute(&mut self) {
        let dim = self.samples.iter().map(Vec::len).max().unwrap_or(0);
        let mut sum = vec![0.0f32; dim];
        let mut used = 0usize;
        for sample in &self.samples {
            if sample.len() != dim {
                continue;
            }
            for (acc, x) in sum.iter_mut().zip(unit(sample)) {
                *acc += x;
            }
            used += 1;
        }
        if used > 0 {
            for x in &mut sum {
                *x /= used as f32;
            }
        }
        self.centroid = unit(&sum);
    }

    pub fn push(&mut self, sample: Vec<f32>) {
        self.samples.push(sample);
        self.recompute();
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Cosine similarity against an already unit-normalized query.
    pub fn similarity(&self, query_unit: &[f32]) -> f32 {
        dot(&self.centroid, query_unit)
    }
}

/// All enrolled identities, loaded once from the speaker store and kept in
/// sync with it as enrollment adds samples.
#[derive(Debug, Clone, Default)]
pub struct SpeakerRegistry {
    profiles: Vec<SpeakerProfile>,
}

impl SpeakerRegistry {
    pub fn from_records(records: SpeakerRecords) -> Self {
        let profiles = records
            .into_iter()
            .map(|(name, samples)| SpeakerProfile::new(name, samples))
            .collect();
        Self { profiles }
    }

    pub fn load(store: &SpeakerStore) -> Result<Self> {
        Ok(Self::from_records(store.load()?))
    }

    /// Closest enrolled identity by cosine similarity, with its score.
    pub fn best_match(&self, embedding: &[f32]) -> Option<(&str, f32)> {
        let query = unit(embedding);
        self.profiles
            .iter()
            .map(|p| (p.name.as_str(), p.similarity(&query)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn add_sample(&mut self, name: &str, embedding: Vec<f32>) {
        match self.profiles.iter_mut().find(|p| p.name == name) {
            Some(profile) => profile.push(embedding),
            None => self
                .profiles
                .push(SpeakerProfile::new(name, vec![embedding])),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.iter().any(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }
}
