//! Voice enrollment: a fixed script of five lines, each captured and
//! embedded into the speaker's profile.

use tracing::{info, warn};

use verbatim_core::error::{Result, VerbatimError};
use verbatim_core::types::AudioClip;
use verbatim_store::SpeakerStore;

use crate::router::SpeakerRouter;

/// The five lines a speaker reads during enrollment: a pangram pair, two
/// quote-shaped requests, and a number line, chosen for phonetic spread.
pub const ENROLL_PROMPTS: [&str; 5] = [
    "The quick brown fox jumps over the lazy dog. Pack my box with five dozen liquor jugs.",
    "Common sense is a deposit of prejudices laid down before eighteen.",
    "Find me the quote Common sense is actually nothing more than a deposit of prejudices laid down in the mind prior to the age of eighteen.",
    "Has Albert Einstein said this quote, One of the sure signs of maturity is the ability to rise to the point of self criticism",
    "Numbers matter: three, five, seven, nine and forty two.",
];

impl SpeakerRouter {
    /// Enroll (or extend) a speaker profile from captured samples.
    ///
    /// Each sample is embedded and appended to both the durable store and
    /// the in-memory registry. A sample that fails to embed is logged and
    /// skipped; the flow aborts only when the embedding provider is
    /// unavailable or no sample survived. Returns the number of samples
    /// actually enrolled.
    pub fn enroll(
        &self,
        store: &SpeakerStore,
        name: &str,
        samples: &[AudioClip],
    ) -> Result<usize> {
        if !self.enabled() {
            return Err(VerbatimError::ProviderUnavailable(
                "speaker identification is disabled".to_string(),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(VerbatimError::Speaker("enrollment needs a name".to_string()));
        }

        let mut enrolled = 0usize;
        for (idx, clip) in samples.iter().enumerate() {
            let embedding = match self.embedder().embed(clip) {
                Ok(e) => e,
                Err(e) => {
                    warn!(sample = idx + 1, error = %e, "Enrollment sample failed; skipping");
                    continue;
                }
            };
            store.append_embedding(name, embedding.clone())?;
            self.with_registry_mut(|r| r.add_sample(name, embedding))
                .ok_or_else(|| VerbatimError::Speaker("registry lock poisoned".to_string()))?;
            enrolled += 1;
        }

        if enrolled == 0 {
            return Err(VerbatimError::EnrollmentSample(format!(
                "no usable samples for '{name}'"
            )));
        }
        info!(name, enrolled, "Speaker enrolled");
        Ok(enrolled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use verbatim_core::config::SpeakerConfig;
    use verbatim_core::error::Result;
    use verbatim_core::providers::{EmbeddingProvider, NullEmbedding};

    use crate::profile::SpeakerRegistry;

    /// Embeds the first three samples; fails on clips marked with a
    /// negative first sample.
    struct HeadEmbedder;

    impl EmbeddingProvider for HeadEmbedder {
        fn embed(&self, clip: &AudioClip) -> Result<Vec<f32>> {
            match clip.samples.first() {
                Some(x) if *x >= 0.0 => Ok(clip.samples[..3].to_vec()),
                _ => Err(VerbatimError::Speaker("bad sample".to_string())),
            }
        }
        fn dim(&self) -> usize {
            3
        }
    }

    fn clip(head: [f32; 3]) -> AudioClip {
        let mut samples = vec![0.0f32; 16_000];
        samples[..3].copy_from_slice(&head);
        AudioClip::new(samples, 16_000)
    }

    fn store() -> (tempfile::TempDir, SpeakerStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SpeakerStore::new(dir.path().join("speakers.json"));
        (dir, store)
    }

    #[test]
    fn test_prompt_script_has_five_lines() {
        assert_eq!(ENROLL_PROMPTS.len(), 5);
        assert!(ENROLL_PROMPTS.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_enroll_appends_to_store_and_registry() {
        let (_dir, store) = store();
        let router = SpeakerRouter::new(
            SpeakerRegistry::default(),
            Arc::new(HeadEmbedder),
            SpeakerConfig::default(),
        );
        let samples = vec![clip([1.0, 0.0, 0.0]), clip([0.9, 0.1, 0.0])];
        let count = router.enroll(&store, "Alice", &samples).unwrap();
        assert_eq!(count, 2);
        assert!(router.is_registered("Alice"));
        assert!(store.contains("Alice").unwrap());
    }

    #[test]
    fn test_failed_sample_is_skipped() {
        let (_dir, store) = store();
        let router = SpeakerRouter::new(
            SpeakerRegistry::default(),
            Arc::new(HeadEmbedder),
            SpeakerConfig::default(),
        );
        let samples = vec![clip([-1.0, 0.0, 0.0]), clip([1.0, 0.0, 0.0])];
        let count = router.enroll(&store, "Bob", &samples).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_all_samples_failing_is_an_error() {
        let (_dir, store) = store();
        let router = SpeakerRouter::new(
            SpeakerRegistry::default(),
            Arc::new(HeadEmbedder),
            SpeakerConfig::default(),
        );
        let samples = vec![clip([-1.0, 0.0, 0.0])];
        let err = router.enroll(&store, "Bob", &samples).unwrap_err();
        assert!(matches!(err, VerbatimError::EnrollmentSample(_)));
    }

    #[test]
    fn test_unavailable_provider_aborts() {
        let (_dir, store) = store();
        let router = SpeakerRouter::new(
            SpeakerRegistry::default(),
            Arc::new(NullEmbedding),
            SpeakerConfig::default(),
        );
        let err = router.enroll(&store, "Bob", &[clip([1.0, 0.0, 0.0])]).unwrap_err();
        assert!(matches!(err, VerbatimError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_blank_name_rejected() {
        let (_dir, store) = store();
        let router = SpeakerRouter::new(
            SpeakerRegistry::default(),
            Arc::new(HeadEmbedder),
            SpeakerConfig::default(),
        );
        let err = router.enroll(&store, "   ", &[clip([1.0, 0.0, 0.0])]).unwrap_err();
        assert!(matches!(err, VerbatimError::Speaker(_)));
    }
}
