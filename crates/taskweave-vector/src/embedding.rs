use async_trait::async_trait;
use std::collections::HashMap;
use taskweave_core::{TaskweaveError, TaskweaveResult};

/// Trait for computing text embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector for a single text.
    async fn embed(&self, text: &str) -> TaskweaveResult<Vec<f32>>;

    /// Dimension of the vectors produced by this provider.
    fn dimension(&self) -> usize;
}

/// Local term-frequency embedding over hashed word positions.
///
/// Stands in for the external embedding model: deterministic, no network,
/// good enough for relative similarity between task descriptions.
pub struct HashedEmbedding {
    dimension: usize,
}

impl HashedEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashedEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashedEmbedding {
    async fn embed(&self, text: &str) -> TaskweaveResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(TaskweaveError::Vector("Cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 1)
            .collect();

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        let total = words.len() as f32;
        if total == 0.0 {
            return Ok(vector);
        }

        // Each word contributes at three hashed positions with decaying
        // weight, which spreads collisions across the vector.
        for (word, count) in &freq {
            let tf = count / total;
            for (salt, weight) in [(0u8, 1.0f32), (1, 0.7), (2, 0.5)] {
                let mut bytes = word.as_bytes().to_vec();
                bytes.push(salt);
                let slot = fnv1a(&bytes) as usize % self.dimension;
                vector[slot] += tf * weight;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Cosine similarity between two vectors of equal length.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_dimension() {
        let emb = HashedEmbedding::new(128);
        let v = emb.embed("decompose the quarterly report").await.unwrap();
        assert_eq!(v.len(), 128);
    }

    #[tokio::test]
    async fn test_embedding_normalized() {
        let emb = HashedEmbedding::default();
        let v = emb.embed("research competitor pricing models").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_similar_tasks_score_higher() {
        let emb = HashedEmbedding::default();
        let a = emb.embed("research market trends for electric cars").await.unwrap();
        let b = emb.embed("research market data for electric vehicles").await.unwrap();
        let c = emb.embed("bake a chocolate birthday cake").await.unwrap();

        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[tokio::test]
    async fn test_embedding_deterministic() {
        let emb = HashedEmbedding::default();
        let v1 = emb.embed("same input").await.unwrap();
        let v2 = emb.embed("same input").await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let emb = HashedEmbedding::default();
        assert!(emb.embed("   ").await.is_err());
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        let v = vec![1.0, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
    }
}
