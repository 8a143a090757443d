// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Feature-hashing embedder.
//!
//! Not a language model. Each token and each of its character trigrams is
//! hashed (FNV-1a) into one of `dimension` slots with a ±1 sign, and the sum
//! is L2-normalized. Texts sharing words or word pieces land close together,
//! which is enough to exercise vector retrieval end to end, deterministically.

use async_trait::async_trait;

use crate::error::{KhojError, Result};
use crate::retrieval::EmbeddingProvider;
use crate::util::normalize::normalized_tokens;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Trigram features weigh less than whole tokens.
const TRIGRAM_WEIGHT: f32 = 0.5;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model: String,
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model: format!("hashing-{dimension}"),
            dimension,
        }
    }

    /// Synchronous form, for indexing.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return v;
        }
        for token in normalized_tokens(text) {
            self.add_feature(&mut v, token.as_bytes(), 1.0);
            let padded: Vec<char> = format!("#{token}#").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut v, gram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    fn add_feature(&self, v: &mut [f32], bytes: &[u8], weight: f32) {
        let h = fnv1a(bytes);
        let slot = (h % self.dimension as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[slot] += sign * weight;
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.dimension == 0 {
            return Err(KhojError::config("embedding dimension is 0"));
        }
        Ok(self.embed_text(text))
    }
}

/// Cosine similarity. Zero vectors score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}
