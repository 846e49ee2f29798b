//! Extractive summarizer
//!
//! Ranks sentences by the normalized frequency of their content words and
//! keeps the best ones, in original order, within the length budget. Runs
//! entirely on CPU with no downloaded weights; the only optional artifact
//! is a stop-word list in the model directory.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::model::{ModelLoader, ModelOutput, Summarizer};
use super::InferenceError;

static SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("sentence pattern"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9']+").expect("word pattern"));

const BUILTIN_STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has",
    "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just",
    "me", "more", "my", "no", "not", "of", "on", "or", "our", "out", "she", "so", "some",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "to",
    "up", "us", "was", "we", "were", "what", "when", "which", "who", "will", "with", "would",
    "you", "your",
];

/// Loads [`ExtractiveSummarizer`], reading the stop-word list if one is configured
pub struct ExtractiveLoader {
    name: String,
    stopwords_path: Option<PathBuf>,
}

impl ExtractiveLoader {
    pub fn new(name: impl Into<String>, stopwords_path: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            stopwords_path,
        }
    }
}

impl ModelLoader for ExtractiveLoader {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Arc<dyn Summarizer>, InferenceError> {
        let stopwords = match &self.stopwords_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    InferenceError::Load(format!("stop-word list {:?}: {}", path, e))
                })?;
                let words: HashSet<String> = content
                    .lines()
                    .map(|l| l.trim().to_lowercase())
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .collect();
                info!("Loaded {} stop words from {:?}", words.len(), path);
                words
            }
            None => BUILTIN_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        };

        Ok(Arc::new(ExtractiveSummarizer { stopwords }))
    }
}

pub struct ExtractiveSummarizer {
    stopwords: HashSet<String>,
}

impl ExtractiveSummarizer {
    fn content_words(&self, sentence: &str) -> Vec<String> {
        WORD.find_iter(sentence)
            .map(|m| m.as_str().to_lowercase())
            .filter(|w| w.chars().count() > 2 && !self.stopwords.contains(w))
            .collect()
    }
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<ModelOutput, InferenceError> {
        let sentences: Vec<&str> = SENTENCE
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect();

        if sentences.is_empty() {
            return Err(InferenceError::Inference("no sentences in input".into()));
        }
        if max_length == 0 {
            return Err(InferenceError::Inference("max_length must be positive".into()));
        }

        let words: Vec<Vec<String>> = sentences.iter().map(|s| self.content_words(s)).collect();

        let mut freq: HashMap<&str, f64> = HashMap::new();
        for word in words.iter().flatten() {
            *freq.entry(word.as_str()).or_insert(0.0) += 1.0;
        }
        let peak = freq.values().cloned().fold(0.0_f64, f64::max);

        let scores: Vec<f64> = words
            .iter()
            .map(|ws| {
                if ws.is_empty() || peak == 0.0 {
                    0.0
                } else {
                    ws.iter().map(|w| freq[w.as_str()] / peak).sum::<f64>() / ws.len() as f64
                }
            })
            .collect();

        // best first; ties keep document order
        let mut ranked: Vec<usize> = (0..sentences.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let mut chosen: Vec<usize> = Vec::new();
        let mut used = 0usize;
        for &idx in &ranked {
            let len = sentences[idx].chars().count();
            let sep = if chosen.is_empty() { 0 } else { 1 };
            if used + sep + len > max_length {
                continue;
            }
            chosen.push(idx);
            used += sep + len;
            if used >= min_length {
                break;
            }
        }

        let summary_text = if chosen.is_empty() {
            // no sentence fits: cut the best one at the budget
            let best = sentences[ranked[0]];
            best.chars().take(max_length).collect::<String>().trim_end().to_string()
        } else {
            chosen.sort_unstable();
            chosen
                .iter()
                .map(|&i| sentences[i])
                .collect::<Vec<_>>()
                .join(" ")
        };

        debug!(
            sentences = sentences.len(),
            chosen = chosen.len(),
            "extractive summary built"
        );

        Ok(ModelOutput {
            summary_text,
            score: None,
        })
    }
}
