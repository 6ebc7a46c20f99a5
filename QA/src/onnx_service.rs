// Extractive question answering with a SQuAD-style encoder exported to ONNX.
use crate::answer_service::QuestionAnswerer;
use crate::models::{Answer, QaModelConfig};
use anyhow::{Context, Result};
use ort::{
    inputs,
    session::builder::GraphOptimizationLevel,
    session::Session,
    value::Value,
};
use std::ops::Range;
use std::sync::Mutex;
use tokenizers::tokenizer::Tokenizer;

/// Questions longer than this many tokens are cut, leaving room for context.
const MAX_QUESTION_TOKENS: usize = 64;

pub struct OnnxAnswerer {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    cls_id: u32,
    sep_id: u32,
    uses_token_type_ids: bool,
    max_seq_len: usize,
    doc_stride: usize,
    max_answer_len: usize,
}

/// Best span of one window, in window-local token indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanScore {
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

impl OnnxAnswerer {
    pub fn load(config: &QaModelConfig) -> Result<Self> {
        log::info!("Loading QA model from {}", config.model_path.display());
        validate_windowing(config.max_seq_len, config.doc_stride)?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?
            .commit_from_file(&config.model_path)
            .with_context(|| format!("failed to load QA model {}", config.model_path.display()))?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to load tokenizer {}: {}",
                config.tokenizer_path.display(),
                e
            )
        })?;
        // Windowing is done here, not by the tokenizer.
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("failed to disable truncation: {}", e))?;
        tokenizer.with_padding(None);

        let special = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|token| tokenizer.token_to_id(token))
                .ok_or_else(|| anyhow::anyhow!("tokenizer has none of {:?}", candidates))
        };
        let cls_id = special(&["[CLS]", "<s>"])?;
        let sep_id = special(&["[SEP]", "</s>"])?;

        log::info!(
            "QA model loaded ({} inputs, token_type_ids: {})",
            session.inputs.len(),
            uses_token_type_ids
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            cls_id,
            sep_id,
            uses_token_type_ids,
            max_seq_len: config.max_seq_len,
            doc_stride: config.doc_stride,
            max_answer_len: config.max_answer_len.max(1),
        })
    }

    /// Runs one `[CLS] question [SEP] window [SEP]` sequence and returns the
    /// start/end logits of the window's tokens.
    fn run_window(&self, question_ids: &[u32], window_ids: &[u32]) -> Result<(Vec<f32>, Vec<f32>)> {
        let mut ids: Vec<i64> = Vec::with_capacity(question_ids.len() + window_ids.len() + 3);
        ids.push(self.cls_id as i64);
        ids.extend(question_ids.iter().map(|&id| id as i64));
        ids.push(self.sep_id as i64);
        let context_offset = ids.len();
        ids.extend(window_ids.iter().map(|&id| id as i64));
        ids.push(self.sep_id as i64);

        let seq_len = ids.len();
        let type_ids: Vec<i64> = (0..seq_len)
            .map(|i| if i < context_offset { 0 } else { 1 })
            .collect();

        let input_ids = Value::from_array(([1_usize, seq_len], ids.into_boxed_slice()))?;
        let attention_mask = Value::from_array((
            [1_usize, seq_len],
            vec![1_i64; seq_len].into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("QA model session lock poisoned"))?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids = Value::from_array(([1_usize, seq_len], type_ids.into_boxed_slice()))?;
            session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])?
        } else {
            session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])?
        };

        let (_, start_logits) = outputs[0].try_extract_tensor::<f32>()?;
        let (_, end_logits) = outputs[1].try_extract_tensor::<f32>()?;

        let window = context_offset..context_offset + window_ids.len();
        if start_logits.len() < window.end || end_logits.len() < window.end {
            return Err(anyhow::anyhow!(
                "model returned {} logits for a sequence of {}",
                start_logits.len(),
                seq_len
            ));
        }

        Ok((
            start_logits[window.clone()].to_vec(),
            end_logits[window].to_vec(),
        ))
    }
}

impl QuestionAnswerer for OnnxAnswerer {
    fn answer(&self, question: &str, context: &str) -> Result<Answer> {
        let question_enc = self
            .tokenizer
            .encode(question, false)
            .map_err(|e| anyhow::anyhow!("failed to tokenize question: {}", e))?;
        let context_enc = self
            .tokenizer
            .encode(context, false)
            .map_err(|e| anyhow::anyhow!("failed to tokenize context: {}", e))?;

        let question_ids = &question_enc.get_ids()[..question_enc.len().min(MAX_QUESTION_TOKENS)];
        let context_ids = context_enc.get_ids();
        let offsets = context_enc.get_offsets();

        let window_len = self.max_seq_len - question_ids.len() - 3;
        let windows = plan_windows(context_ids.len(), window_len, self.doc_stride);
        if windows.is_empty() {
            return Err(anyhow::anyhow!("context produced no tokens"));
        }
        log::debug!(
            "Answering over {} context tokens in {} window(s)",
            context_ids.len(),
            windows.len()
        );

        let mut best: Option<(usize, usize, f32)> = None;
        for window in windows {
            let (start_logits, end_logits) =
                self.run_window(question_ids, &context_ids[window.clone()])?;
            let span = best_span(
                &softmax(&start_logits),
                &softmax(&end_logits),
                self.max_answer_len,
            );
            if let Some(span) = span {
                if best.map_or(true, |(_, _, score)| span.score > score) {
                    best = Some((window.start + span.start, window.start + span.end, span.score));
                }
            }
        }

        let (first, last, score) = best.ok_or_else(|| anyhow::anyhow!("model produced no answer span"))?;
        let start = offsets[first].0;
        let end = offsets[last].1.max(start);
        let answer = context.get(start..end).unwrap_or_default().trim().to_string();

        Ok(Answer {
            answer,
            score,
            start,
            end,
        })
    }

    fn backend_name(&self) -> &'static str {
        "onnx"
    }
}

/// Checks that every window has room for context and that consecutive windows
/// advance by more than the overlap. The smallest window is the one left after
/// a question of `MAX_QUESTION_TOKENS` tokens.
pub fn validate_windowing(max_seq_len: usize, doc_stride: usize) -> Result<()> {
    let min_window = max_seq_len.saturating_sub(MAX_QUESTION_TOKENS + 3);
    if min_window == 0 {
        return Err(anyhow::anyhow!(
            "max sequence length {} leaves no room for context",
            max_seq_len
        ));
    }
    if doc_stride >= min_window {
        return Err(anyhow::anyhow!(
            "document stride {} must be smaller than the context window ({} tokens for max sequence length {})",
            doc_stride,
            min_window,
            max_seq_len
        ));
    }
    Ok(())
}

/// Token ranges covering `total` tokens in windows of `window` tokens, each
/// overlapping the previous one by `stride` tokens.
pub fn plan_windows(total: usize, window: usize, stride: usize) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    if total == 0 || window == 0 {
        return windows;
    }

    let step = window.saturating_sub(stride).max(1);
    let mut start = 0;
    loop {
        let end = (start + window).min(total);
        windows.push(start..end);
        if end == total {
            break;
        }
        start += step;
    }
    windows
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|x| x / sum).collect()
    } else {
        exps
    }
}

/// Highest `p(start) * p(end)` over spans with `start <= end` no longer than
/// `max_len` tokens.
pub fn best_span(start_probs: &[f32], end_probs: &[f32], max_len: usize) -> Option<SpanScore> {
    let len = start_probs.len().min(end_probs.len());
    let mut best: Option<SpanScore> = None;

    for start in 0..len {
        for end in start..(start + max_len).min(len) {
            let score = start_probs[start] * end_probs[end];
            if best.map_or(true, |b| score > b.score) {
                best = Some(SpanScore { start, end, score });
            }
        }
    }
    best
}
