use crate::answer_service::QuestionAnswerer;
use crate::models::Answer;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// Sentence-level answering without a model: the sentence sharing the most
/// IDF-weighted terms with the question wins.
#[derive(Debug, Default)]
pub struct KeywordAnswerer;

struct Sentence<'a> {
    start: usize,
    text: &'a str,
    terms: HashSet<String>,
}

impl KeywordAnswerer {
    pub fn new() -> Self {
        Self
    }

    /// `context` should already have gone through `unwrap_lines`.
    fn split_sentences<'a>(&self, context: &'a str) -> Vec<Sentence<'a>> {
        context
            .split_sentence_bound_indices()
            .filter_map(|(idx, raw)| {
                let text = raw.trim();
                if text.is_empty() {
                    return None;
                }
                let leading = raw.len() - raw.trim_start().len();
                Some(Sentence {
                    start: idx + leading,
                    text,
                    terms: tokenize(text).into_iter().collect(),
                })
            })
            .collect()
    }
}

impl QuestionAnswerer for KeywordAnswerer {
    fn answer(&self, question: &str, context: &str) -> Result<Answer> {
        let unwrapped = unwrap_lines(context);
        let sentences = self.split_sentences(&unwrapped);
        if sentences.is_empty() {
            return Err(anyhow::anyhow!("context contains no sentences"));
        }

        let mut doc_frequencies: HashMap<&str, usize> = HashMap::new();
        for sentence in &sentences {
            for term in &sentence.terms {
                *doc_frequencies.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let total = sentences.len() as f32;
        let question_terms: HashSet<String> = tokenize(question).into_iter().collect();
        let idf = |term: &str| {
            let df = doc_frequencies.get(term).copied().unwrap_or(0) as f32;
            (1.0 + total / (df + 1.0)).ln()
        };
        let max_score: f32 = question_terms.iter().map(|t| idf(t)).sum();

        let mut best = (0usize, 0.0f32);
        for (i, sentence) in sentences.iter().enumerate() {
            let score: f32 = question_terms
                .iter()
                .filter(|t| sentence.terms.contains(*t))
                .map(|t| idf(t))
                .sum();
            if score > best.1 {
                best = (i, score);
            }
        }

        let chosen = &sentences[best.0];
        let score = if max_score > 0.0 { best.1 / max_score } else { 0.0 };
        Ok(Answer {
            answer: chosen.text.to_string(),
            score,
            start: chosen.start,
            end: chosen.start + chosen.text.len(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "keyword"
    }
}

/// Joins lines wrapped inside a paragraph: a line break not followed by a
/// blank line becomes a space. Only ASCII bytes are swapped, so byte offsets
/// into the result are valid offsets into `text`.
fn unwrap_lines(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    while i < bytes.len() {
        if !matches!(bytes[i], b'\n' | b'\r') {
            i += 1;
            continue;
        }
        let run_start = i;
        let mut newlines = 0;
        while i < bytes.len() && matches!(bytes[i], b'\n' | b'\r' | b' ' | b'\t') {
            if bytes[i] == b'\n' {
                newlines += 1;
            }
            i += 1;
        }
        if newlines <= 1 {
            for b in &mut out[run_start..i] {
                if matches!(*b, b'\n' | b'\r') {
                    *b = b' ';
                }
            }
        }
    }
    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|word| word.chars().count() > 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = "Bananas are yellow.\nThe capital of France is Paris.\nThe Nile is the longest river in Africa.";

    #[test]
    fn picks_sentence_containing_the_answer() {
        let answer = KeywordAnswerer::new()
            .answer("What is the capital of France?", CONTEXT)
            .unwrap();

        assert_eq!(answer.answer, "The capital of France is Paris.");
        assert_eq!(&CONTEXT[answer.start..answer.end], answer.answer);
        assert!(answer.score > 0.5 && answer.score <= 1.0, "score {}", answer.score);
    }

    #[test]
    fn rarer_terms_outweigh_common_ones() {
        let answer = KeywordAnswerer::new()
            .answer("Which river is the longest?", CONTEXT)
            .unwrap();
        assert!(answer.answer.contains("Nile"));
    }

    #[test]
    fn no_overlap_returns_first_sentence_with_zero_score() {
        let answer = KeywordAnswerer::new().answer("Who wrote Hamlet?", CONTEXT).unwrap();
        assert_eq!(answer.answer, "Bananas are yellow.");
        assert_eq!(answer.score, 0.0);
        assert_eq!(answer.start, 0);
    }

    #[test]
    fn wrapped_sentence_is_answered_whole() {
        let context = "Bananas are yellow. The capital of France is\nParis, a city on the Seine.\n\nRivers flow.";
        let answer = KeywordAnswerer::new()
            .answer("What is the capital of France?", context)
            .unwrap();

        assert_eq!(answer.answer, "The capital of France is Paris, a city on the Seine.");
        assert_eq!(
            context[answer.start..answer.end].replace('\n', " "),
            answer.answer
        );
    }

    #[test]
    fn blank_lines_still_separate_paragraphs() {
        assert_eq!(unwrap_lines("a\nb\r\nc"), "a b  c");
        assert_eq!(unwrap_lines("Heading\n\nBody"), "Heading\n\nBody");
        assert_eq!(unwrap_lines("x \n \ny"), "x \n \ny");
    }

    #[test]
    fn empty_context_is_an_error() {
        assert!(KeywordAnswerer::new().answer("anything?", "  \n ").is_err());
    }
}
