//! Highlight mirror-tree construction.
//!
//! Given the searched leaf paths and the case-folded query tokens, the
//! builder produces two trees shaped like the original document:
//!
//! - **snippet** holds the searched leaves that matched (plus every leaf of
//!   the full-highlight fields), matched tokens wrapped in the configured
//!   markers and long values trimmed around the matches.
//! - **full** holds every leaf under the requested full-highlight fields,
//!   wrapped but never trimmed.
//!
//! At every array boundary the mirror emits one element per source
//! element; elements that contribute nothing become empty objects so that
//! positions keep lining up with the original array.

use ahash::AHashSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::analysis::Tokenizer;
use crate::document::ID_FIELD;
use crate::error::Result;
use crate::flatten;
use crate::path;

/// Markers and trimming settings for highlighting.
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Opening marker inserted before a matched token.
    pub start_tag: String,
    /// Closing marker inserted after a matched token.
    pub end_tag: String,
    /// Context kept around matches, in tokens per side, when snipping long
    /// values.
    pub snippet_threshold: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            start_tag: "<mark>".to_string(),
            end_tag: "</mark>".to_string(),
            snippet_threshold: 30,
        }
    }
}

/// The highlight block of one search hit.
#[derive(Debug, Clone, Serialize)]
pub struct HighlightResult {
    /// Mirror tree of matched (and full-highlighted) leaves, trimmed.
    pub snippet: Value,
    /// Mirror tree of the full-highlight fields, untrimmed.
    pub full: Value,
    /// Per flattened field name, the distinct tokens that caused
    /// highlights, in first-occurrence order.
    pub meta: Value,
}

impl HighlightResult {
    /// An empty highlight block (used for wildcard queries).
    pub fn empty() -> Self {
        HighlightResult {
            snippet: Value::Object(Map::new()),
            full: Value::Object(Map::new()),
            meta: Value::Object(Map::new()),
        }
    }
}

/// Builds highlight mirror trees for one document at a time.
pub struct HighlightBuilder<'a> {
    config: &'a HighlightConfig,
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> HighlightBuilder<'a> {
    /// Create a builder over the given configuration and tokenizer.
    pub fn new(config: &'a HighlightConfig, tokenizer: &'a dyn Tokenizer) -> Self {
        HighlightBuilder { config, tokenizer }
    }

    /// Build snippet, full and meta for one document.
    ///
    /// `searched` are the bound query leaf paths; `full_fields` the
    /// expanded full-highlight leaf paths; `query_tokens` the case-folded
    /// query terms. The synthetic `id` field is never highlighted.
    pub fn build(
        &self,
        doc: &Map<String, Value>,
        searched: &[String],
        full_fields: &[String],
        query_tokens: &AHashSet<String>,
    ) -> Result<HighlightResult> {
        let mut matched_paths: AHashSet<String> = AHashSet::new();
        let mut meta = Map::new();

        for field_path in searched {
            if field_path == ID_FIELD {
                continue;
            }
            let mut matched_tokens: Vec<String> = Vec::new();
            for value in flatten::leaf_values(doc, field_path) {
                self.collect_matched(value, query_tokens, &mut matched_tokens)?;
            }
            if !matched_tokens.is_empty() {
                matched_paths.insert(field_path.clone());
                let tokens = matched_tokens.into_iter().map(Value::String).collect();
                let mut entry = Map::new();
                entry.insert("matched_tokens".to_string(), Value::Array(tokens));
                meta.insert(field_path.clone(), Value::Object(entry));
            }
        }

        let full_set: AHashSet<String> = full_fields
            .iter()
            .filter(|p| p.as_str() != ID_FIELD)
            .cloned()
            .collect();
        let mut snippet_set = matched_paths;
        snippet_set.extend(full_set.iter().cloned());

        let snippet = Value::Object(self.mirror(doc, "", &snippet_set, true, query_tokens)?);
        let full = if full_set.is_empty() {
            Value::Object(Map::new())
        } else {
            Value::Object(self.mirror(doc, "", &full_set, false, query_tokens)?)
        };

        Ok(HighlightResult {
            snippet,
            full,
            meta: Value::Object(meta),
        })
    }

    /// Descend the document and the include-path set simultaneously.
    fn mirror(
        &self,
        map: &Map<String, Value>,
        base: &str,
        include: &AHashSet<String>,
        trim: bool,
        query_tokens: &AHashSet<String>,
    ) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for (key, value) in map {
            let child_path = if base.is_empty() {
                key.clone()
            } else {
                format!("{base}.{key}")
            };

            if include.contains(&child_path) {
                out.insert(key.clone(), self.highlight_value(value, trim, query_tokens)?);
                continue;
            }
            if !include
                .iter()
                .any(|p| p != &child_path && path::starts_with_path(p, &child_path))
            {
                continue;
            }

            match value {
                Value::Object(child) => {
                    let mirrored = self.mirror(child, &child_path, include, trim, query_tokens)?;
                    if !mirrored.is_empty() {
                        out.insert(key.clone(), Value::Object(mirrored));
                    }
                }
                Value::Array(elements) if path::is_object_array(elements) => {
                    let mut mirrored_elements = Vec::with_capacity(elements.len());
                    let mut any = false;
                    for element in elements {
                        let mirrored = match element {
                            Value::Object(element) => {
                                self.mirror(element, &child_path, include, trim, query_tokens)?
                            }
                            _ => Map::new(),
                        };
                        if !mirrored.is_empty() {
                            any = true;
                        }
                        mirrored_elements.push(Value::Object(mirrored));
                    }
                    if any {
                        out.insert(key.clone(), Value::Array(mirrored_elements));
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Highlight one leaf value. Strings are wrapped (and trimmed when
    /// `trim` is set); string-array elements are wrapped independently;
    /// anything else passes through untouched.
    fn highlight_value(
        &self,
        value: &Value,
        trim: bool,
        query_tokens: &AHashSet<String>,
    ) -> Result<Value> {
        match value {
            Value::String(text) => Ok(Value::String(self.wrap(text, trim, query_tokens)?)),
            Value::Array(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        Value::String(text) => {
                            out.push(Value::String(self.wrap(text, trim, query_tokens)?));
                        }
                        other => out.push(other.clone()),
                    }
                }
                Ok(Value::Array(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Wrap every occurrence of a query token, optionally snipping the
    /// text to `snippet_threshold` tokens of context on each side of the
    /// matches.
    fn wrap(&self, text: &str, trim: bool, query_tokens: &AHashSet<String>) -> Result<String> {
        let tokens = self.tokenizer.tokenize(text)?;
        if tokens.is_empty() {
            return Ok(text.to_string());
        }

        let matched: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| query_tokens.contains(&t.folded()))
            .map(|(i, _)| i)
            .collect();

        let threshold = self.config.snippet_threshold;
        let windowed = trim && tokens.len() > threshold;

        if matched.is_empty() {
            if windowed {
                let cut = threshold.max(1).min(tokens.len()) - 1;
                return Ok(text[..tokens[cut].end_offset].to_string());
            }
            return Ok(text.to_string());
        }

        let (first, last) = if windowed {
            let lo = matched[0].saturating_sub(threshold);
            let hi = (matched[matched.len() - 1] + threshold).min(tokens.len() - 1);
            (lo, hi)
        } else {
            (0, tokens.len() - 1)
        };

        let mut out = String::new();
        let mut cursor = if windowed { tokens[first].start_offset } else { 0 };
        for (i, token) in tokens.iter().enumerate().take(last + 1).skip(first) {
            out.push_str(&text[cursor..token.start_offset]);
            if matched.contains(&i) {
                out.push_str(&self.config.start_tag);
                out.push_str(&token.text);
                out.push_str(&self.config.end_tag);
            } else {
                out.push_str(&token.text);
            }
            cursor = token.end_offset;
        }
        let end = if windowed { tokens[last].end_offset } else { text.len() };
        out.push_str(&text[cursor..end]);
        Ok(out)
    }

    /// Record the original-case form of every query token occurring in the
    /// value, distinct, in first-occurrence order.
    fn collect_matched(
        &self,
        value: &Value,
        query_tokens: &AHashSet<String>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        match value {
            Value::String(text) => {
                for token in self.tokenizer.tokenize(text)? {
                    if query_tokens.contains(&token.folded()) && !out.contains(&token.text) {
                        out.push(token.text);
                    }
                }
            }
            Value::Array(elements) => {
                for element in elements {
                    self.collect_matched(element, query_tokens, out)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
