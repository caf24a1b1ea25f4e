//! Clip suggestions from the language-model service.
//!
//! Suggestion happens in two stages. The first picks clip boundaries from the
//! timestamped transcript, the second writes a hook line and a score for each
//! boundary. Both stages return free-form model text, so everything here is
//! lenient: JSON is dug out of the text, numbers may arrive as strings, and a
//! failed hook stage only costs the hooks.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use kclip_models::candidate::{FALLBACK_HOOK, FALLBACK_REASON, FALLBACK_SCORE};
use kclip_models::timestamp::parse_seconds;
use kclip_models::{ClipCandidate, DurationPolicy};

use crate::error::{WorkerError, WorkerResult};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```json|```").expect("code fence pattern"));

static OUTERMOST_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\{[\s\S]*\}|\[[\s\S]*\])").expect("outermost json pattern"));

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("trailing comma pattern"));

const SNIPPET_CHARS: usize = 200;

/// The language-model collaborator.
#[async_trait]
pub trait ClipSuggester: Send + Sync {
    /// Raw model text holding `[{start, end, reason}]` in source seconds.
    async fn select_boundaries(
        &self,
        transcript: &str,
        policy: &DurationPolicy,
        max_clips: usize,
    ) -> WorkerResult<String>;

    /// Raw model text holding `[{start, hook, score}]` for `boundaries`.
    async fn enrich_hooks(&self, boundaries: &Value) -> WorkerResult<String>;
}

/// Replays stored model output.
///
/// Without separate hook output the boundary text answers both stages, so
/// entries that already carry `hook` and `score` keep them.
#[derive(Debug, Clone)]
pub struct StaticSuggester {
    boundaries: String,
    hooks: Option<String>,
}

impl StaticSuggester {
    pub fn new(boundaries: impl Into<String>) -> Self {
        Self {
            boundaries: boundaries.into(),
            hooks: None,
        }
    }

    pub fn with_hooks(mut self, hooks: impl Into<String>) -> Self {
        self.hooks = Some(hooks.into());
        self
    }

    pub async fn from_file(path: &Path) -> WorkerResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            WorkerError::invalid_request(format!(
                "cannot read model output {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new(text))
    }
}

#[async_trait]
impl ClipSuggester for StaticSuggester {
    async fn select_boundaries(
        &self,
        _transcript: &str,
        _policy: &DurationPolicy,
        _max_clips: usize,
    ) -> WorkerResult<String> {
        Ok(self.boundaries.clone())
    }

    async fn enrich_hooks(&self, _boundaries: &Value) -> WorkerResult<String> {
        Ok(self.hooks.clone().unwrap_or_else(|| self.boundaries.clone()))
    }
}

/// Pull the JSON value out of raw model text.
///
/// Markdown fences are dropped and the outermost object or array is parsed.
/// A second attempt strips trailing commas.
pub fn extract_json(text: &str) -> WorkerResult<Value> {
    if text.trim().is_empty() {
        return Err(WorkerError::suggestion("empty model response"));
    }

    let cleaned = CODE_FENCE.replace_all(text, "");
    let cleaned = cleaned.trim();
    let candidate = OUTERMOST_JSON
        .find(cleaned)
        .map(|m| m.as_str())
        .unwrap_or(cleaned);

    if let Ok(value) = serde_json::from_str(candidate) {
        return Ok(value);
    }

    let repaired = TRAILING_COMMA.replace_all(candidate, "$1");
    serde_json::from_str(&repaired).map_err(|e| {
        let snippet: String = text.chars().take(SNIPPET_CHARS).collect();
        WorkerError::suggestion(format!(
            "model response is not valid JSON ({}): {}...",
            e, snippet
        ))
    })
}

/// Lenient number: a JSON number or a numeric (or clock) string.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_seconds(s).ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn text(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Pair each boundary with its hook entry by equal `start` and rank by score.
///
/// Missing hook data falls back to defaults. Boundaries without a usable
/// `start` and `end` are dropped. The sort is stable, so equal scores keep
/// the model's order.
pub fn merge_candidates(base: &Value, styled: &Value) -> Vec<ClipCandidate> {
    let Some(base) = base.as_array() else {
        return Vec::new();
    };
    let styled = styled.as_array().map(Vec::as_slice).unwrap_or(&[]);

    let mut merged: Vec<ClipCandidate> = base
        .iter()
        .filter_map(|entry| {
            let (Some(start), Some(end)) = (number(entry.get("start")), number(entry.get("end")))
            else {
                warn!(entry = %entry, "Skipping suggestion without usable start/end");
                return None;
            };

            let style = styled
                .iter()
                .find(|s| number(s.get("start")) == Some(start));

            Some(
                ClipCandidate::new(start, end)
                    .with_reason(text(entry.get("reason")).unwrap_or(FALLBACK_REASON))
                    .with_hook(
                        style
                            .and_then(|s| text(s.get("hook")))
                            .unwrap_or(FALLBACK_HOOK),
                    )
                    .with_score(
                        style
                            .and_then(|s| number(s.get("score")))
                            .unwrap_or(FALLBACK_SCORE),
                    ),
            )
        })
        .collect();

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged
}

/// Run both suggestion stages and return ranked candidates.
///
/// An empty result is not an error here; the caller decides.
pub async fn suggest_candidates(
    suggester: &dyn ClipSuggester,
    transcript: &str,
    policy: &DurationPolicy,
    max_clips: usize,
) -> WorkerResult<Vec<ClipCandidate>> {
    let raw = suggester
        .select_boundaries(transcript, policy, max_clips)
        .await?;
    let base = extract_json(&raw)?;
    if base.as_array().map_or(true, Vec::is_empty) {
        return Ok(Vec::new());
    }

    let styled = match suggester.enrich_hooks(&base).await {
        Ok(raw) => extract_json(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Hook output unusable, using fallbacks");
            Value::Null
        }),
        Err(e) => {
            warn!(error = %e, "Hook stage failed, using fallbacks");
            Value::Null
        }
    };

    let candidates = merge_candidates(&base, &styled);
    debug!(count = candidates.len(), "Merged clip suggestions");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_fenced_json() {
        let value = extract_json("```json\n[{\"start\": 1, \"end\": 2}]\n```").unwrap();
        assert_eq!(value, json!([{"start": 1, "end": 2}]));
    }

    #[test]
    fn test_extract_from_prose() {
        let value =
            extract_json("Sure! Here are the clips:\n{\"clips\": [1, 2]}\nHope this helps.").unwrap();
        assert_eq!(value, json!({"clips": [1, 2]}));
    }

    #[test]
    fn test_extract_repairs_trailing_commas() {
        let value = extract_json("[{\"start\": 1, \"end\": 2,}, ]").unwrap();
        assert_eq!(value, json!([{"start": 1, "end": 2}]));
    }

    #[test]
    fn test_extract_garbage_reports_snippet() {
        let err = extract_json("I could not find any good clips").unwrap_err();
        assert_eq!(err.kind(), "suggestion");
        assert!(err.to_string().contains("I could not find any good clips..."));

        assert_eq!(extract_json("  \n").unwrap_err().kind(), "suggestion");
    }

    #[test]
    fn test_merge_pairs_by_start_and_sorts() {
        let base = json!([
            {"start": 10, "end": 40, "reason": "setup"},
            {"start": "60", "end": "01:30", "reason": "payoff"},
            {"start": 120, "end": 150}
        ]);
        let styled = json!([
            {"start": 60.0, "hook": "The payoff", "score": "0.9"},
            {"start": 10, "hook": "  ", "score": 0.7}
        ]);

        let merged = merge_candidates(&base, &styled);
        assert_eq!(merged.len(), 3);

        assert_eq!((merged[0].start, merged[0].end), (60.0, 90.0));
        assert_eq!(merged[0].hook, "The payoff");
        assert_eq!(merged[0].score, 0.9);

        assert_eq!(merged[1].start, 10.0);
        assert_eq!(merged[1].hook, FALLBACK_HOOK);
        assert_eq!(merged[1].reason, "setup");

        assert_eq!(merged[2].start, 120.0);
        assert_eq!(merged[2].reason, FALLBACK_REASON);
        assert_eq!(merged[2].score, FALLBACK_SCORE);
    }

    #[test]
    fn test_merge_is_stable_for_equal_scores() {
        let base = json!([
            {"start": 30, "end": 60},
            {"start": 10, "end": 40},
            {"start": 20, "end": 50}
        ]);
        let starts: Vec<f64> = merge_candidates(&base, &json!("not a list"))
            .iter()
            .map(|c| c.start)
            .collect();
        assert_eq!(starts, vec![30.0, 10.0, 20.0]);
    }

    #[test]
    fn test_merge_rejects_unusable_base() {
        assert!(merge_candidates(&json!({"start": 1}), &json!([])).is_empty());
        let merged = merge_candidates(&json!([{"start": "soon", "end": 5}, "x"]), &json!([]));
        assert!(merged.is_empty());
    }

    struct BrokenHooks;

    #[async_trait]
    impl ClipSuggester for BrokenHooks {
        async fn select_boundaries(
            &self,
            _transcript: &str,
            _policy: &DurationPolicy,
            _max_clips: usize,
        ) -> WorkerResult<String> {
            Ok(r#"[{"start": 5, "end": 35, "reason": "r"}]"#.to_string())
        }

        async fn enrich_hooks(&self, _boundaries: &Value) -> WorkerResult<String> {
            Err(WorkerError::suggestion("service unavailable"))
        }
    }

    #[tokio::test]
    async fn test_hook_failure_degrades_to_fallbacks() {
        let candidates = suggest_candidates(&BrokenHooks, "", &DurationPolicy::default(), 6)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].hook, FALLBACK_HOOK);
        assert_eq!(candidates[0].reason, "r");
    }

    #[tokio::test]
    async fn test_static_suggester_reuses_boundary_output() {
        let suggester = StaticSuggester::new(
            r#"```json
            [{"start": 5, "end": 35, "hook": "Wait for it", "score": 0.8}]
            ```"#,
        );
        let candidates = suggest_candidates(&suggester, "", &DurationPolicy::default(), 6)
            .await
            .unwrap();
        assert_eq!(candidates[0].hook, "Wait for it");
        assert_eq!(candidates[0].score, 0.8);
    }

    #[tokio::test]
    async fn test_empty_boundaries() {
        let candidates =
            suggest_candidates(&StaticSuggester::new("[]"), "", &DurationPolicy::default(), 6)
                .await
                .unwrap();
        assert!(candidates.is_empty());
    }
}
