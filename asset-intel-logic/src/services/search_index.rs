use chrono::{DateTime, Utc};
use entity::search_index::ActiveModel;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    repository::search_index,
    types::{
        related_assets::{MatchReason, RelatedAsset},
        search_index::{SearchHit, SearchIndexEntry},
    },
};

/// Relative size tolerance for the `near_size` signal: candidates within 3%
/// of the source asset's byte length are considered near-duplicates.
const NEAR_SIZE_TOLERANCE_RATIO: f64 = 0.03;
const SNIPPET_MAX_CHARS: usize = 220;
const TEXT_SEED_MAX_TOKENS: usize = 20;

/// Projects a completed fingerprint (and, if present, OCR) result onto the
/// search index row for the asset. Called by the dispatcher right after a
/// run completes; `ocr_text_preview` drives the `ocr_tsv` trigger in
/// Postgres, so the row has to be written for OCR text to become searchable.
pub async fn ensure_asset_indexing<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    fingerprint_data: Option<&Value>,
    ocr_text: Option<&str>,
) -> Result<SearchIndexEntry, ServiceError> {
    let mut active = search_index::touch_active_model(tenant_id, asset_id);

    if let Some(data) = fingerprint_data {
        active.sha256 = Set(data.get("sha256").and_then(Value::as_str).map(str::to_string));
        active.etag = Set(data.get("etag").and_then(Value::as_str).map(str::to_string));
        active.content_type = Set(data
            .get("content_type")
            .and_then(Value::as_str)
            .map(str::to_string));
        active.content_length = Set(data.get("content_length").and_then(Value::as_i64));
        active.last_modified = Set(data
            .get("last_modified")
            .and_then(Value::as_str)
            .map(str::to_string));
    }

    if let Some(text) = ocr_text {
        const PREVIEW_LEN: usize = 4_000;
        let preview: String = text.chars().take(PREVIEW_LEN).collect();
        active.ocr_text_preview = Set(Some(preview));
    }

    let model = upsert(db, active).await?;
    Ok(model.into())
}

async fn upsert<C: ConnectionTrait>(db: &C, active: ActiveModel) -> Result<entity::search_index::Model, ServiceError> {
    Ok(search_index::upsert(db, active).await?)
}

pub async fn search_by_text<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    query: &str,
    limit: u64,
) -> Result<Vec<SearchHit>, ServiceError> {
    let rows = search_index::search_ocr_text(db, tenant_id, query, limit).await?;
    Ok(rows
        .into_iter()
        .map(|r| SearchHit {
            asset_id: r.asset_id,
            rank: r.rank,
            snippet: r.snippet,
        })
        .collect())
}

#[derive(Debug, Default)]
struct CandidateSignals {
    badges: Vec<(MatchReason, f64)>,
    near_size_pct: Option<f64>,
    snippet: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl CandidateSignals {
    fn add(&mut self, reason: MatchReason, score: f64, updated_at: DateTime<Utc>) {
        if !self.badges.iter().any(|(r, _)| *r == reason) {
            self.badges.push((reason, score));
        }
        self.updated_at = Some(updated_at);
    }
}

/// Ranks candidate near-duplicates of `asset_id` by combining exact-hash,
/// etag, near-size, and OCR-text similarity signals. Per candidate the score
/// is the max across signals (not a sum): a single sha256 match always beats
/// a near-size match alone, regardless of how many weaker signals also hit.
pub async fn rank_related_assets<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    asset_id: Uuid,
    limit: u64,
) -> Result<Vec<RelatedAsset>, ServiceError> {
    let Some(entry) = search_index::find_by_asset(db, tenant_id, asset_id).await? else {
        return Ok(Vec::new());
    };

    let mut candidates: BTreeMap<Uuid, CandidateSignals> = BTreeMap::new();

    if let Some(sha256) = &entry.sha256 {
        for hit in search_index::find_by_sha256(db, tenant_id, sha256, asset_id).await? {
            candidates
                .entry(hit.asset_id)
                .or_default()
                .add(MatchReason::Sha256, 1.00, hit.updated_at);
        }
    }
    if let Some(etag) = &entry.etag {
        for hit in search_index::find_by_etag(db, tenant_id, etag, asset_id).await? {
            candidates
                .entry(hit.asset_id)
                .or_default()
                .add(MatchReason::Etag, 0.95, hit.updated_at);
        }
    }
    if let (Some(content_type), Some(src_len)) = (&entry.content_type, entry.content_length) {
        if src_len > 0 {
            let tolerance = (src_len as f64 * NEAR_SIZE_TOLERANCE_RATIO).ceil() as i64;
            let min_length = src_len - tolerance;
            let max_length = src_len + tolerance;
            for hit in search_index::find_near_size(
                db,
                tenant_id,
                content_type,
                min_length,
                max_length,
                asset_id,
            )
            .await?
            {
                if let Some(other_len) = hit.content_length {
                    let ratio = (other_len - src_len).abs() as f64 / src_len as f64;
                    if ratio <= NEAR_SIZE_TOLERANCE_RATIO {
                        let score = near_size_score(ratio);
                        let signals = candidates.entry(hit.asset_id).or_default();
                        signals.add(MatchReason::NearSize, score, hit.updated_at);
                        signals.near_size_pct = Some(ratio * 100.0);
                    }
                }
            }
        }
    }
    if let Some(preview) = &entry.ocr_text_preview {
        let seed: String = preview
            .split_whitespace()
            .take(TEXT_SEED_MAX_TOKENS)
            .collect::<Vec<_>>()
            .join(" ");
        if !seed.trim().is_empty() {
            for hit in search_index::search_ocr_text(db, tenant_id, &seed, limit).await? {
                if hit.asset_id != asset_id {
                    let score = text_similarity_score(hit.rank);
                    let signals = candidates.entry(hit.asset_id).or_default();
                    signals.add(MatchReason::TextSimilarity, score, Utc::now());
                    signals.snippet = hit
                        .snippet
                        .map(|s| s.chars().take(SNIPPET_MAX_CHARS).collect());
                }
            }
        }
    }

    let mut related: Vec<RelatedAsset> = candidates
        .into_iter()
        .map(|(candidate_id, mut signals)| {
            signals
                .badges
                .sort_by(|a, b| b.1.total_cmp(&a.1));
            let (top_reason, score) = signals.badges[0];
            let explanation = top_reason.explain(if top_reason == MatchReason::NearSize {
                signals.near_size_pct
            } else {
                None
            });
            RelatedAsset {
                asset_id: candidate_id,
                score,
                explanation,
                badges: signals.badges.into_iter().map(|(r, _)| r).collect(),
                snippet: signals.snippet,
                updated_at: signals.updated_at.unwrap_or_else(Utc::now),
            }
        })
        .collect();

    related.sort_by(|a, b| b.score.total_cmp(&a.score).then(b.updated_at.cmp(&a.updated_at)));
    related.truncate(limit as usize);
    Ok(related)
}

/// Linearly decays from 0.75 at an exact size match to 0 at the tolerance
/// boundary; `ratio` is the relative size difference, already checked to be
/// within `NEAR_SIZE_TOLERANCE_RATIO` by the caller.
fn near_size_score(ratio: f64) -> f64 {
    0.75 * (1.0 - ratio / NEAR_SIZE_TOLERANCE_RATIO)
}

/// Maps a `ts_rank_cd` value onto (0, 0.70): the curve approaches but never
/// reaches the etag signal's weight, so text similarity alone never outranks
/// an exact or near-exact match.
fn text_similarity_score(rank: f64) -> f64 {
    0.70 * (rank / (rank + 0.25))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.75)]
    #[case(0.03, 0.0)]
    #[case(0.015, 0.375)]
    fn near_size_score_decays_to_tolerance_boundary(#[case] ratio: f64, #[case] expected: f64) {
        assert!((near_size_score(ratio) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.25, 0.35)]
    #[case(1.0, 0.56)]
    fn text_similarity_score_approaches_but_never_reaches_etag_weight(
        #[case] rank: f64,
        #[case] expected: f64,
    ) {
        assert!((text_similarity_score(rank) - expected).abs() < 1e-9);
        assert!(text_similarity_score(rank) < 0.70);
    }

    #[test]
    fn signals_unify_by_max_not_sum() {
        let mut signals = CandidateSignals::default();
        signals.add(MatchReason::NearSize, 0.75, Utc::now());
        signals.add(MatchReason::Sha256, 1.00, Utc::now());
        signals.badges.sort_by(|a, b| b.1.total_cmp(&a.1));
        let (top_reason, score) = signals.badges[0];
        assert_eq!(top_reason, MatchReason::Sha256);
        assert_eq!(score, 1.00);
    }

    #[test]
    fn signals_dedupe_repeated_reason() {
        let mut signals = CandidateSignals::default();
        signals.add(MatchReason::Etag, 0.95, Utc::now());
        signals.add(MatchReason::Etag, 0.95, Utc::now());
        assert_eq!(signals.badges.len(), 1);
    }
}
