//! One-time expansion of source fields into the normalized review structure
//!
//! `ensure_initialized` is the only entry point. It builds whichever of
//! `question1_aspects` / `question2_situations` is missing (limited by
//! `Scope`) and reports what it did, so the caller persists exactly once
//! per expansion. Structures whose key is already present are never
//! rebuilt, whatever their content.
//!
//! Aspects can always be built, since a missing category just has no
//! points. Situations need four decisions; an item without them can still
//! have its scenario and issue points reviewed.

use crate::model::{
    keys, record_array, record_str, source_text, DatasetItem, DecisionSituation, IssueAspect,
    IssueCategory, IssuePoint, SITUATION_COUNT,
};
use crate::{Error, Result};
use serde_json::Value;
use tracing::info;

/// Letters keying the earlier `OptionConsequences` schema, in order
const LEGACY_OPTION_KEYS: [&str; SITUATION_COUNT] = ["A", "B", "C", "D"];

/// Which normalized structures a caller needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Issue aspects only (scenario and point operations)
    Aspects,
    /// Aspects and decision situations
    All,
}

/// What `ensure_initialized` built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expansion {
    pub aspects: bool,
    pub situations: bool,
}

impl Expansion {
    /// True when the item changed and must be persisted
    pub fn changed(&self) -> bool {
        self.aspects || self.situations
    }
}

/// Expand `item` in place as far as `scope` requires
///
/// With `Scope::All`, fails with `MalformedItem` when fewer than four source
/// decisions are available; in that case the item is left exactly as it was.
pub fn ensure_initialized(index: usize, item: &mut DatasetItem, scope: Scope) -> Result<Expansion> {
    if item.fields().is_none() {
        return Err(Error::MalformedItem {
            index,
            reason: "item is not a JSON object".to_string(),
        });
    }

    let situations = match scope {
        Scope::All if !item.has_situations() => Some(build_situations(index, item)?),
        _ => None,
    };

    let mut expansion = Expansion::default();

    if !item.has_aspects() {
        let aspects = serde_json::to_value(build_aspects(item))?;
        item.set_field(keys::ASPECTS, aspects);
        expansion.aspects = true;
    }

    if let Some(situations) = situations {
        item.set_field(keys::SITUATIONS, serde_json::to_value(situations)?);
        expansion.situations = true;
    }

    if expansion.changed() {
        info!(
            item = index,
            aspects = expansion.aspects,
            situations = expansion.situations,
            "Expanded dataset item"
        );
    }

    Ok(expansion)
}

/// Source issue texts for one category, falling back to the earlier keys
fn source_issues(item: &DatasetItem, category: IssueCategory) -> Vec<IssuePoint> {
    let record = item.record();
    let texts = record
        .get(keys::ISSUES)
        .and_then(|issues| issues.get(category.key()))
        .or_else(|| {
            record
                .get(keys::LEGACY_ISSUES)
                .and_then(|issues| issues.get(category.legacy_key()))
        });

    match texts {
        Some(Value::Array(texts)) => texts.iter().filter_map(source_text).map(IssuePoint::new).collect(),
        Some(single) => source_text(single).map(IssuePoint::new).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Four aspects in fixed category order; a missing category has no points
fn build_aspects(item: &DatasetItem) -> Vec<IssueAspect> {
    IssueCategory::ALL
        .iter()
        .map(|&category| IssueAspect {
            aspect_name: category.key().to_string(),
            points: source_issues(item, category),
            ..Default::default()
        })
        .collect()
}

/// First four source decisions, falling back to lettered legacy options
fn build_situations(index: usize, item: &DatasetItem) -> Result<Vec<DecisionSituation>> {
    let record = item.record();
    let decisions = record_array(record, keys::DECISIONS);

    if decisions.len() >= SITUATION_COUNT {
        return Ok(decisions
            .iter()
            .take(SITUATION_COUNT)
            .map(|d| {
                DecisionSituation::new(
                    record_str(d, "Decision").unwrap_or_default(),
                    record_str(d, "Consequence").unwrap_or_default(),
                )
            })
            .collect());
    }

    if let Some(options) = record.get(keys::LEGACY_OPTIONS).and_then(Value::as_object) {
        let situations: Vec<_> = LEGACY_OPTION_KEYS
            .iter()
            .filter_map(|key| options.get(*key))
            .map(|o| {
                DecisionSituation::new(
                    record_str(o, "Description").unwrap_or_default(),
                    record_str(o, "Consequence").unwrap_or_default(),
                )
            })
            .collect();
        if situations.len() == SITUATION_COUNT {
            return Ok(situations);
        }
    }

    Err(Error::MalformedItem {
        index,
        reason: format!(
            "expected {} decisions, found {}",
            SITUATION_COUNT,
            decisions.len()
        ),
    })
}
