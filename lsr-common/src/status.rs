//! Overall annotation progress for a dataset

use crate::model::{keys, record_array, record_str, DatasetItem};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Counts over all items of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    /// Items whose normalized structures exist
    pub expanded: usize,
    /// Scenario choice label → number of items, in first-seen order
    pub scenario_counts: IndexMap<String, usize>,
    pub unset_scenarios: usize,
    pub points_judged: usize,
    pub points_total: usize,
    pub situations_judged: usize,
    pub situations_total: usize,
}

fn is_judged(record: &Value) -> bool {
    record_str(record, keys::CHOICE).is_some_and(|c| !c.is_empty())
}

/// Summarize judgement progress over `items`
pub fn summarize(items: &[DatasetItem]) -> StatusSummary {
    let mut summary = StatusSummary {
        total: items.len(),
        ..Default::default()
    };

    for item in items {
        if item.is_expanded() {
            summary.expanded += 1;
        }

        match item.scenario_choice() {
            "" => summary.unset_scenarios += 1,
            choice => *summary.scenario_counts.entry(choice.to_string()).or_default() += 1,
        }

        for aspect in item.aspect_records() {
            let points = record_array(aspect, keys::POINTS);
            summary.points_total += points.len();
            summary.points_judged += points.iter().filter(|p| is_judged(p)).count();
        }

        let situations = item.situation_records();
        summary.situations_total += situations.len();
        summary.situations_judged += situations.iter().filter(|s| is_judged(s)).count();
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_counts_choices() {
        let items = vec![
            DatasetItem::new(json!({
                "Scenario_judge": "Conform",
                "question1_aspects": [{
                    "aspect_name": "Most_Common_Hazards",
                    "points": [
                        {"original_text": "a", "choice": "Correct", "modified_text": ""},
                        {"original_text": "b", "choice": "", "modified_text": ""},
                    ],
                }],
                "question2_situations": [{"decision": "d", "consequence": "c", "choice": ""}],
            })),
            DatasetItem::new(json!({"Scenario_judge": "Conform"})),
            DatasetItem::new(json!({"Scenario": "s"})),
            DatasetItem::new(json!(null)),
        ];

        let summary = summarize(&items);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.expanded, 1);
        assert_eq!(summary.scenario_counts.get("Conform"), Some(&2));
        assert_eq!(summary.unset_scenarios, 2);
        assert_eq!((summary.points_judged, summary.points_total), (1, 2));
        assert_eq!((summary.situations_judged, summary.situations_total), (0, 1));
    }
}
