//! Dataset item and normalized annotation structures
//!
//! A dataset item is kept as the JSON record it was read as. Source fields
//! (scenario text, issue lists, decision/consequence pairs) are read through
//! tolerant accessors, and annotation fields are written back in place, so
//! keys this crate does not know about, `null` values and the original key
//! order all survive a load/persist cycle.
//!
//! `IssuePoint`, `IssueAspect` and `DecisionSituation` are the shapes the
//! expander writes. They also decode older annotation records: every field
//! has a default and unknown keys land in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of decision situations every expanded item carries
pub const SITUATION_COUNT: usize = 4;

/// Annotation file keys written by the controller and expander
pub mod keys {
    pub const TOPIC: &str = "Topic";
    pub const SCENARIO: &str = "Scenario";
    pub const ISSUES: &str = "LabSafety_Related_Issues";
    pub const LEGACY_ISSUES: &str = "LabSafetyRelatedIssues";
    pub const DECISIONS: &str = "Decisions";
    pub const LEGACY_OPTIONS: &str = "OptionConsequences";
    pub const SCENARIO_JUDGE: &str = "Scenario_judge";
    pub const SCENARIO_MODIFIED: &str = "Scenario_modified";
    pub const SCENARIO_COMMENT: &str = "Scenario_comment";
    pub const ASPECTS: &str = "question1_aspects";
    pub const SITUATIONS: &str = "question2_situations";
    pub const POINTS: &str = "points";
    pub const CHOICE: &str = "choice";
    pub const COMMENT: &str = "comment";
    pub const MODIFIED_TEXT: &str = "modified_text";
    pub const MODIFIED_DECISION: &str = "modified_decision";
    pub const MODIFIED_CONSEQUENCE: &str = "modified_consequence";
}

/// The four fixed issue categories, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    MostCommonHazards,
    ImproperOperationIssues,
    NegativeLabEnvironmentImpacts,
    MostLikelySafetyIncidents,
}

impl IssueCategory {
    /// All categories in the order aspects are created
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::MostCommonHazards,
        IssueCategory::ImproperOperationIssues,
        IssueCategory::NegativeLabEnvironmentImpacts,
        IssueCategory::MostLikelySafetyIncidents,
    ];

    /// Key used in `LabSafety_Related_Issues` and in `aspect_name`
    pub fn key(self) -> &'static str {
        match self {
            IssueCategory::MostCommonHazards => "Most_Common_Hazards",
            IssueCategory::ImproperOperationIssues => "Improper_Operation_Issues",
            IssueCategory::NegativeLabEnvironmentImpacts => "Negative_Lab_Environment_Impacts",
            IssueCategory::MostLikelySafetyIncidents => "Most_Likely_Safety_Incidents",
        }
    }

    /// Key used by the earlier `LabSafetyRelatedIssues` source schema
    pub fn legacy_key(self) -> &'static str {
        match self {
            IssueCategory::MostCommonHazards => "MostCommonHazards",
            IssueCategory::ImproperOperationIssues => "ImproperOperationIssues",
            IssueCategory::NegativeLabEnvironmentImpacts => "NegativeLabEnvironmentImpacts",
            IssueCategory::MostLikelySafetyIncidents => "MostLikelySafetyIncidents",
        }
    }

    /// Human-readable heading
    pub fn display_name(self) -> &'static str {
        match self {
            IssueCategory::MostCommonHazards => "Most Common Hazards",
            IssueCategory::ImproperOperationIssues => "Improper Operation Issues",
            IssueCategory::NegativeLabEnvironmentImpacts => "Negative Lab Environment Impacts",
            IssueCategory::MostLikelySafetyIncidents => "Most Likely Safety Incidents",
        }
    }

    /// Category at a fixed aspect position
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// One reviewable issue statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuePoint {
    /// Text as generated or as entered by "add missing points"; never edited
    #[serde(default)]
    pub original_text: String,

    /// Selected option label, empty while unset
    #[serde(default)]
    pub choice: String,

    /// Reviewer rewrite, only non-empty while `choice` is the editable option
    #[serde(default)]
    pub modified_text: String,

    /// Older annotation files may lack the field entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IssuePoint {
    /// New unset point
    pub fn new(original_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            comment: Some(String::new()),
            ..Default::default()
        }
    }
}

/// Ordered points of one issue category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueAspect {
    #[serde(default)]
    pub aspect_name: String,

    #[serde(default)]
    pub points: Vec<IssuePoint>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One reviewable decision/consequence pair
///
/// Situations written by the earlier tool carry `option_key`,
/// `original_text` and `modified_text` instead of the split texts; those
/// decode with empty `decision`/`consequence` and keep their keys in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionSituation {
    #[serde(default)]
    pub decision: String,

    #[serde(default)]
    pub consequence: String,

    #[serde(default)]
    pub choice: String,

    #[serde(default)]
    pub modified_decision: String,

    #[serde(default)]
    pub modified_consequence: String,

    #[serde(default)]
    pub comment: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DecisionSituation {
    /// New unset situation from original texts
    pub fn new(decision: impl Into<String>, consequence: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
            consequence: consequence.into(),
            ..Default::default()
        }
    }
}

/// String value of `key` in a JSON record, `None` when absent or not a string
pub fn record_str<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Array under `key`, empty when absent or not an array
pub fn record_array<'a>(record: &'a Value, key: &str) -> &'a [Value] {
    record
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Source text as a string: strings as-is, other scalars rendered, `null` dropped
pub(crate) fn source_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// One dataset record under review
///
/// Any JSON value is accepted as an item; only operations that need fields
/// require it to be an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetItem {
    record: Value,
}

impl DatasetItem {
    pub fn new(record: Value) -> Self {
        Self { record }
    }

    /// The record exactly as it will be written
    pub fn record(&self) -> &Value {
        &self.record
    }

    /// Object fields, `None` if the record is not an object
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.record.as_object()
    }

    pub(crate) fn fields_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.record.as_object_mut()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields().is_some_and(|f| f.contains_key(key))
    }

    /// String field, `None` when absent or of another type
    pub fn text(&self, key: &str) -> Option<&str> {
        record_str(&self.record, key)
    }

    pub fn topic(&self) -> Option<&str> {
        self.text(keys::TOPIC)
    }

    pub fn scenario(&self) -> Option<&str> {
        self.text(keys::SCENARIO)
    }

    /// Current scenario choice, empty while unset
    pub fn scenario_choice(&self) -> &str {
        self.text(keys::SCENARIO_JUDGE).unwrap_or_default()
    }

    pub fn scenario_modified(&self) -> Option<&str> {
        self.text(keys::SCENARIO_MODIFIED)
    }

    pub fn scenario_comment(&self) -> Option<&str> {
        self.text(keys::SCENARIO_COMMENT)
    }

    /// Scenario text a reviewer should read: the rewrite if any, else the original
    pub fn effective_scenario(&self) -> &str {
        match self.scenario_modified() {
            Some(text) if !text.is_empty() => text,
            _ => self.scenario().unwrap_or_default(),
        }
    }

    pub fn has_aspects(&self) -> bool {
        self.contains(keys::ASPECTS)
    }

    pub fn has_situations(&self) -> bool {
        self.contains(keys::SITUATIONS)
    }

    /// True once both normalized structures exist
    pub fn is_expanded(&self) -> bool {
        self.has_aspects() && self.has_situations()
    }

    /// Raw aspect records
    pub fn aspect_records(&self) -> &[Value] {
        record_array(&self.record, keys::ASPECTS)
    }

    /// Raw situation records
    pub fn situation_records(&self) -> &[Value] {
        record_array(&self.record, keys::SITUATIONS)
    }

    /// Decoded aspects; records that do not decode are skipped
    pub fn issue_aspects(&self) -> Vec<IssueAspect> {
        self.aspect_records()
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }

    /// Decoded situations; records that do not decode are skipped
    pub fn decision_situations(&self) -> Vec<DecisionSituation> {
        self.situation_records()
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }

    /// Set a top-level field; an existing key keeps its position
    ///
    /// Returns false when the record is not an object.
    pub(crate) fn set_field(&mut self, key: &str, value: Value) -> bool {
        match self.fields_mut() {
            Some(fields) => {
                fields.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn aspect_mut(&mut self, aspect: usize) -> Option<&mut Map<String, Value>> {
        self.record
            .get_mut(keys::ASPECTS)?
            .as_array_mut()?
            .get_mut(aspect)?
            .as_object_mut()
    }

    pub(crate) fn point_mut(
        &mut self,
        aspect: usize,
        point: usize,
    ) -> Option<&mut Map<String, Value>> {
        self.aspect_mut(aspect)?
            .get_mut(keys::POINTS)?
            .as_array_mut()?
            .get_mut(point)?
            .as_object_mut()
    }

    pub(crate) fn situation_mut(&mut self, situation: usize) -> Option<&mut Map<String, Value>> {
        self.record
            .get_mut(keys::SITUATIONS)?
            .as_array_mut()?
            .get_mut(situation)?
            .as_object_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_round_trips_unchanged() {
        let text = r#"{"Subject":"Organic","Scenario":"s","Topic":7,"Scenario_comment":null}"#;
        let item: DatasetItem = serde_json::from_str(text).unwrap();

        assert_eq!(item.topic(), None);
        assert_eq!(item.scenario(), Some("s"));
        assert_eq!(item.scenario_comment(), None);
        assert_eq!(serde_json::to_string(&item).unwrap(), text);
    }

    #[test]
    fn test_set_field_keeps_position() {
        let mut item = DatasetItem::new(json!({"Scenario_judge": "", "Scenario": "s"}));
        assert!(item.set_field(keys::SCENARIO_JUDGE, json!("Conform")));
        assert!(item.set_field(keys::SCENARIO_COMMENT, json!("ok")));

        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            r#"{"Scenario_judge":"Conform","Scenario":"s","Scenario_comment":"ok"}"#
        );

        let mut scalar = DatasetItem::new(json!("not an object"));
        assert!(!scalar.set_field(keys::SCENARIO_JUDGE, json!("Conform")));
    }

    #[test]
    fn test_point_without_comment_stays_without_comment() {
        let raw = json!({"original_text": "Spill", "choice": "", "modified_text": ""});
        let point: IssuePoint = serde_json::from_value(raw.clone()).unwrap();
        assert!(point.comment.is_none());
        assert_eq!(serde_json::to_value(&point).unwrap(), raw);
    }

    #[test]
    fn test_earlier_situation_record_decodes() {
        let raw = json!({
            "option_key": "B",
            "original_text": "Option B: wait\n\nConsequence: smoke",
            "choice": "Correct",
            "modified_text": "",
        });
        let situation: DecisionSituation = serde_json::from_value(raw).unwrap();
        assert_eq!(situation.choice, "Correct");
        assert_eq!(situation.decision, "");
        assert_eq!(situation.extra.get("option_key"), Some(&json!("B")));
    }

    #[test]
    fn test_effective_scenario_prefers_rewrite() {
        let mut item = DatasetItem::new(json!({"Scenario": "original"}));
        assert_eq!(item.effective_scenario(), "original");

        item.set_field(keys::SCENARIO_MODIFIED, json!(""));
        assert_eq!(item.effective_scenario(), "original");

        item.set_field(keys::SCENARIO_MODIFIED, json!("rewritten"));
        assert_eq!(item.effective_scenario(), "rewritten");
    }

    #[test]
    fn test_category_order_and_keys() {
        let keys: Vec<_> = IssueCategory::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            vec![
                "Most_Common_Hazards",
                "Improper_Operation_Issues",
                "Negative_Lab_Environment_Impacts",
                "Most_Likely_Safety_Incidents",
            ]
        );
        assert_eq!(IssueCategory::from_index(4), None);
    }
}
