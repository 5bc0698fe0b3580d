//! Field update controller
//!
//! Each editable judgement is addressed by a typed key and maps to exactly
//! one field of the normalized item. Every successful update rewrites the
//! annotation file before returning.
//!
//! Rules shared by all judgement fields:
//! - a choice must be one of the configured options, or `""` to reset
//! - moving to any choice other than the editable option clears the paired
//!   rewritten text
//! - rewritten text can only be set while the editable option is chosen
//! - comments are independent of the choice and are never cleared by it

use crate::config::ChoiceSet;
use crate::expander::Scope;
use crate::model::{keys, IssuePoint};
use crate::session::ReviewSession;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Scenario judgement of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub item: usize,
}

/// One issue aspect of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectKey {
    pub item: usize,
    pub aspect: usize,
}

/// One issue point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointKey {
    pub item: usize,
    pub aspect: usize,
    pub point: usize,
}

/// One decision situation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SituationKey {
    pub item: usize,
    pub situation: usize,
}

/// Classification of a stored choice label against its option set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgement<'a> {
    Unset,
    /// A non-editable option such as "Conform", "Correct" or "Delete"
    Option(&'a str),
    /// The option that unlocks rewritten text
    Editable,
}

impl<'a> Judgement<'a> {
    pub fn classify(choice: &'a str, set: &ChoiceSet) -> Self {
        if choice.is_empty() {
            Judgement::Unset
        } else if set.is_editable(choice) {
            Judgement::Editable
        } else {
            Judgement::Option(choice)
        }
    }
}

fn check_choice(set: &ChoiceSet, choice: &str) -> Result<()> {
    if choice.is_empty() || set.contains(choice) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "'{}' is not a {} option (expected one of {:?})",
            choice, set.label, set.options
        )))
    }
}

fn require_editable(set: &ChoiceSet, choice: &str, what: &str) -> Result<()> {
    if set.is_editable(choice) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} can only be edited while '{}' is selected",
            what, set.editable_option
        )))
    }
}

/// Split reviewer text into new point texts: one per non-blank line, trimmed
pub fn parse_missing_points(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn set_text(fields: &mut Map<String, Value>, key: &str, text: &str) {
    fields.insert(key.to_string(), Value::String(text.to_string()));
}

fn field_text<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a str {
    fields.get(key).and_then(Value::as_str).unwrap_or_default()
}

impl ReviewSession {
    // ------------------------------------------------------------------
    // Scenario
    // ------------------------------------------------------------------

    pub fn set_scenario_choice(&mut self, key: ScenarioKey, choice: &str) -> Result<()> {
        let set = self.choices.scenario.clone();
        check_choice(&set, choice)?;

        let fields = self.scenario_fields(key)?;
        set_text(fields, keys::SCENARIO_JUDGE, choice);
        if !set.is_editable(choice) {
            set_text(fields, keys::SCENARIO_MODIFIED, "");
        }

        debug!(item = key.item, choice, "Scenario choice updated");
        self.persist()
    }

    pub fn set_scenario_modified(&mut self, key: ScenarioKey, text: &str) -> Result<()> {
        let set = self.choices.scenario.clone();
        let fields = self.scenario_fields(key)?;
        require_editable(&set, field_text(fields, keys::SCENARIO_JUDGE), "Scenario text")?;

        set_text(fields, keys::SCENARIO_MODIFIED, text);
        self.persist()
    }

    pub fn set_scenario_comment(&mut self, key: ScenarioKey, comment: &str) -> Result<()> {
        let fields = self.scenario_fields(key)?;
        set_text(fields, keys::SCENARIO_COMMENT, comment);
        self.persist()
    }

    // ------------------------------------------------------------------
    // Issue points
    // ------------------------------------------------------------------

    pub fn set_point_choice(&mut self, key: PointKey, choice: &str) -> Result<()> {
        let set = self.choices.question1.clone();
        check_choice(&set, choice)?;

        let point = self.point_mut(key)?;
        set_text(point, keys::CHOICE, choice);
        if !set.is_editable(choice) {
            set_text(point, keys::MODIFIED_TEXT, "");
        }

        debug!(?key, choice, "Point choice updated");
        self.persist()
    }

    pub fn set_point_modified(&mut self, key: PointKey, text: &str) -> Result<()> {
        let set = self.choices.question1.clone();
        let point = self.point_mut(key)?;
        require_editable(&set, field_text(point, keys::CHOICE), "Point text")?;

        set_text(point, keys::MODIFIED_TEXT, text);
        self.persist()
    }

    pub fn set_point_comment(&mut self, key: PointKey, comment: &str) -> Result<()> {
        let point = self.point_mut(key)?;
        set_text(point, keys::COMMENT, comment);
        self.persist()
    }

    /// Append one unset point per non-blank line; returns how many were added
    ///
    /// Nothing is persisted when the text holds no usable lines.
    pub fn add_missing_points(&mut self, key: AspectKey, text: &str) -> Result<usize> {
        let lines = parse_missing_points(text);
        let item = self.expanded_item_mut(key.item, Scope::Aspects)?;
        let aspect = item
            .aspect_mut(key.aspect)
            .ok_or_else(|| Error::NotFound(format!("aspect {} of item {}", key.aspect, key.item)))?;

        if lines.is_empty() {
            return Ok(0);
        }

        let points = aspect
            .entry(keys::POINTS)
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| Error::MalformedItem {
                index: key.item,
                reason: format!("points of aspect {} are not a list", key.aspect),
            })?;

        let added = lines.len();
        for line in lines {
            points.push(serde_json::to_value(IssuePoint::new(line))?);
        }

        debug!(?key, added, "Missing points appended");
        self.persist()?;
        Ok(added)
    }

    // ------------------------------------------------------------------
    // Decision situations
    // ------------------------------------------------------------------

    pub fn set_situation_choice(&mut self, key: SituationKey, choice: &str) -> Result<()> {
        let set = self.choices.question2.clone();
        check_choice(&set, choice)?;

        let situation = self.situation_mut(key)?;
        set_text(situation, keys::CHOICE, choice);
        if !set.is_editable(choice) {
            set_text(situation, keys::MODIFIED_DECISION, "");
            set_text(situation, keys::MODIFIED_CONSEQUENCE, "");
            // Situations written by the earlier tool hold one combined rewrite
            if situation.contains_key(keys::MODIFIED_TEXT) {
                set_text(situation, keys::MODIFIED_TEXT, "");
            }
        }

        debug!(?key, choice, "Situation choice updated");
        self.persist()
    }

    pub fn set_situation_modified_decision(&mut self, key: SituationKey, text: &str) -> Result<()> {
        let set = self.choices.question2.clone();
        let situation = self.situation_mut(key)?;
        require_editable(&set, field_text(situation, keys::CHOICE), "Decision text")?;

        set_text(situation, keys::MODIFIED_DECISION, text);
        self.persist()
    }

    pub fn set_situation_modified_consequence(
        &mut self,
        key: SituationKey,
        text: &str,
    ) -> Result<()> {
        let set = self.choices.question2.clone();
        let situation = self.situation_mut(key)?;
        require_editable(&set, field_text(situation, keys::CHOICE), "Consequence text")?;

        set_text(situation, keys::MODIFIED_CONSEQUENCE, text);
        self.persist()
    }

    pub fn set_situation_comment(&mut self, key: SituationKey, comment: &str) -> Result<()> {
        let situation = self.situation_mut(key)?;
        set_text(situation, keys::COMMENT, comment);
        self.persist()
    }

    fn scenario_fields(&mut self, key: ScenarioKey) -> Result<&mut Map<String, Value>> {
        let item = self.expanded_item_mut(key.item, Scope::Aspects)?;
        item.fields_mut().ok_or_else(|| Error::MalformedItem {
            index: key.item,
            reason: "item is not a JSON object".to_string(),
        })
    }

    fn point_mut(&mut self, key: PointKey) -> Result<&mut Map<String, Value>> {
        let item = self.expanded_item_mut(key.item, Scope::Aspects)?;
        item.point_mut(key.aspect, key.point).ok_or_else(|| {
            Error::NotFound(format!(
                "point {} of aspect {} of item {}",
                key.point, key.aspect, key.item
            ))
        })
    }

    fn situation_mut(&mut self, key: SituationKey) -> Result<&mut Map<String, Value>> {
        let item = self.expanded_item_mut(key.item, Scope::All)?;
        item.situation_mut(key.situation).ok_or_else(|| {
            Error::NotFound(format!("situation {} of item {}", key.situation, key.item))
        })
    }
}
