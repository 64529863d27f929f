use std::collections::HashSet;
use std::fmt;

use crate::defs::*;

/// Validation error for malformed or dangling configuration entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { kind: &'static str, id: String },
    MissingReference { kind: &'static str, id: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { kind, id } => {
                write!(f, "duplicate {kind} id '{id}'")
            },
            ValidationError::MissingReference { kind, id, context } => {
                write!(f, "missing {kind} '{id}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a category definition for internal consistency.
///
/// ```
/// use ascend_data::{CategoryDef, SkillDef, validate_category};
///
/// let mut cat = CategoryDef::new("mining");
/// cat.skills.push(SkillDef::new("efficient_mining"));
/// assert!(validate_category(&cat).is_empty());
///
/// cat.skills.push(SkillDef::new("efficient_mining"));
/// assert_eq!(validate_category(&cat).len(), 1);
/// ```
pub fn validate_category(category: &CategoryDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let id = category.id.as_str();

    if id.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: "category id is empty".to_string(),
        });
    }

    let curve = &category.exp_curve;
    if !(curve.base.is_finite() && curve.base > 0.0) {
        errors.push(ValidationError::InvalidValue {
            context: format!("category '{id}' curve base {} must be positive", curve.base),
        });
    }
    if !(curve.multiplier.is_finite() && curve.multiplier > 0.0) {
        errors.push(ValidationError::InvalidValue {
            context: format!("category '{id}' curve multiplier {} must be positive", curve.multiplier),
        });
    }

    let mut levels = HashSet::new();
    for bonus in &category.level_bonuses {
        if !levels.insert(bonus.level) {
            errors.push(ValidationError::DuplicateId {
                kind: "level bonus",
                id: format!("{id}@{}", bonus.level),
            });
        }
        if bonus.level == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("category '{id}' has a level bonus at level 0"),
            });
        }
    }

    let mut skills = HashSet::new();
    for skill in &category.skills {
        if !skills.insert(skill.id.as_str()) {
            errors.push(ValidationError::DuplicateId {
                kind: "skill",
                id: skill.id.clone(),
            });
        }
        if skill.cost == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("skill '{}' in '{id}' costs 0 points", skill.id),
            });
        }
        if skill.max_ranks == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("skill '{}' in '{id}' has 0 max ranks", skill.id),
            });
        }
    }

    for (level, quest) in &category.milestones {
        if *level == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("category '{id}' has a milestone at level 0"),
            });
        }
        if quest.kind.requires_items() && quest.required_items.is_empty() {
            errors.push(ValidationError::InvalidValue {
                context: format!("milestone {level} in '{id}' requires items but lists none"),
            });
        }
        for item in &quest.required_items {
            if item.amount == 0 {
                errors.push(ValidationError::InvalidValue {
                    context: format!("milestone {level} in '{id}' asks for 0 of '{}'", item.item_id),
                });
            }
        }
    }

    errors
}

/// Check an action set against the set of known category ids.
pub fn validate_action_set<'a>(
    actions: &ActionSetDef,
    known_categories: impl IntoIterator<Item = &'a str>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let known: HashSet<&str> = known_categories.into_iter().collect();

    if !known.contains(actions.category.as_str()) {
        errors.push(ValidationError::MissingReference {
            kind: "category",
            id: actions.category.clone(),
            context: "action set".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for action in &actions.actions {
        if !seen.insert(action.action_id.as_str()) {
            errors.push(ValidationError::DuplicateId {
                kind: "action",
                id: action.action_id.clone(),
            });
        }
        if !action.exp.is_finite() || action.exp < 0.0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("action '{}' grants {} exp", action.action_id, action.exp),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_zero_cost_and_level_zero_milestone() {
        let mut cat = CategoryDef::new("farming");
        let mut skill = SkillDef::new("green_thumb");
        skill.cost = 0;
        cat.skills.push(skill);
        cat.milestones.insert(0, MilestoneQuestDef::default());

        let errors = validate_category(&cat);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::InvalidValue { .. })));
    }

    #[test]
    fn flags_item_quest_without_items() {
        let mut cat = CategoryDef::new("mining");
        cat.milestones.insert(
            20,
            MilestoneQuestDef {
                kind: QuestKind::ItemCollection,
                ..MilestoneQuestDef::default()
            },
        );
        let errors = validate_category(&cat);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("requires items"));
    }

    #[test]
    fn action_set_for_unknown_category() {
        let set = ActionSetDef::new("sailing")
            .with("row_boat", 1.0, None)
            .with("row_boat", 2.0, None);
        let errors = validate_action_set(&set, ["mining", "farming"]);
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingReference {
                    kind: "category",
                    id: "sailing".into(),
                    context: "action set".into(),
                },
                ValidationError::DuplicateId {
                    kind: "action",
                    id: "row_boat".into(),
                },
            ]
        );
    }

    #[test]
    fn negative_exp_is_invalid() {
        let set = ActionSetDef::new("mining").with("break_Ore_Iron", -2.0, None);
        let errors = validate_action_set(&set, ["mining"]);
        assert_eq!(errors.len(), 1);
    }
}
