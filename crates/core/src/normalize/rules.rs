//! Declarative field rules

use std::collections::HashSet;

use crate::model::{Record, RecordValue};

use super::error::{NormalizeError, NormalizeResult};

/// One step of a record-type rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Move a value to a new key, if the old key is present
    Rename {
        from: &'static str,
        to: &'static str,
    },
    /// Move a boolean to a new key with its polarity flipped
    Negate {
        from: &'static str,
        to: &'static str,
    },
    /// Drop fields that live in a separate v2 store
    Exclude(&'static [&'static str]),
    /// Apply rules to every entry of a subform list
    Subform {
        field: &'static str,
        rules: &'static [FieldRule],
    },
}

/// Apply a rule table to a record in table order
///
/// An absent source key is not an error. When two rules write the same
/// target, the later rule wins.
pub fn apply_rules(record: &mut Record, rules: &[FieldRule]) -> NormalizeResult<()> {
    for rule in rules {
        match *rule {
            FieldRule::Rename { from, to } => {
                if let Some(value) = record.shift_remove(from) {
                    record.insert(to.to_string(), value);
                }
            }
            FieldRule::Negate { from, to } => {
                if let Some(value) = record.shift_remove(from) {
                    let flag = value.as_bool().ok_or_else(|| NormalizeError::NotBoolean {
                        field: from.to_string(),
                        found: value.type_name(),
                    })?;
                    record.insert(to.to_string(), RecordValue::Bool(!flag));
                }
            }
            FieldRule::Exclude(fields) => {
                for field in fields {
                    record.shift_remove(*field);
                }
            }
            FieldRule::Subform { field, rules } => {
                if let Some(RecordValue::List(entries)) = record.get_mut(field) {
                    for entry in entries.iter_mut() {
                        if let Some(map) = entry.as_map_mut() {
                            apply_rules(map, rules)?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Check that no rule target is also a rule source
///
/// This is what makes a table idempotent: applying it twice gives the same
/// record as applying it once.
pub fn validate_rules(rules: &[FieldRule]) -> NormalizeResult<()> {
    let mut sources = HashSet::new();
    let mut targets = Vec::new();
    for rule in rules {
        match rule {
            FieldRule::Rename { from, to } | FieldRule::Negate { from, to } => {
                sources.insert(*from);
                targets.push(*to);
            }
            FieldRule::Subform { rules, .. } => validate_rules(rules)?,
            FieldRule::Exclude(_) => {}
        }
    }
    match targets.into_iter().find(|t| sources.contains(t)) {
        Some(target) => Err(NormalizeError::CyclicRename(target.to_string())),
        None => Ok(()),
    }
}

/// Targets written by more than one rule
pub fn colliding_targets(rules: &[FieldRule]) -> Vec<&'static str> {
    let mut seen = HashSet::new();
    let mut collisions = Vec::new();
    for rule in rules {
        if let FieldRule::Rename { to, .. } | FieldRule::Negate { to, .. } = rule {
            if !seen.insert(*to) && !collisions.contains(to) {
                collisions.push(*to);
            }
        }
    }
    collisions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: Vec<(&str, RecordValue)>) -> Record {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_rename_only_when_present() {
        let rules = [FieldRule::Rename { from: "a", to: "b" }];
        let mut r = record(vec![("x", 1i64.into())]);
        apply_rules(&mut r, &rules).unwrap();
        assert_eq!(r, record(vec![("x", 1i64.into())]));

        let mut r = record(vec![("a", 1i64.into()), ("x", 2i64.into())]);
        apply_rules(&mut r, &rules).unwrap();
        let keys: Vec<&str> = r.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["x", "b"]);
    }

    #[test]
    fn test_negate() {
        let rules = [FieldRule::Negate { from: "opt_out", to: "opt_in" }];
        let mut r = record(vec![("opt_out", false.into())]);
        apply_rules(&mut r, &rules).unwrap();
        assert_eq!(r["opt_in"], RecordValue::Bool(true));

        let mut r = record(vec![("opt_out", "no".into())]);
        assert!(matches!(
            apply_rules(&mut r, &rules),
            Err(NormalizeError::NotBoolean { found: "string", .. })
        ));
    }

    #[test]
    fn test_last_rule_wins_on_collision() {
        let rules = [
            FieldRule::Rename { from: "a", to: "c" },
            FieldRule::Rename { from: "b", to: "c" },
        ];
        let mut r = record(vec![("a", 1i64.into()), ("b", 2i64.into())]);
        apply_rules(&mut r, &rules).unwrap();
        assert_eq!(r, record(vec![("c", 2i64.into())]));
        assert_eq!(colliding_targets(&rules), vec!["c"]);
    }

    #[test]
    fn test_subform_rules() {
        const NOTE_RULES: &[FieldRule] = &[FieldRule::Rename { from: "d", to: "date" }];
        let rules = [FieldRule::Subform { field: "notes", rules: NOTE_RULES }];
        let mut r = record(vec![(
            "notes",
            RecordValue::List(vec![RecordValue::Map(record(vec![("d", "x".into())]))]),
        )]);
        apply_rules(&mut r, &rules).unwrap();
        let entry = r["notes"].as_list().unwrap()[0].as_map().unwrap();
        assert!(entry.contains_key("date"));
    }

    #[test]
    fn test_validate_rejects_chains() {
        let rules = [
            FieldRule::Rename { from: "a", to: "b" },
            FieldRule::Rename { from: "b", to: "c" },
        ];
        assert!(matches!(
            validate_rules(&rules),
            Err(NormalizeError::CyclicRename(t)) if t == "b"
        ));
    }
}
