/// Platform rules deciding whether a library is active
use crate::utils::platform::OsType;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

impl RuleAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "allow" => Some(RuleAction::Allow),
            "disallow" => Some(RuleAction::Disallow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Disallow => "disallow",
        }
    }
}

/// A single entry of a library's `rules` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Rule {
    /// Applies everywhere.
    Implicit { action: RuleAction },

    /// Applies only on `os`. The version pattern is carried for round-tripping but not evaluated.
    Os {
        action: RuleAction,
        os: OsType,
        version_regex: Option<String>,
    },
}

impl Rule {
    pub fn action(&self) -> RuleAction {
        match self {
            Rule::Implicit { action } | Rule::Os { action, .. } => *action,
        }
    }

    pub fn applies(&self, platform: OsType) -> bool {
        match self {
            Rule::Implicit { .. } => true,
            Rule::Os { os, .. } => *os == platform,
        }
    }

    /// The rule's action if it applies on `platform`; `None` defers to earlier rules.
    pub fn apply(&self, platform: OsType) -> Option<RuleAction> {
        self.applies(platform).then(|| self.action())
    }

    /// Read one rule object. Entries without a usable action, or with an `os`
    /// object lacking a name, are not rules and yield `None`.
    pub fn from_json(value: &Value) -> Option<Rule> {
        let obj = value.as_object()?;
        let action = RuleAction::from_name(obj.get("action")?.as_str()?)?;

        let Some(os) = obj.get("os").and_then(Value::as_object) else {
            return Some(Rule::Implicit { action });
        };

        let name = os.get("name")?.as_str()?;
        let version_regex = os
            .get("version")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Some(Rule::Os {
            action,
            os: OsType::from_name(name),
            version_regex,
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Rule::Implicit { action } => json!({ "action": action.as_str() }),
            Rule::Os {
                action,
                os,
                version_regex,
            } => {
                let mut os_obj = json!({ "name": os.as_str() });
                if let Some(version) = version_regex {
                    os_obj["version"] = Value::String(version.clone());
                }
                json!({ "action": action.as_str(), "os": os_obj })
            }
        }
    }
}

/// Read a `rules` array, skipping entries that are not valid rules.
pub fn parse_rules(value: &Value) -> Vec<Rule> {
    let Some(list) = value.as_array() else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|entry| {
            let rule = Rule::from_json(entry);
            if rule.is_none() {
                log::debug!("Skipping unrecognized library rule: {}", entry);
            }
            rule
        })
        .collect()
}

/// Net decision of a rule list on `platform`.
///
/// An empty list allows. Otherwise the fold starts at `Disallow` and every rule
/// that applies overwrites the running result, so the last applicable rule wins.
pub fn evaluate(rules: &[Rule], platform: OsType) -> RuleAction {
    if rules.is_empty() {
        return RuleAction::Allow;
    }

    rules
        .iter()
        .fold(RuleAction::Disallow, |current, rule| {
            rule.apply(platform).unwrap_or(current)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_rule(action: RuleAction, os: OsType) -> Rule {
        Rule::Os {
            action,
            os,
            version_regex: None,
        }
    }

    #[test]
    fn test_empty_rules_allow() {
        assert_eq!(evaluate(&[], OsType::Linux), RuleAction::Allow);
    }

    #[test]
    fn test_last_applicable_rule_wins() {
        let rules = vec![
            Rule::Implicit {
                action: RuleAction::Disallow,
            },
            os_rule(RuleAction::Allow, OsType::Linux),
        ];
        assert_eq!(evaluate(&rules, OsType::Linux), RuleAction::Allow);
        assert_eq!(evaluate(&rules, OsType::Windows), RuleAction::Disallow);
    }

    #[test]
    fn test_non_applicable_rules_default_to_disallow() {
        let rules = vec![os_rule(RuleAction::Allow, OsType::MacOS)];
        assert_eq!(evaluate(&rules, OsType::Linux), RuleAction::Disallow);
        assert_eq!(evaluate(&rules, OsType::MacOS), RuleAction::Allow);
    }

    #[test]
    fn test_mojang_osx_exclusion() {
        let rules = parse_rules(&json!([
            { "action": "allow" },
            { "action": "disallow", "os": { "name": "osx", "version": "^10\\.5\\.\\d$" } }
        ]));
        assert_eq!(rules.len(), 2);
        assert_eq!(evaluate(&rules, OsType::Windows), RuleAction::Allow);
        assert_eq!(evaluate(&rules, OsType::MacOS), RuleAction::Disallow);
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let rules = parse_rules(&json!([
            { "action": "maybe" },
            { "os": { "name": "linux" } },
            { "action": "allow", "os": { "version": "1" } },
            "allow",
            { "action": "allow", "os": { "name": "linux" } }
        ]));
        assert_eq!(rules, vec![os_rule(RuleAction::Allow, OsType::Linux)]);
    }
}
