// SPDX-License-Identifier: GPL-3.0-only

//! Pattern-based window classification. Ordered, first-match-wins, acting
//! only on `floating` — the rule-application code in the system this was
//! distilled from never acted on the `tags`/`monitor` fields it parses, and
//! that's preserved here rather than "fixed" (see DESIGN.md).

use crate::error::{Result, SwlError};
use regex::Regex;

pub const MAX_RULES: usize = 128;

/// A single classification rule. `tags`/`monitor` are part of the schema
/// (and round-trip through config) but are not consulted by `apply`.
pub struct Rule {
    pub app_id_pattern: Option<String>,
    pub title_pattern: Option<String>,
    pub tags: Option<u32>,
    pub floating: bool,
    pub monitor: Option<i32>,
    app_id_regex: Option<Regex>,
    title_regex: Option<Regex>,
}

impl Rule {
    pub fn new(
        app_id_pattern: Option<String>,
        title_pattern: Option<String>,
        tags: Option<u32>,
        floating: bool,
        monitor: Option<i32>,
    ) -> Self {
        let app_id_regex = app_id_pattern.as_deref().and_then(|p| Regex::new(p).ok());
        let title_regex = title_pattern.as_deref().and_then(|p| Regex::new(p).ok());
        Rule {
            app_id_pattern,
            title_pattern,
            tags,
            floating,
            monitor,
            app_id_regex,
            title_regex,
        }
    }

    fn matches(&self, app_id: Option<&str>, title: Option<&str>) -> bool {
        let app_id_ok = match (&self.app_id_regex, app_id) {
            (Some(re), Some(v)) => re.is_match(v),
            (Some(_), None) => false,
            (None, _) => self.app_id_pattern.is_none(),
        };
        if !app_id_ok {
            return false;
        }

        match (&self.title_regex, title) {
            (Some(re), Some(v)) => re.is_match(v),
            (Some(_), None) => false,
            (None, _) => self.title_pattern.is_none(),
        }
    }
}

#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn new() -> Self {
        RuleEngine::default()
    }

    pub fn add(&mut self, rule: Rule) -> Result<()> {
        if self.rules.len() >= MAX_RULES {
            return Err(SwlError::NoMem);
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<()> {
        if index >= self.rules.len() {
            return Err(SwlError::InvalidArg);
        }
        self.rules.remove(index);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Returns whether `floating` should be forced by the first matching
    /// rule, or `None` if nothing matched.
    pub fn apply(&self, app_id: Option<&str>, title: Option<&str>) -> Option<bool> {
        self.rules
            .iter()
            .find(|r| r.matches(app_id, title))
            .map(|r| r.floating)
    }
}

/// Loads every `rules.N.*` entry (an index per array element, matching
/// [`crate::config::store`]'s generic array-flattening rule) in order.
/// A rule missing both patterns matches everything; malformed indices are
/// skipped rather than treated as fatal.
pub fn load_rules_from_config(cfg: &crate::config::ConfigStore) -> RuleEngine {
    let mut engine = RuleEngine::new();
    let mut indices: Vec<u32> = cfg
        .keys("rules.")
        .iter()
        .filter_map(|k| k["rules.".len()..].split('.').next())
        .filter_map(|s| s.parse().ok())
        .collect();
    indices.sort_unstable();
    indices.dedup();

    for i in indices {
        let prefix = format!("rules.{i}.");
        let app_id_pattern = opt_string(cfg, &format!("{prefix}app_id"));
        let title_pattern = opt_string(cfg, &format!("{prefix}title"));
        let tags = if cfg.has(&format!("{prefix}tags")) {
            Some(cfg.get_int(&format!("{prefix}tags"), 0) as u32)
        } else {
            None
        };
        let floating = cfg.get_bool(&format!("{prefix}floating"), false);
        let monitor = if cfg.has(&format!("{prefix}monitor")) {
            Some(cfg.get_int(&format!("{prefix}monitor"), 0) as i32)
        } else {
            None
        };

        let rule = Rule::new(app_id_pattern, title_pattern, tags, floating, monitor);
        if engine.add(rule).is_err() {
            tracing::warn!("rule table full, dropping remaining rules.* entries");
            break;
        }
    }

    engine
}

fn opt_string(cfg: &crate::config::ConfigStore, key: &str) -> Option<String> {
    cfg.has(key).then(|| cfg.get_string(key, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_rules_from_config_in_order() {
        let mut cfg = crate::config::ConfigStore::new();
        cfg.set_string("rules.0.app_id", "^mpv$");
        cfg.set_bool("rules.0.floating", true);
        cfg.set_string("rules.1.app_id", ".*");
        cfg.set_bool("rules.1.floating", false);

        let engine = load_rules_from_config(&cfg);
        assert_eq!(engine.count(), 2);
        assert_eq!(engine.apply(Some("mpv"), None), Some(true));
        assert_eq!(engine.apply(Some("firefox"), None), Some(false));
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut engine = RuleEngine::new();
        engine
            .add(Rule::new(Some("^mpv$".into()), None, None, true, None))
            .unwrap();
        engine
            .add(Rule::new(Some(".*".into()), None, None, false, None))
            .unwrap();

        assert_eq!(engine.apply(Some("mpv"), None), Some(true));
        assert_eq!(engine.apply(Some("firefox"), None), Some(false));
    }

    #[test]
    fn no_match_returns_none() {
        let mut engine = RuleEngine::new();
        engine
            .add(Rule::new(Some("^mpv$".into()), None, None, true, None))
            .unwrap();
        assert_eq!(engine.apply(Some("firefox"), None), None);
    }

    #[test]
    fn null_attribute_against_pattern_fails_to_match() {
        let mut engine = RuleEngine::new();
        engine
            .add(Rule::new(Some("^mpv$".into()), None, None, true, None))
            .unwrap();
        assert_eq!(engine.apply(None, None), None);
    }

    #[test]
    fn capacity_exhaustion_returns_nomem() {
        let mut engine = RuleEngine::new();
        for _ in 0..MAX_RULES {
            engine.add(Rule::new(None, None, None, false, None)).unwrap();
        }
        assert_eq!(
            engine.add(Rule::new(None, None, None, false, None)),
            Err(SwlError::NoMem)
        );
    }
}
