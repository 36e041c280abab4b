// SPDX-License-Identifier: GPL-3.0-only

use crate::error::{Result, SwlError};
use std::path::{Path, PathBuf};

/// Tagged value held by a config entry. No implicit coercion between
/// variants — `get_int` on a `String` entry behaves like a missing key.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Int(i64),
    Float(f32),
    Bool(bool),
    String(String),
    Color([f32; 4]),
}

impl ConfigValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }
    fn as_float(&self) -> Option<f32> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            _ => None,
        }
    }
    fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
    fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }
    fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            ConfigValue::Color(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(i64);

struct Watch {
    id: WatchId,
    /// `None` matches every key (match-all watch).
    prefix: Option<String>,
    handler: Box<dyn FnMut(&str)>,
}

/// Flat dotted-key → tagged-value map, populated by flattening a parsed
/// TOML document. Entries are kept in insertion (traversal) order, matching
/// the C original's dense append-only entry array rather than a sorted map.
pub struct ConfigStore {
    entries: Vec<(String, ConfigValue)>,
    watches: Vec<Watch>,
    next_watch_id: i64,
    path: Option<PathBuf>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        ConfigStore {
            entries: Vec::new(),
            watches: Vec::new(),
            next_watch_id: 1,
            path: None,
        }
    }

    fn find(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.find(key).and_then(ConfigValue::as_int).unwrap_or(default)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.find(key).and_then(ConfigValue::as_float).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.find(key).and_then(ConfigValue::as_bool).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.find(key)
            .and_then(ConfigValue::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn get_color(&self, key: &str) -> Option<[f32; 4]> {
        self.find(key).and_then(ConfigValue::as_color)
    }

    fn upsert(&mut self, key: &str, value: ConfigValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self.notify(key);
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.upsert(key, ConfigValue::Int(value));
    }

    pub fn set_float(&mut self, key: &str, value: f32) {
        self.upsert(key, ConfigValue::Float(value));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.upsert(key, ConfigValue::Bool(value));
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.upsert(key, ConfigValue::String(value.into()));
    }

    pub fn set_color(&mut self, key: &str, value: [f32; 4]) {
        self.upsert(key, ConfigValue::Color(value));
    }

    pub fn has(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        let idx = self.entries.iter().position(|(k, _)| k == key);
        match idx {
            Some(i) => {
                self.entries.remove(i);
                Ok(())
            }
            None => Err(SwlError::NotFound),
        }
    }

    /// Keys matching `prefix` (or every key when `prefix` is empty), in
    /// insertion order.
    pub fn keys(&self, prefix: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| prefix.is_empty() || k.starts_with(prefix))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn watch(&mut self, prefix: Option<&str>, handler: impl FnMut(&str) + 'static) -> WatchId {
        let id = WatchId(self.next_watch_id);
        self.next_watch_id += 1;
        self.watches.push(Watch {
            id,
            prefix: prefix.map(str::to_string),
            handler: Box::new(handler),
        });
        id
    }

    pub fn unwatch(&mut self, id: WatchId) {
        self.watches.retain(|w| w.id != id);
    }

    fn notify(&mut self, key: &str) {
        for w in &mut self.watches {
            let matches = match &w.prefix {
                None => true,
                Some(p) => key.starts_with(p.as_str()),
            };
            if matches {
                (w.handler)(key);
            }
        }
    }

    /// Parses and flattens `path`. On success replaces every entry
    /// atomically; on parse failure the store is left exactly as it was
    /// (the spec's invariant — this is the one place the original C
    /// behavior, an unconditional clear-then-parse, is deliberately not
    /// followed; see DESIGN.md).
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|_| SwlError::Io)?;
        let doc: toml::Value = toml::from_str(&text).map_err(|_| SwlError::Config)?;

        let mut fresh = ConfigStore::new();
        if let toml::Value::Table(table) = doc {
            flatten_table(&mut fresh, &table, "");
        }

        self.entries = fresh.entries;
        self.path = Some(path.to_path_buf());
        self.notify_full_reload();
        Ok(())
    }

    /// Tries `$XDG_CONFIG_HOME/swl/config.toml`, then
    /// `$HOME/.config/swl/config.toml`, then `/etc/swl/config.toml`.
    pub fn load_default(&mut self) -> Result<()> {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg).join("swl/config.toml");
            if self.load_file(&path).is_ok() {
                return Ok(());
            }
        }
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".config/swl/config.toml");
            if self.load_file(&path).is_ok() {
                return Ok(());
            }
        }
        if self.load_file("/etc/swl/config.toml").is_ok() {
            return Ok(());
        }
        Err(SwlError::NotFound)
    }

    /// Re-parses the path used by the last successful `load_file`.
    pub fn reload(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(SwlError::InvalidArg)?;
        self.load_file(path)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Fires every watch once per key present after a successful reload,
    /// matching the original's "watches fire per-key during the
    /// populating phase" note.
    fn notify_full_reload(&mut self) {
        let keys: Vec<String> = self.entries.iter().map(|(k, _)| k.clone()).collect();
        for key in keys {
            self.notify(&key);
        }
    }
}

fn parse_hex_color(s: &str) -> Option<[f32; 4]> {
    let hex = s.strip_prefix('#')?;
    let (r, g, b, a) = match hex.len() {
        6 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
            255,
        ),
        8 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
            u8::from_str_radix(&hex[6..8], 16).ok()?,
        ),
        _ => return None,
    };
    Some([
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ])
}

fn flatten_keybinding_value(cfg: &mut ConfigStore, full_key: &str, tbl: &toml::value::Table) {
    let Some(action) = tbl.get("action").and_then(|v| v.as_str()) else {
        return;
    };

    if let Some(cmd) = tbl.get("command").and_then(|v| v.as_array()) {
        let joined: Vec<&str> = cmd.iter().filter_map(|v| v.as_str()).collect();
        cfg.set_string(full_key, format!("{action}:{}", joined.join(" ")));
        return;
    }

    match tbl.get("arg") {
        Some(toml::Value::String(s)) => cfg.set_string(full_key, format!("{action}:{s}")),
        Some(toml::Value::Integer(i)) => cfg.set_string(full_key, format!("{action}:{i}")),
        Some(toml::Value::Float(f)) => cfg.set_string(full_key, format!("{action}:{f}")),
        _ => cfg.set_string(full_key, action.to_string()),
    }
}

fn flatten_array(cfg: &mut ConfigStore, arr: &[toml::Value], prefix: &str) {
    for (i, elem) in arr.iter().enumerate() {
        let toml::Value::Table(tbl) = elem else {
            // scalar arrays are not flattened into the store
            continue;
        };

        if prefix == "monitors" {
            if let Some(name) = tbl.get("name").and_then(|v| v.as_str()) {
                flatten_table(cfg, tbl, &format!("{prefix}.{name}"));
                continue;
            }
        }

        flatten_table(cfg, tbl, &format!("{prefix}.{i}"));
    }
}

fn flatten_table(cfg: &mut ConfigStore, tbl: &toml::value::Table, prefix: &str) {
    let is_keybinding = prefix == "keybindings" || prefix == "buttons";

    for (key, value) in tbl {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            toml::Value::Table(sub) => {
                if is_keybinding {
                    flatten_keybinding_value(cfg, &full_key, sub);
                } else {
                    flatten_table(cfg, sub, &full_key);
                }
            }
            toml::Value::Array(arr) => flatten_array(cfg, arr, &full_key),
            toml::Value::String(s) => match parse_hex_color(s) {
                Some(rgba) => cfg.set_color(&full_key, rgba),
                None => cfg.set_string(&full_key, s.clone()),
            },
            toml::Value::Boolean(b) => cfg.set_bool(&full_key, *b),
            toml::Value::Integer(i) => cfg.set_int(&full_key, *i),
            toml::Value::Float(f) => cfg.set_float(&full_key, *f as f32),
            toml::Value::Datetime(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars() {
        let mut cfg = ConfigStore::new();
        cfg.set_int("a.b", 1);
        assert_eq!(cfg.get_int("a.b", 0), 1);
        assert_eq!(cfg.get_string("a.b", "x"), "x");
    }

    #[test]
    fn missing_key_returns_default() {
        let cfg = ConfigStore::new();
        assert_eq!(cfg.get_int("nope", 42), 42);
    }

    #[test]
    fn flattens_nested_tables() {
        let mut cfg = ConfigStore::new();
        let toml_src = r#"
            [appearance]
            mfact = 0.55

            [appearance.colors]
            border_focused = "#ff0000"
        "#;
        let doc: toml::Value = toml::from_str(toml_src).unwrap();
        if let toml::Value::Table(t) = doc {
            flatten_table(&mut cfg, &t, "");
        }
        assert_eq!(cfg.get_float("appearance.mfact", 0.0), 0.55);
        assert_eq!(
            cfg.get_color("appearance.colors.border_focused"),
            Some([1.0, 0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn flattens_monitors_array_by_name() {
        let mut cfg = ConfigStore::new();
        let toml_src = r#"
            [[monitors]]
            name = "DP-1"
            scale = 2.0
        "#;
        let doc: toml::Value = toml::from_str(toml_src).unwrap();
        if let toml::Value::Table(t) = doc {
            flatten_table(&mut cfg, &t, "");
        }
        assert_eq!(cfg.get_float("monitors.DP-1.scale", 0.0), 2.0);
    }

    #[test]
    fn collapses_keybinding_inline_table() {
        let mut cfg = ConfigStore::new();
        let toml_src = r#"
            [keybindings]
            "super+q" = { action = "close" }
            "super+return" = { action = "spawn", command = ["foot"] }
        "#;
        let doc: toml::Value = toml::from_str(toml_src).unwrap();
        if let toml::Value::Table(t) = doc {
            flatten_table(&mut cfg, &t, "");
        }
        assert_eq!(cfg.get_string("keybindings.super+q", ""), "close");
        assert_eq!(cfg.get_string("keybindings.super+return", ""), "spawn:foot");
    }

    #[test]
    fn reload_failure_leaves_prior_state() {
        let dir = std::env::temp_dir().join(format!("swl-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "general.layout = \"tile\"\n").unwrap();

        let mut cfg = ConfigStore::new();
        cfg.load_file(&path).unwrap();
        assert_eq!(cfg.get_string("general.layout", ""), "tile");

        std::fs::write(&path, "not valid toml [[[").unwrap();
        assert!(cfg.reload().is_err());
        assert_eq!(cfg.get_string("general.layout", ""), "tile");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn watch_fires_for_matching_prefix() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut cfg = ConfigStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        cfg.watch(Some("appearance."), move |k| seen2.borrow_mut().push(k.to_string()));

        cfg.set_float("appearance.mfact", 0.6);
        cfg.set_int("keyboard.repeat_rate", 25);

        assert_eq!(*seen.borrow(), vec!["appearance.mfact".to_string()]);
    }
}
