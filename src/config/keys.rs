// SPDX-License-Identifier: GPL-3.0-only

//! Modifier/keysym/button name parsing and keybinding table construction.
//! Table-driven per the "closed-set enums with many string aliases"
//! re-architecture note: the alias table sits right beside the match.

use crate::config::ConfigStore;
use crate::input::Mods;
use smithay::input::keyboard::xkb;

pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;
pub const BTN_MIDDLE: u32 = 0x112;
pub const BTN_SIDE: u32 = 0x113;
pub const BTN_EXTRA: u32 = 0x114;

#[derive(Debug, Clone)]
pub struct Keybinding {
    pub mods: Mods,
    pub keysym: u32,
    pub action: String,
    pub arg: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ButtonBinding {
    pub mods: Mods,
    pub button: u32,
    pub action: String,
    pub arg: Option<String>,
}

/// Reads `general.modkey` (`super`/`logo` → Logo, `ctrl` → Ctrl, anything
/// else including the default → Alt).
pub fn configured_modkey(cfg: &ConfigStore) -> Mods {
    match cfg.get_string("general.modkey", "alt").to_lowercase().as_str() {
        "super" | "logo" => Mods { logo: true, ..Default::default() },
        "ctrl" => Mods { ctrl: true, ..Default::default() },
        _ => Mods { alt: true, ..Default::default() },
    }
}

/// Parses `"mod+shift+ctrl"`-style modifier prefixes. Unrecognized tokens
/// are assumed to be the key/button name and are ignored here; the caller
/// extracts the name separately via [`extract_name`].
pub fn parse_modifiers(spec: &str, modkey: Mods) -> Mods {
    let mut mods = Mods::default();
    for token in spec.split('+') {
        match token.trim().to_lowercase().as_str() {
            "mod" => mods = or_mods(mods, modkey),
            "super" | "logo" | "mod4" | "win" => mods.logo = true,
            "shift" => mods.shift = true,
            "ctrl" | "control" => mods.ctrl = true,
            "alt" | "mod1" => mods.alt = true,
            _ => {}
        }
    }
    mods
}

fn or_mods(a: Mods, b: Mods) -> Mods {
    Mods {
        shift: a.shift || b.shift,
        ctrl: a.ctrl || b.ctrl,
        alt: a.alt || b.alt,
        logo: a.logo || b.logo,
    }
}

/// The key/button name is everything after the last `+`.
pub fn extract_name(spec: &str) -> &str {
    spec.rsplit('+').next().unwrap_or(spec)
}

/// Resolves a key name to a keysym value, trying XKB's name table first
/// and then a handful of common aliases.
pub fn parse_keysym(name: &str) -> Option<u32> {
    let sym = xkb::keysym_from_name(name, xkb::KEYSYM_CASE_INSENSITIVE);
    if sym.raw() != xkb::KEY_NoSymbol {
        return Some(sym.raw());
    }
    match name.to_lowercase().as_str() {
        "enter" => Some(xkb::keysyms::KEY_Return),
        "esc" => Some(xkb::keysyms::KEY_Escape),
        "del" => Some(xkb::keysyms::KEY_Delete),
        "backspace" => Some(xkb::keysyms::KEY_BackSpace),
        _ => None,
    }
}

pub fn parse_button(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "left" => Some(BTN_LEFT),
        "middle" => Some(BTN_MIDDLE),
        "right" => Some(BTN_RIGHT),
        "side" => Some(BTN_SIDE),
        "extra" => Some(BTN_EXTRA),
        _ => None,
    }
}

fn split_action_arg(value: &str) -> (String, Option<String>) {
    match value.split_once(':') {
        Some((action, arg)) => (action.to_string(), Some(arg.to_string())),
        None => (value.to_string(), None),
    }
}

/// Loads every `keybindings.*` entry. Unknown key names are logged and
/// skipped, never fatal.
pub fn load_keybindings_from_config(cfg: &ConfigStore) -> Vec<Keybinding> {
    let modkey = configured_modkey(cfg);
    let mut out = Vec::new();
    for key in cfg.keys("keybindings.") {
        let binding_key = &key[("keybindings.".len())..];
        let value = cfg.get_string(key, "");
        if value.is_empty() {
            continue;
        }
        let (action, arg) = split_action_arg(&value);
        let mods = parse_modifiers(binding_key, modkey);
        let name = extract_name(binding_key);
        match parse_keysym(name) {
            Some(keysym) => out.push(Keybinding { mods, keysym, action, arg }),
            None => tracing::warn!(key = %binding_key, "unknown key name in keybinding"),
        }
    }
    out
}

pub fn load_buttons_from_config(cfg: &ConfigStore) -> Vec<ButtonBinding> {
    let modkey = configured_modkey(cfg);
    let mut out = Vec::new();
    for key in cfg.keys("buttons.") {
        let binding_key = &key[("buttons.".len())..];
        let value = cfg.get_string(key, "");
        if value.is_empty() {
            continue;
        }
        let (action, arg) = split_action_arg(&value);
        let mods = parse_modifiers(binding_key, modkey);
        let name = extract_name(binding_key);
        match parse_button(name) {
            Some(button) => out.push(ButtonBinding { mods, button, action, arg }),
            None => tracing::warn!(key = %binding_key, "unknown button name in binding"),
        }
    }
    out
}

/// Built-in default keybindings, installed only when the config store has
/// no `keybindings.*` entries at all.
pub fn default_keybindings() -> Vec<Keybinding> {
    use xkb::keysyms::*;

    let mod_ = Mods { alt: true, ..Default::default() };
    let mod_shift = Mods { alt: true, shift: true, ..Default::default() };

    let kb = |mods: Mods, keysym: u32, action: &str, arg: Option<&str>| Keybinding {
        mods,
        keysym,
        action: action.to_string(),
        arg: arg.map(str::to_string),
    };

    vec![
        kb(mod_shift, KEY_q, "quit", None),
        kb(mod_shift, KEY_Return, "spawn", Some("foot")),
        kb(mod_, KEY_Return, "spawn", Some("foot")),
        kb(mod_shift, KEY_c, "close", None),
        kb(mod_, KEY_j, "focus-next", None),
        kb(mod_, KEY_k, "focus-prev", None),
        kb(mod_, KEY_space, "toggle-floating", None),
        kb(mod_, KEY_f, "toggle-fullscreen", None),
        kb(mod_, KEY_s, "set-layout", Some("scroller")),
        kb(mod_, KEY_z, "zoom", None),
        kb(mod_, KEY_l, "inc-mfact", None),
        kb(mod_, KEY_h, "dec-mfact", None),
        kb(mod_, KEY_i, "inc-nmaster", None),
        kb(mod_, KEY_d, "dec-nmaster", None),
        kb(mod_, KEY_comma, "focus-monitor", Some("-1")),
        kb(mod_, KEY_period, "focus-monitor", Some("1")),
        kb(mod_shift, KEY_comma, "send-monitor", Some("-1")),
        kb(mod_shift, KEY_period, "send-monitor", Some("1")),
        kb(mod_, KEY_Up, "focusdir", Some("up")),
        kb(mod_, KEY_Down, "focusdir", Some("down")),
        kb(mod_, KEY_Left, "focusdir", Some("left")),
        kb(mod_, KEY_Right, "focusdir", Some("right")),
    ]
}

pub fn default_buttons() -> Vec<ButtonBinding> {
    let mod_ = Mods { alt: true, ..Default::default() };
    vec![
        ButtonBinding { mods: mod_, button: BTN_LEFT, action: "moveresize".into(), arg: Some("move".into()) },
        ButtonBinding { mods: mod_, button: BTN_MIDDLE, action: "toggle-floating".into(), arg: None },
        ButtonBinding { mods: mod_, button: BTN_RIGHT, action: "moveresize".into(), arg: Some("resize".into()) },
    ]
}

/// Always installed regardless of config: Ctrl+Alt+F1..F12 → `chvt N`.
pub fn chvt_bindings() -> Vec<Keybinding> {
    use xkb::keysyms::*;
    let mods = Mods { ctrl: true, alt: true, ..Default::default() };
    let syms = [
        KEY_XF86Switch_VT_1,
        KEY_XF86Switch_VT_2,
        KEY_XF86Switch_VT_3,
        KEY_XF86Switch_VT_4,
        KEY_XF86Switch_VT_5,
        KEY_XF86Switch_VT_6,
        KEY_XF86Switch_VT_7,
        KEY_XF86Switch_VT_8,
        KEY_XF86Switch_VT_9,
        KEY_XF86Switch_VT_10,
        KEY_XF86Switch_VT_11,
        KEY_XF86Switch_VT_12,
    ];
    syms.into_iter()
        .enumerate()
        .map(|(i, sym)| Keybinding {
            mods,
            keysym: sym,
            action: "chvt".to_string(),
            arg: Some((i + 1).to_string()),
        })
        .collect()
}

/// Builds the full keybinding/button tables per the binding-source rule:
/// config entries load exclusively when present, otherwise the built-in
/// default set; the chvt bindings are always appended.
pub fn load_bindings(cfg: &ConfigStore) -> (Vec<Keybinding>, Vec<ButtonBinding>) {
    let has_config_keybindings = !cfg.keys("keybindings.").is_empty();

    let (mut keys, buttons) = if has_config_keybindings {
        (load_keybindings_from_config(cfg), load_buttons_from_config(cfg))
    } else {
        (default_keybindings(), default_buttons())
    };

    keys.extend(chvt_bindings());
    (keys, buttons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_modifiers() {
        let modkey = Mods { alt: true, ..Default::default() };
        let mods = parse_modifiers("mod+shift+ctrl+q", modkey);
        assert!(mods.alt && mods.shift && mods.ctrl && !mods.logo);
    }

    #[test]
    fn logo_aliases_are_equivalent() {
        let modkey = Mods::default();
        for alias in ["super", "logo", "mod4", "win"] {
            let mods = parse_modifiers(&format!("{alias}+q"), modkey);
            assert!(mods.logo, "{alias} should map to logo");
        }
    }

    #[test]
    fn extract_name_takes_last_segment() {
        assert_eq!(extract_name("mod+shift+Return"), "Return");
        assert_eq!(extract_name("q"), "q");
    }

    #[test]
    fn unknown_button_name_is_none() {
        assert_eq!(parse_button("banana"), None);
    }

    #[test]
    fn config_keybindings_take_exclusive_precedence() {
        let mut cfg = ConfigStore::new();
        cfg.set_string("keybindings.mod+q", "close");
        let (keys, _) = load_bindings(&cfg);
        // only the one configured binding plus the always-on chvt set
        assert_eq!(keys.len(), 1 + chvt_bindings().len());
    }
}
