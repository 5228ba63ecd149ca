//! Location string codec.
//!
//! A location has the shape `#<locator>?<name>=<value>?<name>=<value>...`.
//! The locator is a decimal page ordinal or a keyword; the `?`-separated
//! tail carries the sticky session settings in insertion order.
//!
//! ```
//! use slidedeck::nav::location::{Location, Locator};
//!
//! let loc = Location::decode("#intro?view=grid?tb=0");
//! assert_eq!(loc.locator, Some(Locator::Keyword("intro".into())));
//! assert_eq!(loc.setting("view"), Some("grid"));
//! assert_eq!(Location::decode(&loc.encode()), loc);
//! ```

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters escaped inside locator, setting names and setting values.
const COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'#')
    .add(b'%')
    .add(b'=')
    .add(b'?')
    .add(b'"')
    .add(b'<')
    .add(b'>');

/// The "where" part of a location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Ordinal(usize),
    Keyword(String),
}

impl Locator {
    /// Interpret a decoded locator token. All-digit tokens are ordinals.
    pub fn parse(token: &str) -> Option<Locator> {
        if token.is_empty() {
            return None;
        }
        if token.bytes().all(|b| b.is_ascii_digit())
            && let Ok(n) = token.parse::<usize>()
        {
            return Some(Locator::Ordinal(n));
        }
        Some(Locator::Keyword(token.to_string()))
    }

    /// The token as the resolver sees it (keyword or decimal ordinal).
    pub fn token(&self) -> String {
        match self {
            Locator::Ordinal(n) => n.to_string(),
            Locator::Keyword(k) => k.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Ordinal(n) => write!(f, "{n}"),
            Locator::Keyword(k) => write!(f, "{}", utf8_percent_encode(k, COMPONENT)),
        }
    }
}

/// Session settings that persist in the location string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    /// View mode (`view`).
    View,
    /// Index window open (`iw`).
    IndexWindow,
    /// Toolbar visible (`tb`).
    Toolbar,
    /// Debug console visible (`dc`).
    DebugConsole,
    /// Presentation language (`lang`).
    Lang,
}

impl Setting {
    pub const ALL: [Setting; 5] = [
        Setting::View,
        Setting::IndexWindow,
        Setting::Toolbar,
        Setting::DebugConsole,
        Setting::Lang,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Setting::View => "view",
            Setting::IndexWindow => "iw",
            Setting::Toolbar => "tb",
            Setting::DebugConsole => "dc",
            Setting::Lang => "lang",
        }
    }

    /// Look up a sticky setting by name.
    pub fn parse(name: &str) -> Option<Setting> {
        Setting::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Name of the pseudo-setting that drops a sticky setting.
pub const DROP: &str = "drop";

/// Ordered set of sticky settings.
///
/// Entries leave the set only through [`SessionSettings::remove`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    order: Vec<Setting>,
}

impl SessionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a setting at the end. Returns `false` if it was already present.
    pub fn insert(&mut self, setting: Setting) -> bool {
        if self.order.contains(&setting) {
            return false;
        }
        self.order.push(setting);
        true
    }

    /// Remove a setting. Returns `false` if it was absent.
    pub fn remove(&mut self, setting: Setting) -> bool {
        let before = self.order.len();
        self.order.retain(|s| *s != setting);
        self.order.len() != before
    }

    pub fn contains(&self, setting: Setting) -> bool {
        self.order.contains(&setting)
    }

    pub fn iter(&self) -> impl Iterator<Item = Setting> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A decoded location string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub locator: Option<Locator>,
    /// `name=value` pairs in the order they appear.
    pub settings: Vec<(String, String)>,
}

impl Location {
    pub fn new(locator: Option<Locator>) -> Self {
        Self {
            locator,
            settings: Vec::new(),
        }
    }

    pub fn with_setting(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.push((name.into(), value.into()));
        self
    }

    /// Value of the last occurrence of `name`.
    pub fn setting(&self, name: &str) -> Option<&str> {
        self.settings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Decode a location string. A leading `#` is optional.
    ///
    /// Settings entries without `=` are dropped; the value runs from the
    /// first `=` to the next `?`.
    pub fn decode(raw: &str) -> Location {
        let raw = raw.strip_prefix('#').unwrap_or(raw);
        let mut parts = raw.split('?');
        let locator = parts
            .next()
            .map(decode_component)
            .and_then(|token| Locator::parse(&token));

        let settings = parts
            .filter_map(|entry| {
                let (name, value) = entry.split_once('=')?;
                let name = decode_component(name);
                if name.is_empty() {
                    return None;
                }
                Some((name, decode_component(value)))
            })
            .collect();

        Location { locator, settings }
    }

    /// Encode into a location string beginning with `#`.
    pub fn encode(&self) -> String {
        let mut out = String::from("#");
        if let Some(locator) = &self.locator {
            out.push_str(&locator.to_string());
        }
        out.push_str(&self.encode_settings());
        out
    }

    /// The `?name=value...` tail alone.
    pub fn encode_settings(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.settings {
            out.push('?');
            out.extend(utf8_percent_encode(name, COMPONENT));
            out.push('=');
            out.extend(utf8_percent_encode(value, COMPONENT));
        }
        out
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
