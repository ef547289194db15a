use std::collections::HashMap;

use tracing::warn;

use crate::config::DEFAULT_STATUS_MAPPING;

/// Checkbox symbol used when no type mapping applies.
pub const BLANK: &str = " ";

/// Issue type name to the character shown inside the checkbox brackets.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSymbols(HashMap<String, String>);

impl StatusSymbols {
    pub fn defaults() -> Self {
        Self(HashMap::from(
            [
                ("Epic", "*"),
                ("Task", " "),
                ("Bug", "d"),
                ("Feature", "I"),
                ("User Story", "n"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        ))
    }

    /// Parse the user's JSON mapping. Empty or malformed input yields the defaults.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::defaults();
        }
        match serde_json::from_str::<HashMap<String, String>>(raw) {
            Ok(map) => {
                let valid = map
                    .into_iter()
                    .filter(|(name, symbol)| {
                        let ok = is_checkbox_symbol(symbol);
                        if !ok {
                            warn!(issue_type = %name, symbol = %symbol, "ignoring status symbol, expected a single character");
                        }
                        ok
                    })
                    .collect();
                Self(valid)
            }
            Err(err) => {
                warn!(error = %err, default = DEFAULT_STATUS_MAPPING, "custom statuses mapping is not a JSON object of strings, using defaults");
                Self::defaults()
            }
        }
    }

    pub fn symbol_for(&self, issue_type: &str) -> Option<&str> {
        self.0.get(issue_type).map(String::as_str)
    }
}

fn is_checkbox_symbol(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c != ']' && c != '\n')
}

/// Priority name to its task glyph. `Undefined` and unknown names have none.
pub fn priority_glyph(priority: &str) -> Option<&'static str> {
    match priority {
        "Critical" => Some("🔺"),
        "High" => Some("⏫"),
        "Normal" => Some("🔼"),
        "Low" => Some("🔽"),
        "Minimal" => Some("⏬"),
        _ => None,
    }
}
