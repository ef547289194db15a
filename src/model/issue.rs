use serde::{Deserialize, Serialize};

/// Issue as returned by a search. Only enough to build the readable ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Database ID used for detail lookups and commands. Missing on partially resolved results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub number_in_project: u64,
    #[serde(default)]
    pub summary: String,
}

impl Issue {
    /// `PROJECT-NUMBER`, the identifier persisted into task lines.
    pub fn readable_id(&self, project: &str) -> String {
        format!("{project}-{}", self.number_in_project)
    }
}

/// Full issue record fetched by ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueDetail {
    #[serde(default)]
    pub id: String,
    /// Creation time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<CustomField>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    #[serde(default)]
    pub presentation: Option<String>,
    #[serde(default)]
    pub minutes: Option<i64>,
}

/// Project-specific issue attribute, discriminated by the tracker's `$type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum CustomField {
    SingleEnumIssueCustomField {
        name: String,
        #[serde(default)]
        value: Option<NamedValue>,
    },
    SingleOwnedIssueCustomField {
        name: String,
        #[serde(default)]
        value: Option<NamedValue>,
    },
    PeriodIssueCustomField {
        name: String,
        #[serde(default)]
        value: Option<PeriodValue>,
    },
    DateIssueCustomField {
        name: String,
        #[serde(default)]
        value: Option<i64>,
    },
    SimpleIssueCustomField {
        name: String,
        #[serde(default)]
        value: Option<serde_json::Value>,
    },
    #[serde(other)]
    Unsupported,
}

impl CustomField {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::SingleEnumIssueCustomField { name, .. }
            | Self::SingleOwnedIssueCustomField { name, .. }
            | Self::PeriodIssueCustomField { name, .. }
            | Self::DateIssueCustomField { name, .. }
            | Self::SimpleIssueCustomField { name, .. } => Some(name),
            Self::Unsupported => None,
        }
    }

    /// Display text of enum, owned and period fields.
    pub fn text_value(&self) -> Option<&str> {
        match self {
            Self::SingleEnumIssueCustomField { value, .. }
            | Self::SingleOwnedIssueCustomField { value, .. } => {
                value.as_ref().map(|v| v.name.as_str())
            }
            Self::PeriodIssueCustomField { value, .. } => {
                value.as_ref().and_then(|v| v.presentation.as_deref())
            }
            _ => None,
        }
    }

    /// Numeric value of date fields (epoch millis) and numeric simple fields.
    pub fn number_value(&self) -> Option<i64> {
        match self {
            Self::DateIssueCustomField { value, .. } => *value,
            Self::SimpleIssueCustomField { value, .. } => value.as_ref().and_then(|v| v.as_i64()),
            _ => None,
        }
    }
}

impl IssueDetail {
    pub fn field(&self, name: &str) -> Option<&CustomField> {
        self.fields
            .as_ref()?
            .iter()
            .find(|f| f.name() == Some(name))
    }

    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(CustomField::text_value)
    }

    pub fn number_field(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(CustomField::number_value)
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().flatten().map(|t| t.name.as_str())
    }
}
