use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Number;

/// Property map of a Notion page, keyed by property name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single typed page property, serialized in the shape the Notion API
/// expects, e.g. `{"select": {"name": "Running"}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Select(SelectOption),
    Url(String),
    Number(Number),
    Date(DateValue),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateValue {
    pub start: String,
}

impl RichText {
    fn plain(content: &str) -> Self {
        RichText {
            text: TextContent {
                content: content.to_string(),
            },
        }
    }
}

impl PropertyValue {
    pub fn title(content: &str) -> Self {
        PropertyValue::Title(vec![RichText::plain(content)])
    }

    pub fn rich_text(content: &str) -> Self {
        PropertyValue::RichText(vec![RichText::plain(content)])
    }

    /// Clears a rich text property when written with an update.
    pub fn empty_rich_text() -> Self {
        PropertyValue::RichText(vec![])
    }

    pub fn select(name: &str) -> Self {
        PropertyValue::Select(SelectOption {
            name: name.to_string(),
        })
    }

    pub fn url(url: &str) -> Self {
        PropertyValue::Url(url.to_string())
    }

    pub fn number(value: impl Into<Number>) -> Self {
        PropertyValue::Number(value.into())
    }

    pub fn date(at: DateTime<Utc>) -> Self {
        PropertyValue::Date(DateValue {
            start: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Text of a title or rich text property, segments concatenated.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            PropertyValue::Title(parts) | PropertyValue::RichText(parts) => {
                Some(parts.iter().map(|p| p.text.content.as_str()).collect())
            }
            _ => None,
        }
    }
}
