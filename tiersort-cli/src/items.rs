/// Item list parsing.
///
/// Accepts a JSON array (of names, or of `{"name", "category"}` objects) or
/// plain text with one item per line, optionally `name | category`.
use serde::{Deserialize, Serialize};
use tiersort_core::primary_category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    /// Primary category, already folded. Empty input becomes "Uncategorised".
    pub category: String,
}

impl ItemRecord {
    pub fn new(name: &str, category: &str) -> Self {
        ItemRecord {
            name: name.trim().to_string(),
            category: primary_category(category).to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonItem {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        category: String,
    },
}

/// One plain-text entry: `name` or `name | category`.
pub fn parse_line(line: &str) -> ItemRecord {
    match line.split_once('|') {
        Some((name, category)) => ItemRecord::new(name, category),
        None => ItemRecord::new(line, ""),
    }
}

/// Parse an item list. Blank names are dropped.
pub fn parse_items(content: &str) -> Result<Vec<ItemRecord>, String> {
    let trimmed = content.trim();
    let items: Vec<ItemRecord> = if trimmed.starts_with('[') {
        let raw: Vec<JsonItem> = serde_json::from_str(trimmed)
            .map_err(|e| format!("File looks like JSON but failed to parse: {e}"))?;
        raw.into_iter()
            .map(|item| match item {
                JsonItem::Name(name) => ItemRecord::new(&name, ""),
                JsonItem::Full { name, category } => ItemRecord::new(&name, &category),
            })
            .collect()
    } else {
        trimmed.lines().map(parse_line).collect()
    };

    Ok(items.into_iter().filter(|item| !item.name.is_empty()).collect())
}
