//! Static English → Chinese ingredient dictionary.
//!
//! The dictionary is built once at startup and never mutated afterwards.
//! Entries keep their declaration order because the partial-match scan
//! returns the first entry that matches.

use crate::config::Config;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Built-in translations for common ingredients.
///
/// `pepper`, `garlic` and `onion` are declared twice; the later value wins
/// but the entry stays at its first position.
const BUILTIN: &[(&str, &str)] = &[
    // Meat & Poultry
    ("chicken", "鸡肉"),
    ("beef", "牛肉"),
    ("beef ribs", "牛排骨"),
    ("pork", "猪肉"),
    ("lamb", "羊肉"),
    ("turkey", "火鸡"),
    ("duck", "鸭肉"),
    ("fish", "鱼"),
    ("salmon", "三文鱼"),
    ("tuna", "金枪鱼"),
    ("shrimp", "虾"),
    ("crab", "螃蟹"),
    ("lobster", "龙虾"),
    // Vegetables
    ("tomato", "西红柿"),
    ("onion", "洋葱"),
    ("garlic", "大蒜"),
    ("potato", "土豆"),
    ("carrot", "胡萝卜"),
    ("broccoli", "西兰花"),
    ("lettuce", "生菜"),
    ("cabbage", "卷心菜"),
    ("spinach", "菠菜"),
    ("mushroom", "蘑菇"),
    ("pepper", "辣椒"),
    ("cucumber", "黄瓜"),
    ("eggplant", "茄子"),
    ("corn", "玉米"),
    ("peas", "豌豆"),
    ("beans", "豆类"),
    // Fruits
    ("apple", "苹果"),
    ("banana", "香蕉"),
    ("orange", "橙子"),
    ("lemon", "柠檬"),
    ("grape", "葡萄"),
    ("strawberry", "草莓"),
    ("blueberry", "蓝莓"),
    ("cherry", "樱桃"),
    ("peach", "桃子"),
    ("pear", "梨"),
    // Grains & Starches
    ("rice", "米饭"),
    ("noodle", "面条"),
    ("pasta", "意大利面"),
    ("bread", "面包"),
    ("flour", "面粉"),
    ("oats", "燕麦"),
    ("quinoa", "藜麦"),
    // Dairy & Eggs
    ("milk", "牛奶"),
    ("cheese", "奶酪"),
    ("yogurt", "酸奶"),
    ("butter", "黄油"),
    ("egg", "鸡蛋"),
    ("cream", "奶油"),
    // Spices & Seasonings
    ("salt", "盐"),
    ("pepper", "胡椒"),
    ("sugar", "糖"),
    ("honey", "蜂蜜"),
    ("oil", "油"),
    ("vinegar", "醋"),
    ("soy sauce", "酱油"),
    ("ginger", "姜"),
    ("garlic", "大蒜"),
    ("onion", "洋葱"),
    // Common cooking terms
    ("water", "水"),
    ("soup", "汤"),
    ("sauce", "酱"),
    ("spice", "香料"),
    ("herb", "香草"),
    ("seasoning", "调料"),
];

/// Lowercase and trim a term into its lookup/cache key
pub fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Ordered, immutable ingredient dictionary
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Dictionary {
    /// The built-in common ingredient table
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN.iter().copied())
    }

    /// Built-in table, with `DICTIONARY_PATH` layered on top when set
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut dictionary = Self::builtin();

        if let Some(path) = &config.dictionary_path {
            let extra = Self::load_json(path)?;
            info!("Loaded {} extra dictionary entries from {}", extra.len(), path);
            dictionary.extend(extra);
        }

        Ok(dictionary)
    }

    /// Build a dictionary from ordered pairs. Keys are normalized.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut dictionary = Self::default();
        for (english, chinese) in entries {
            dictionary.insert(normalize(english.as_ref()), chinese.into());
        }
        dictionary
    }

    /// Load a JSON object of `"english": "chinese"` pairs, keeping file order
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary file {}", path.display()))?;

        // Read as ordered pairs; a HashMap would lose file order
        let pairs: OrderedPairs = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dictionary file {}", path.display()))?;

        for (english, chinese) in &pairs.0 {
            if english.trim().is_empty() {
                bail!("Dictionary file {} contains an empty key", path.display());
            }
            if chinese.trim().is_empty() {
                bail!(
                    "Dictionary file {} has an empty translation for '{}'",
                    path.display(),
                    english
                );
            }
        }

        Ok(Self::from_entries(pairs.0))
    }

    /// Layer `other` over this dictionary. Overridden keys keep their
    /// position; new keys are appended.
    pub fn extend(&mut self, other: Dictionary) {
        for (english, chinese) in other.entries {
            self.insert(english, chinese);
        }
    }

    fn insert(&mut self, english: String, chinese: String) {
        match self.index.get(&english) {
            Some(&position) => self.entries[position].1 = chinese,
            None => {
                self.index.insert(english.clone(), self.entries.len());
                self.entries.push((english, chinese));
            }
        }
    }

    /// Exact lookup of a normalized term
    pub fn exact(&self, term: &str) -> Option<&str> {
        self.index
            .get(term)
            .map(|&position| self.entries[position].1.as_str())
    }

    /// First entry, in declaration order, whose key contains the term or is
    /// contained by it
    pub fn partial(&self, term: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(english, _)| term.contains(english.as_str()) || english.contains(term))
            .map(|(_, chinese)| chinese.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(e, c)| (e.as_str(), c.as_str()))
    }
}

/// JSON object read as an ordered list of key/value pairs
struct OrderedPairs(Vec<(String, String)>);

impl<'de> serde::Deserialize<'de> for OrderedPairs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> serde::de::Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON object mapping English terms to Chinese terms")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((english, chinese)) = map.next_entry::<String, String>()? {
                    pairs.push((english, chinese));
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}
