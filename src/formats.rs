use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub synopsis: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorksFile {
    #[serde(default, deserialize_with = "loose_list")]
    pub works: Vec<WorkRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WritingsFile {
    #[serde(default, deserialize_with = "loose_list")]
    pub writings: Vec<WritingRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hero: Hero,
    /// Platform name (`wattpad`, `kbm`, ...) to URL.
    #[serde(default, deserialize_with = "loose_links")]
    pub platforms: BTreeMap<String, String>,
    /// Social network name (`instagram`, `tiktok`, ...) to URL.
    #[serde(default, deserialize_with = "loose_links")]
    pub socials: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hero {
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub intro: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub youtube_embed: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default, deserialize_with = "loose_string")]
    pub site_title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub meta_description: Option<String>,
}

/// Content files are hand-edited, so scalar fields may arrive as numbers or
/// booleans. Those are coerced to their string form; anything else is absent.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value))
}

fn loose_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    match Option::<Vec<T>>::deserialize(deserializer)? {
        Some(items) => Ok(items),
        None => Ok(Vec::new()),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn loose_links<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(name, url)| scalar_to_string(url).map(|url| (name, url)))
        .collect())
}

fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_tolerate_missing_and_non_string_fields() -> anyhow::Result<()> {
        let file: WorksFile = serde_json::from_str(
            r#"{"works":[{"slug":"sunset","title":42,"status":null,"extra":[1,2]}]}"#,
        )?;

        assert_eq!(file.works.len(), 1);
        let work = &file.works[0];
        assert_eq!(work.slug.as_deref(), Some("sunset"));
        assert_eq!(work.title.as_deref(), Some("42"));
        assert_eq!(work.status, None);
        assert_eq!(work.cover, None);
        Ok(())
    }

    #[test]
    fn missing_or_null_collection_is_empty() -> anyhow::Result<()> {
        let missing: WritingsFile = serde_json::from_str("{}")?;
        let null: WritingsFile = serde_json::from_str(r#"{"writings":null}"#)?;
        assert!(missing.writings.is_empty());
        assert!(null.writings.is_empty());
        Ok(())
    }

    #[test]
    fn home_links_skip_null_entries() -> anyhow::Result<()> {
        let home: HomeContent = serde_json::from_str(
            r#"{
                "hero": {"title": "Titik Fiksi"},
                "platforms": {"wattpad": "https://wattpad.com/x", "kbm": null},
                "socials": "not-an-object"
            }"#,
        )?;

        assert_eq!(home.hero.title.as_deref(), Some("Titik Fiksi"));
        assert_eq!(home.platforms.len(), 1);
        assert!(home.socials.is_empty());
        Ok(())
    }
}
