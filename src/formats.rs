use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// `data/burger-of-the-day.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurgerDataFile {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub scraped_at: String,
    pub records: Vec<BurgerRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvmaze: Option<TvmazeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmazeSummary {
    #[serde(default)]
    pub show_query: String,
    #[serde(default)]
    pub retrieved_at: String,
    #[serde(default)]
    pub show_id: Option<u64>,
    #[serde(default)]
    pub show_name: Option<String>,
    #[serde(default)]
    pub episode_count: Option<u64>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub match_counts: BTreeMap<String, u64>,
}

/// One scraped appearance of a burger of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurgerRecord {
    pub season: u32,
    pub episode_title: String,
    #[serde(default)]
    pub episode_url: Option<String>,
    pub burger_of_the_day: String,
    #[serde(default)]
    pub burger_name: Option<String>,
    #[serde(default)]
    pub burger_description: Option<String>,
    #[serde(default)]
    pub tvmaze_episode_id: Option<u64>,
    #[serde(default)]
    pub tvmaze_episode_name: Option<String>,
    #[serde(default)]
    pub tvmaze_episode_number: Option<u32>,
    #[serde(default)]
    pub tvmaze_episode_url: Option<String>,
    #[serde(default)]
    pub tvmaze_match_type: MatchType,
    #[serde(default)]
    pub tvmaze_match_score: Option<f64>,
}

/// How the upstream matcher tied a record to a TVMaze episode. Unknown labels
/// are kept verbatim instead of failing the whole document; `null` and `""`
/// read as [`MatchType::Missing`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum MatchType {
    Exact,
    Fuzzy,
    #[default]
    Missing,
    Other(String),
}

impl MatchType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Missing => "missing",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for MatchType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "exact" => Self::Exact,
            "fuzzy" => Self::Fuzzy,
            "missing" => Self::Missing,
            _ => Self::Other(label),
        }
    }
}

impl From<Option<String>> for MatchType {
    fn from(label: Option<String>) -> Self {
        match label {
            Some(label) if !label.is_empty() => Self::from(label),
            _ => Self::Missing,
        }
    }
}

impl From<MatchType> for String {
    fn from(match_type: MatchType) -> Self {
        match match_type {
            MatchType::Other(label) => label,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `data/burger-of-the-day-context.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurgerContextFile {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub scraped_at: String,
    #[serde(default)]
    pub records: Vec<BurgerContextRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurgerContextRecord {
    pub season: u32,
    pub episode_title: String,
    #[serde(default)]
    pub episode_url: Option<String>,
    pub burger_of_the_day: String,
    #[serde(default)]
    pub burger_name: Option<String>,
    #[serde(default)]
    pub burger_description: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// `data/tvmaze-episodes.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvmazePayload {
    #[serde(default)]
    pub show_query: String,
    #[serde(default)]
    pub retrieved_at: String,
    #[serde(default)]
    pub show: serde_json::Map<String, serde_json::Value>,
    pub episodes: Vec<TvmazeEpisode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvmazeEpisode {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub name: String,
    pub season: u32,
    /// Specials carry no number.
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub airdate: Option<String>,
    #[serde(default)]
    pub airtime: Option<String>,
    #[serde(default)]
    pub airstamp: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EpisodeImage>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}
