use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::date::{format_episode_code, is_within_week_of_today, parse_airdate};
use crate::formats::{BurgerContextFile, BurgerDataFile, BurgerRecord, TvmazeEpisode, TvmazePayload};
use crate::slug::slugify;
use crate::text::{normalize_key, strip_html, strip_wrapping_quotes, to_sentence_case};

const UNKNOWN_BURGER: &str = "Unknown";

/// A burger record with its display fields normalized and derived keys attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurgerRecordView {
    #[serde(flatten)]
    pub record: BurgerRecord,
    pub burger_display: String,
    pub burger_slug: String,
    pub episode_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_notes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeView {
    #[serde(flatten)]
    pub episode: TvmazeEpisode,
    pub code: String,
    pub summary_text: String,
    pub rating_value: Option<f64>,
}

impl EpisodeView {
    pub fn new(episode: TvmazeEpisode) -> Self {
        Self {
            code: format_episode_code(episode.season, episode.number),
            summary_text: strip_html(episode.summary.as_deref()),
            rating_value: episode.rating.as_ref().and_then(|rating| rating.average),
            episode,
        }
    }

    fn sort_key(&self) -> (u32, u32) {
        (self.episode.season, self.episode.number.unwrap_or(0))
    }
}

/// One distinct slug with the display name it first appeared under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurgerSummary {
    pub slug: String,
    pub display: String,
    pub appearances: usize,
}

type ContextKey = (u32, String, String);

#[derive(Debug, Default)]
struct ContextIndex {
    notes: HashMap<ContextKey, Vec<String>>,
}

impl ContextIndex {
    fn new(file: Option<&BurgerContextFile>) -> Self {
        let mut notes = HashMap::new();
        for record in file.iter().flat_map(|file| &file.records) {
            let key = context_key(record.season, &record.episode_title, &record.burger_of_the_day);
            let record_notes = record
                .notes
                .iter()
                .map(|note| note.trim())
                .filter(|note| !note.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>();
            // An entry without notes must not hide an earlier one that has them.
            if !record_notes.is_empty() {
                notes.insert(key, record_notes);
            }
        }
        Self { notes }
    }

    fn notes_for(&self, record: &BurgerRecord) -> Option<Vec<String>> {
        let key = context_key(record.season, &record.episode_title, &record.burger_of_the_day);
        self.notes
            .get(&key)
            .filter(|notes| !notes.is_empty())
            .cloned()
    }
}

fn context_key(season: u32, episode_title: &str, burger_of_the_day: &str) -> ContextKey {
    (
        season,
        normalize_key(episode_title),
        normalize_key(burger_of_the_day),
    )
}

// `NAME (description)` -> `description`, only when `name` is a literal prefix.
fn trailing_parenthetical(burger_of_the_day: &str, name: &str) -> Option<String> {
    let rest = burger_of_the_day.strip_prefix(name)?.trim();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?.trim();
    (!inner.is_empty()).then(|| inner.to_owned())
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn build_record_view(record: &BurgerRecord, context: &ContextIndex) -> BurgerRecordView {
    let reference_notes = context.notes_for(record);

    let raw_name = record
        .burger_name
        .as_deref()
        .map(strip_wrapping_quotes)
        .and_then(non_empty);
    let of_the_day = strip_wrapping_quotes(&record.burger_of_the_day);

    let description = record
        .burger_description
        .as_deref()
        .map(|description| description.trim().to_owned())
        .and_then(non_empty)
        .or_else(|| {
            raw_name
                .as_deref()
                .and_then(|name| trailing_parenthetical(&of_the_day, name))
        })
        .map(|description| to_sentence_case(&description))
        .and_then(non_empty);

    let display_source = raw_name
        .as_deref()
        .or((!of_the_day.is_empty()).then_some(of_the_day.as_str()))
        .unwrap_or(UNKNOWN_BURGER);
    let burger_display = display_source.to_uppercase();

    let name = raw_name.map(|name| name.to_uppercase());
    let burger_of_the_day = match (&name, &description) {
        (Some(name), Some(description)) => format!("{name} ({description})"),
        (Some(name), None) => name.clone(),
        (None, _) => of_the_day,
    };

    BurgerRecordView {
        burger_slug: slugify(&burger_display),
        episode_code: format_episode_code(record.season, record.tvmaze_episode_number),
        burger_display,
        reference_notes,
        record: BurgerRecord {
            burger_name: name,
            burger_description: description,
            burger_of_the_day,
            ..record.clone()
        },
    }
}

/// Everything the pages read: the raw documents, the derived views, and the
/// lookup indexes over them. Built once and never mutated afterwards.
#[derive(Debug)]
pub struct BurgerDataBundle {
    pub burger_file: BurgerDataFile,
    pub tvmaze_file: TvmazePayload,
    pub context_file: Option<BurgerContextFile>,
    /// Source order.
    pub records: Vec<BurgerRecordView>,
    /// Ascending by `(season, number)`.
    pub episodes: Vec<EpisodeView>,
    episodes_by_id: HashMap<u64, usize>,
    episodes_by_code: HashMap<String, usize>,
    burgers_by_slug: HashMap<String, Vec<usize>>,
    burgers_by_episode_id: HashMap<u64, Vec<usize>>,
}

pub fn build_bundle(
    burger_file: BurgerDataFile,
    tvmaze_file: TvmazePayload,
    context_file: Option<BurgerContextFile>,
) -> BurgerDataBundle {
    let mut episodes = tvmaze_file
        .episodes
        .iter()
        .cloned()
        .map(EpisodeView::new)
        .collect::<Vec<_>>();
    episodes.sort_by_key(EpisodeView::sort_key);

    let mut episodes_by_id = HashMap::new();
    let mut episodes_by_code = HashMap::new();
    for (idx, episode) in episodes.iter().enumerate() {
        episodes_by_id.insert(episode.episode.id, idx);
        episodes_by_code.insert(episode.code.clone(), idx);
    }

    let context = ContextIndex::new(context_file.as_ref());
    let records = burger_file
        .records
        .iter()
        .map(|record| build_record_view(record, &context))
        .collect::<Vec<_>>();

    let mut burgers_by_slug: HashMap<String, Vec<usize>> = HashMap::new();
    let mut burgers_by_episode_id: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        burgers_by_slug
            .entry(record.burger_slug.clone())
            .or_default()
            .push(idx);

        if let Some(episode_id) = record.record.tvmaze_episode_id.filter(|id| *id != 0) {
            burgers_by_episode_id.entry(episode_id).or_default().push(idx);
        }
    }

    BurgerDataBundle {
        burger_file,
        tvmaze_file,
        context_file,
        records,
        episodes,
        episodes_by_id,
        episodes_by_code,
        burgers_by_slug,
        burgers_by_episode_id,
    }
}

impl BurgerDataBundle {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn episode_by_id(&self, id: u64) -> Option<&EpisodeView> {
        self.episodes_by_id.get(&id).map(|idx| &self.episodes[*idx])
    }

    /// Codes are matched case-insensitively (`S01E02` == `s01e02`).
    pub fn episode_by_code(&self, code: &str) -> Option<&EpisodeView> {
        self.episodes_by_code
            .get(&code.trim().to_ascii_lowercase())
            .map(|idx| &self.episodes[*idx])
    }

    pub fn burgers_for_slug(&self, slug: &str) -> Vec<&BurgerRecordView> {
        self.collect_records(self.burgers_by_slug.get(slug))
    }

    pub fn burgers_for_episode(&self, episode_id: u64) -> Vec<&BurgerRecordView> {
        self.collect_records(self.burgers_by_episode_id.get(&episode_id))
    }

    fn collect_records(&self, indexes: Option<&Vec<usize>>) -> Vec<&BurgerRecordView> {
        indexes
            .map(|indexes| indexes.iter().map(|idx| &self.records[*idx]).collect())
            .unwrap_or_default()
    }

    /// The record's episode by TVMaze id, falling back to its episode code
    /// when the record carries an episode number but no id.
    pub fn episode_for_record(&self, record: &BurgerRecordView) -> Option<&EpisodeView> {
        if let Some(episode) = record
            .record
            .tvmaze_episode_id
            .and_then(|id| self.episode_by_id(id))
        {
            return Some(episode);
        }
        record
            .record
            .tvmaze_episode_number
            .and_then(|_| self.episode_by_code(&record.episode_code))
    }

    pub fn unique_burgers(&self) -> Vec<BurgerSummary> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for record in &self.records {
            if !seen.insert(record.burger_slug.as_str()) {
                continue;
            }
            out.push(BurgerSummary {
                slug: record.burger_slug.clone(),
                display: record.burger_display.clone(),
                appearances: self
                    .burgers_by_slug
                    .get(&record.burger_slug)
                    .map_or(0, Vec::len),
            });
        }
        out
    }

    pub fn match_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts
                .entry(record.record.tvmaze_match_type.to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    /// Episodes whose airdate anniversary falls within a week of `now`.
    pub fn episodes_near(&self, now: NaiveDateTime) -> Vec<&EpisodeView> {
        self.episodes
            .iter()
            .filter(|episode| {
                parse_airdate(episode.episode.airdate.as_deref())
                    .is_some_and(|airdate| is_within_week_of_today(airdate, now))
            })
            .collect()
    }
}
