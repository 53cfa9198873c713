use std::fmt::{self, Write as _};

use anyhow::Context as _;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::bundle::{BurgerDataBundle, BurgerRecordView, EpisodeView};
use crate::cli::{BurgerArgs, EpisodeArgs, EpisodesArgs, ThisWeekArgs};
use crate::date::format_airdate;
use crate::loader::BurgerDataLoader;

#[derive(Debug, Serialize)]
pub struct Export<'a> {
    pub records: &'a [BurgerRecordView],
    pub episodes: &'a [EpisodeView],
}

pub async fn burgers(loader: &BurgerDataLoader) -> anyhow::Result<()> {
    let bundle = loader.load().await.context("load burger data")?;
    print!("{}", render_burgers(&bundle)?);
    Ok(())
}

pub async fn burger(loader: &BurgerDataLoader, args: BurgerArgs) -> anyhow::Result<()> {
    let bundle = loader.load().await.context("load burger data")?;
    let Some(out) = render_burger(&bundle, &args.slug)? else {
        anyhow::bail!("no burger with slug: {}", args.slug);
    };
    print!("{out}");
    Ok(())
}

pub async fn episodes(loader: &BurgerDataLoader, args: EpisodesArgs) -> anyhow::Result<()> {
    let bundle = loader.load().await.context("load burger data")?;
    print!("{}", render_episodes(&bundle, args.season)?);
    Ok(())
}

pub async fn episode(loader: &BurgerDataLoader, args: EpisodeArgs) -> anyhow::Result<()> {
    let bundle = loader.load().await.context("load burger data")?;
    let Some(out) = render_episode(&bundle, &args.code)? else {
        anyhow::bail!("no episode with code: {}", args.code);
    };
    print!("{out}");
    Ok(())
}

pub async fn this_week(loader: &BurgerDataLoader, args: ThisWeekArgs) -> anyhow::Result<()> {
    let now = match args.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("parse --date: {raw}"))?
            .and_time(chrono::NaiveTime::MIN),
        None => chrono::Local::now().naive_local(),
    };
    let bundle = loader.load().await.context("load burger data")?;
    print!("{}", render_this_week(&bundle, now)?);
    Ok(())
}

pub async fn export(loader: &BurgerDataLoader) -> anyhow::Result<()> {
    let bundle = loader.load().await.context("load burger data")?;
    let export = Export {
        records: &bundle.records,
        episodes: &bundle.episodes,
    };
    let json = serde_json::to_string_pretty(&export).context("serialize bundle")?;
    println!("{json}");
    Ok(())
}

pub fn render_burgers(bundle: &BurgerDataBundle) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for burger in bundle.unique_burgers() {
        writeln!(
            out,
            "{}\t{}\t{}",
            burger.slug, burger.appearances, burger.display
        )?;
    }
    Ok(out)
}

/// `None` when no record carries `slug`.
pub fn render_burger(bundle: &BurgerDataBundle, slug: &str) -> Result<Option<String>, fmt::Error> {
    let records = bundle.burgers_for_slug(slug);
    let Some(first) = records.first() else {
        return Ok(None);
    };

    let mut out = String::new();
    writeln!(out, "{}", first.burger_display)?;
    for record in &records {
        let episode_name = bundle
            .episode_for_record(record)
            .map(|episode| episode.episode.name.as_str())
            .unwrap_or(record.record.episode_title.as_str());
        writeln!(out, "  {}  {}", record.episode_code, episode_name)?;
        if let Some(description) = &record.record.burger_description {
            writeln!(out, "    {description}")?;
        }
        for note in record.reference_notes.iter().flatten() {
            writeln!(out, "    * {note}")?;
        }
    }
    Ok(Some(out))
}

pub fn render_episodes(bundle: &BurgerDataBundle, season: Option<u32>) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for episode in &bundle.episodes {
        if season.is_some_and(|season| season != episode.episode.season) {
            continue;
        }
        let burgers = bundle.burgers_for_episode(episode.episode.id).len();
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            episode.code,
            format_airdate(episode.episode.airdate.as_deref()),
            burgers,
            episode.episode.name
        )?;
    }
    Ok(out)
}

/// `None` when no episode has `code`.
pub fn render_episode(bundle: &BurgerDataBundle, code: &str) -> Result<Option<String>, fmt::Error> {
    let Some(episode) = bundle.episode_by_code(code) else {
        return Ok(None);
    };

    let mut out = String::new();
    writeln!(out, "{} {}", episode.code, episode.episode.name)?;
    writeln!(
        out,
        "Aired: {}",
        format_airdate(episode.episode.airdate.as_deref())
    )?;
    if let Some(rating) = episode.rating_value {
        writeln!(out, "Rating: {rating:.1}")?;
    }
    if !episode.summary_text.is_empty() {
        writeln!(out, "{}", episode.summary_text)?;
    }
    for record in bundle.burgers_for_episode(episode.episode.id) {
        writeln!(out, "  - {}", record.record.burger_of_the_day)?;
    }
    Ok(Some(out))
}

pub fn render_this_week(bundle: &BurgerDataBundle, now: NaiveDateTime) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for episode in bundle.episodes_near(now) {
        writeln!(
            out,
            "{}\t{}\t{}",
            episode.code,
            format_airdate(episode.episode.airdate.as_deref()),
            episode.episode.name
        )?;
        for record in bundle.burgers_for_episode(episode.episode.id) {
            writeln!(out, "  - {}", record.burger_display)?;
        }
    }
    Ok(out)
}
