use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Site root holding `data/*.json`: an http(s) URL or a directory.
    /// Falls back to $BOTD_SOURCE, then `public`.
    #[arg(long, global = true)]
    pub source: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy the data documents into the served directory.
    Stage(StageArgs),
    /// List every distinct burger.
    Burgers,
    /// Show every appearance of one burger.
    Burger(BurgerArgs),
    /// List episodes in season order.
    Episodes(EpisodesArgs),
    /// Show one episode and its burgers.
    Episode(EpisodeArgs),
    /// Episodes that aired within a week of a date in past years.
    ThisWeek(ThisWeekArgs),
    /// Print the derived records and episodes as JSON.
    Export,
    /// Serve the site directory and a JSON API over the bundle.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct StageArgs {
    /// Directory holding the upstream data documents.
    #[arg(long, default_value = "data")]
    pub from: String,

    /// Served directory; documents land in `<to>/data`.
    #[arg(long, default_value = "public")]
    pub to: String,
}

#[derive(Debug, Args)]
pub struct BurgerArgs {
    /// Burger slug (e.g. `new-bacon-ings`).
    #[arg(long)]
    pub slug: String,
}

#[derive(Debug, Args)]
pub struct EpisodesArgs {
    /// Only list this season.
    #[arg(long)]
    pub season: Option<u32>,
}

#[derive(Debug, Args)]
pub struct EpisodeArgs {
    /// Episode code (e.g. `s01e01`).
    #[arg(long)]
    pub code: String,
}

#[derive(Debug, Args)]
pub struct ThisWeekArgs {
    /// Reference date as YYYY-MM-DD (default: today).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,
}
