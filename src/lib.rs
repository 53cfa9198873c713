#![forbid(unsafe_code)]

pub mod bundle;
pub mod cli;
pub mod config;
pub mod date;
pub mod formats;
pub mod loader;
pub mod logging;
pub mod report;
pub mod serve;
pub mod slug;
pub mod source;
pub mod stage;
pub mod text;

pub use bundle::{BurgerDataBundle, BurgerRecordView, EpisodeView};
pub use loader::BurgerDataLoader;
pub use source::{DataSource, DirSource, FetchError, HttpSource};
