use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "lawshelf",
    version,
    about = "Local statute store, tagged-text importer, and full-text search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a law, optionally extracting text from a source PDF
    Add(AddArgs),
    /// Clean a law's extracted text into tagged text via the AI service
    Clean(CleanArgs),
    /// Replace a law's descendant graph from its AI-prepared tagged text
    Import(ImportArgs),
    /// Rebuild the search collections from the document store
    Reindex(ReindexArgs),
    /// Query the search collections and hydrate hits from the store
    Search(SearchArgs),
    /// Show a law's full structure by slug
    Show(ShowArgs),
    /// Report store and index counts
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long, default_value = ".lawshelf")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Law title; the slug is derived from it unless --slug is given
    pub title: String,

    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub enactment_date: Option<NaiveDate>,

    /// Source PDF to hash and extract text from
    #[arg(long)]
    pub pdf: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    #[arg(long, default_value = ".lawshelf")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Slug of the law whose extracted text should be cleaned
    pub slug: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "gemini-1.5-flash")]
    pub model: String,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, default_value = ".lawshelf")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Slug of the law to rebuild from its tagged text
    pub slug: String,
}

#[derive(Args, Debug, Clone)]
pub struct ReindexArgs {
    #[arg(long, default_value = ".lawshelf")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub index_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long, default_value = ".lawshelf")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub index_path: Option<PathBuf>,

    #[arg(long)]
    pub query: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long, default_value = ".lawshelf")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Slug of the law to display
    pub slug: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".lawshelf")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub index_path: Option<PathBuf>,
}

pub fn db_path(data_root: &std::path::Path, override_path: &Option<PathBuf>) -> PathBuf {
    override_path
        .clone()
        .unwrap_or_else(|| data_root.join("laws.sqlite"))
}

pub fn index_path(data_root: &std::path::Path, override_path: &Option<PathBuf>) -> PathBuf {
    override_path
        .clone()
        .unwrap_or_else(|| data_root.join("search_index.sqlite"))
}
