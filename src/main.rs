//! Good News Curator — Binary Entrypoint
//!
//! Periodic batch job (run it from cron or a systemd timer): fetch the
//! configured feeds, curate, persist. Three maintenance modes share the
//! binary: `cleanup` re-applies current policy to the stored collections,
//! `normalize` re-applies the canonical source labels, `export` renders
//! them as RSS.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use good_news_curator::cleanup;
use good_news_curator::config::CuratorConfig;
use good_news_curator::export::{self, FeedMeta};
use good_news_curator::extract::{ExtractorHeuristics, HttpSnippetExtractor};
use good_news_curator::fetch::HttpFeedTransport;
use good_news_curator::normalize;
use good_news_curator::run::run_curation;
use good_news_curator::score::LexiconScorer;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn config_path() -> PathBuf {
    env::var("CURATOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/curator.toml"))
}

async fn run_once(cfg: &CuratorConfig) -> Result<()> {
    let transport = HttpFeedTransport::new(cfg.http_timeout())?;
    let scorer = LexiconScorer::new();
    let extractor = HttpSnippetExtractor::new(cfg.http_timeout(), ExtractorHeuristics::default())?;

    let report = run_curation(cfg, &transport, &scorer, &extractor).await?;
    info!(
        accepted = report.accepted,
        archived = report.archived,
        "run finished"
    );
    Ok(())
}

fn export_feeds(cfg: &CuratorConfig) -> Result<()> {
    let site_url =
        env::var("CURATOR_SITE_URL").unwrap_or_else(|_| "https://example.org/good-news/".into());

    let current_xml = cfg.data_file.with_extension("xml");
    export::write_rss(
        &cfg.data_file,
        &current_xml,
        &FeedMeta {
            title: "Good News Feed",
            description: "Positive news stories from around the world, filtered by sentiment",
            site_url: &site_url,
        },
    )?;

    let archive_xml = cfg.archive_file.with_extension("xml");
    export::write_rss(
        &cfg.archive_file,
        &archive_xml,
        &FeedMeta {
            title: "Archived Good News",
            description: "Archived positive news stories",
            site_url: &site_url,
        },
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = CuratorConfig::load(Path::new(&config_path()))?;
    let mode = env::args().nth(1).unwrap_or_else(|| "run".to_string());

    match mode.as_str() {
        "run" => run_once(&cfg).await,
        "cleanup" => {
            let report = cleanup::cleanup_collections(&cfg)?;
            info!(
                removed_current = report.removed_current,
                removed_archive = report.removed_archive,
                "cleanup finished"
            );
            Ok(())
        }
        "normalize" => {
            let relabeled = normalize::normalize_sources(&cfg)?;
            info!(relabeled, "normalize finished");
            Ok(())
        }
        "export" => export_feeds(&cfg),
        other => bail!("unknown mode `{other}` (expected run, cleanup, normalize or export)"),
    }
}
