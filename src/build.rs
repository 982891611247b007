//! Exports [`build_site`], which stitches together the high-level steps of a
//! run: ingesting the feeds into article pages ([`crate::ingest`]), then
//! regenerating the article index ([`crate::index`]) and the homepage
//! ([`crate::homepage`]) from whatever article pages are on disk.

use crate::article::{Error as ArticleError, Renderer};
use crate::config::Config;
use crate::entry::Defaults;
use crate::homepage::{Error as HomepageError, HomepageWriter};
use crate::html::Sanitizer;
use crate::index::{Error as IndexError, IndexWriter};
use crate::ingest::{Fetch, Ingestor, Report};
use crate::listing::{list_articles, Error as ListingError};
use crate::template::{Error as TemplateError, Templates};
use std::fmt;

/// Runs the whole pipeline for `config`, fetching feeds through `fetcher`.
/// Returns what ingestion did.
pub fn build_site<F: Fetch + ?Sized>(config: &Config, fetcher: &F) -> Result<Report> {
    let templates = Templates::load(config.theme.as_deref())?;
    let sanitizer = Sanitizer::new().map_err(Error::Regex)?;
    let home_href = config.home_href();
    let renderer = Renderer {
        template: &templates.article,
        articles_directory: &config.articles_directory,
        home_href: &home_href,
        sanitizer: &sanitizer,
        allow_summary_html: config.allow_summary_html,
    };
    let defaults = Defaults {
        untitled: config.untitled.clone(),
        placeholder_image: config.placeholder_image.clone(),
    };
    let ingestor = Ingestor {
        fetcher,
        renderer: &renderer,
        defaults: &defaults,
        max_entries_per_feed: config.max_entries_per_feed,
    };

    let report = ingestor.ingest(&config.feeds)?;
    tracing::info!(
        "{} new articles, {} already present, {} of {} feeds failed",
        report.created,
        report.skipped,
        report.failed_feeds,
        config.feeds.len()
    );

    write_listings(config, &templates)?;
    Ok(report)
}

/// Regenerates the index page and the homepage without fetching anything.
pub fn rebuild_listings(config: &Config) -> Result<()> {
    let templates = Templates::load(config.theme.as_deref())?;
    write_listings(config, &templates)
}

fn write_listings(config: &Config, templates: &Templates) -> Result<()> {
    let listings = list_articles(&config.articles_directory, &config.placeholder_image)?;
    let home_href = config.home_href();

    IndexWriter {
        template: &templates.index,
        articles_directory: &config.articles_directory,
        site_title: &config.title,
        home_href: &home_href,
    }
    .write_index(&listings)?;

    if config.homepage_template == config.homepage {
        tracing::warn!(
            "the homepage template is the homepage itself; its placeholder will be gone after this run"
        );
    }
    let articles_href = config.articles_href();
    HomepageWriter {
        cards_template: &templates.latest,
        homepage_template: &config.homepage_template,
        homepage: &config.homepage,
        placeholder: &config.placeholder,
        articles_href: &articles_href,
        latest_count: config.latest_count,
    }
    .update_homepage(&listings)?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for a run. Errors can come from loading templates, writing
/// articles, listing them, or writing the index page or the homepage. Feed
/// failures never show up here; they're logged and skipped.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading templates.
    Template(TemplateError),

    /// Returned when the summary sanitizer can't be built.
    Regex(regex::Error),

    /// Returned for errors writing article pages.
    Article(ArticleError),

    /// Returned for errors enumerating article pages.
    Listing(ListingError),

    /// Returned for errors writing the index page.
    Index(IndexError),

    /// Returned for errors regenerating the homepage.
    Homepage(HomepageError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Regex(err) => err.fmt(f),
            Error::Article(err) => err.fmt(f),
            Error::Listing(err) => err.fmt(f),
            Error::Index(err) => err.fmt(f),
            Error::Homepage(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Regex(err) => Some(err),
            Error::Article(err) => Some(err),
            Error::Listing(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Homepage(err) => Some(err),
        }
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<ArticleError> for Error {
    /// Converts [`ArticleError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: ArticleError) -> Error {
        Error::Article(err)
    }
}

impl From<ListingError> for Error {
    /// Converts [`ListingError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: ListingError) -> Error {
        Error::Listing(err)
    }
}

impl From<IndexError> for Error {
    /// Converts [`IndexError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: IndexError) -> Error {
        Error::Index(err)
    }
}

impl From<HomepageError> for Error {
    /// Converts [`HomepageError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: HomepageError) -> Error {
        Error::Homepage(err)
    }
}
