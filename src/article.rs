//! Renders [`FeedEntry`]s into standalone article pages. Each article lives at
//! `{articles_directory}/{slug}.html` and gets a metadata record at
//! `{articles_directory}/.meta/{slug}.yaml` which the index and homepage
//! builders read instead of scraping the rendered page.
//!
//! An article is only ever written once: if its page already exists, the
//! renderer reports [`Outcome::AlreadyExists`] and touches nothing.

use crate::entry::FeedEntry;
use crate::html::{escape_text, escape_url, Sanitizer};
use crate::slug::slugify;
use crate::template::{self, object, optional};
use crate::util::write_atomically;
use chrono::{DateTime, Utc};
use gtmpl::{Template, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// The name of the directory, inside the articles directory, holding the
/// metadata records.
pub const META_DIRECTORY: &str = ".meta";

pub const HTML_EXTENSION: &str = "html";

/// The file name of the article index page inside the articles directory.
pub const INDEX_FILE_NAME: &str = "index.html";

/// What [`Renderer::render`] did with an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A new article page was written.
    Created,

    /// A page with the same slug was already on disk; nothing was written.
    AlreadyExists,
}

/// The structured record persisted alongside each article page. Values are
/// stored unescaped, exactly as normalized from the feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub slug: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub published: Option<String>,
    pub thumbnail: String,
    #[serde(default)]
    pub source: String,
    pub created: DateTime<Utc>,
}

impl ArticleMeta {
    /// Loads the record for `slug`, returning `Ok(None)` when there isn't
    /// one (e.g., for pages written before records existed).
    pub fn load(articles_directory: &Path, slug: &str) -> Result<Option<ArticleMeta>> {
        let path = meta_path(articles_directory, slug);
        match File::open(&path) {
            Ok(file) => Ok(Some(serde_yaml::from_reader(file).map_err(|err| {
                Error::Meta { path, err }
            })?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io { path, err }),
        }
    }

    fn store(&self, articles_directory: &Path) -> Result<()> {
        let dir = articles_directory.join(META_DIRECTORY);
        std::fs::create_dir_all(&dir).map_err(|err| Error::Io {
            path: dir.clone(),
            err,
        })?;
        let path = meta_path(articles_directory, &self.slug);
        let file = File::create(&path).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;
        serde_yaml::to_writer(file, self).map_err(|err| Error::Meta { path, err })
    }
}

/// Returns the path of the page for `slug`.
pub fn article_path(articles_directory: &Path, slug: &str) -> PathBuf {
    articles_directory.join(format!("{}.{}", slug, HTML_EXTENSION))
}

fn meta_path(articles_directory: &Path, slug: &str) -> PathBuf {
    articles_directory
        .join(META_DIRECTORY)
        .join(format!("{}.yaml", slug))
}

/// Writes article pages for [`FeedEntry`]s.
pub struct Renderer<'a> {
    /// The template for article pages.
    pub template: &'a Template,

    /// The directory in which article pages are written. It is created on
    /// demand.
    pub articles_directory: &'a Path,

    /// The link from an article page back to the homepage, relative to the
    /// articles directory.
    pub home_href: &'a str,

    /// Strips markup from summaries unless `allow_summary_html` is set.
    pub sanitizer: &'a Sanitizer,

    /// Embeds summaries verbatim, markup and all. Feeds are third-party
    /// content, so this lets them inject arbitrary HTML into the site.
    pub allow_summary_html: bool,
}

impl Renderer<'_> {
    /// Renders `entry` unless an article with the same slug already exists.
    pub fn render(&self, entry: &FeedEntry) -> Result<Outcome> {
        let slug = slugify(&entry.title, &entry.link);
        let path = article_path(self.articles_directory, &slug);
        if path.exists() {
            tracing::debug!("skipping `{}`: {} already exists", entry.title, path.display());
            return Ok(Outcome::AlreadyExists);
        }

        // An existing page marks a finished article; it goes in last.
        let page = template::render(self.template, self.to_value(entry))?;
        std::fs::create_dir_all(self.articles_directory).map_err(|err| Error::Io {
            path: self.articles_directory.to_owned(),
            err,
        })?;
        ArticleMeta {
            slug,
            title: entry.title.clone(),
            link: entry.link.clone(),
            published: entry.published.clone(),
            thumbnail: entry.thumbnail.clone(),
            source: entry.source.clone(),
            created: Utc::now(),
        }
        .store(self.articles_directory)?;
        write_atomically(&path, page.as_bytes()).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;

        tracing::info!("created {}", path.display());
        Ok(Outcome::Created)
    }

    /// Converts `entry` into the article template's value. The object has
    /// fields `title`, `summary`, `link`, `published`, `thumbnail`,
    /// `home_href` and `index_href`, all safe to embed as-is.
    fn to_value(&self, entry: &FeedEntry) -> Value {
        let summary = match self.allow_summary_html {
            true => entry.summary.clone(),
            false => self.sanitizer.sanitize(&entry.summary),
        };
        let published = entry.published.as_deref().map(escape_text);
        object(vec![
            ("title", Value::String(escape_text(&entry.title))),
            ("summary", Value::String(summary)),
            ("link", Value::String(escape_url(&entry.link))),
            ("published", optional(published.as_deref())),
            ("thumbnail", Value::String(escape_url(&entry.thumbnail))),
            ("home_href", Value::String(escape_url(self.home_href))),
            ("index_href", Value::String(String::from(INDEX_FILE_NAME))),
        ])
    }
}

/// The result of a fallible article operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing or reading an article.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems on article pages, records and their
    /// directories.
    Io { path: PathBuf, err: io::Error },

    /// Returned when a metadata record can't be serialized or parsed.
    Meta { path: PathBuf, err: serde_yaml::Error },

    /// Returned when the article template fails.
    Template(template::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "Writing '{}': {}", path.display(), err),
            Error::Meta { path, err } => {
                write!(f, "Article record '{}': {}", path.display(), err)
            }
            Error::Template(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Meta { path: _, err } => Some(err),
            Error::Template(err) => Some(err),
        }
    }
}

impl From<template::Error> for Error {
    /// Converts a [`template::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator when executing the article template.
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::template::Templates;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn entry(title: &str, link: &str) -> FeedEntry {
        FeedEntry {
            title: title.to_owned(),
            summary: String::from("<p>Numbers are <b>in</b>.</p><script>steal()</script>"),
            link: link.to_owned(),
            published: None,
            thumbnail: String::from("https://via.placeholder.com/400x200.png?text=No+Image"),
            source: String::from("https://feed"),
        }
    }

    fn renderer<'a>(
        templates: &'a Templates,
        sanitizer: &'a Sanitizer,
        dir: &'a Path,
        allow_summary_html: bool,
    ) -> Renderer<'a> {
        Renderer {
            template: &templates.article,
            articles_directory: dir,
            home_href: "../index.html",
            sanitizer,
            allow_summary_html,
        }
    }

    #[test]
    fn test_render_creates_page_and_record() -> TestResult {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("posts");
        let templates = Templates::load(None)?;
        let sanitizer = Sanitizer::new()?;
        let renderer = renderer(&templates, &sanitizer, &dir, false);

        let outcome = renderer.render(&entry("Movie: Review!", "http://x/1"))?;
        assert_eq!(Outcome::Created, outcome);

        let page = std::fs::read_to_string(dir.join("movie-review-c24252f3.html"))?;
        assert!(page.contains("<title>Movie: Review!</title>"));
        assert!(page.contains(
            r#"<img src="https://via.placeholder.com/400x200.png?text=No+Image""#
        ));
        assert!(!page.contains("steal()"));

        let meta = ArticleMeta::load(&dir, "movie-review-c24252f3")?;
        let meta = meta.ok_or("missing record")?;
        assert_eq!("Movie: Review!", meta.title);
        assert_eq!("http://x/1", meta.link);
        Ok(())
    }

    #[test]
    fn test_render_existing_is_noop() -> TestResult {
        let root = tempfile::tempdir()?;
        let dir = root.path().to_owned();
        let templates = Templates::load(None)?;
        let sanitizer = Sanitizer::new()?;
        let renderer = renderer(&templates, &sanitizer, &dir, false);

        let path = dir.join("movie-review-c24252f3.html");
        std::fs::write(&path, "hand-edited")?;
        assert_eq!(
            Outcome::AlreadyExists,
            renderer.render(&entry("Movie: Review!", "http://x/1"))?
        );
        assert_eq!("hand-edited", std::fs::read_to_string(&path)?);
        assert_eq!(None, ArticleMeta::load(&dir, "movie-review-c24252f3")?);
        Ok(())
    }

    #[test]
    fn test_failed_render_leaves_no_page() -> TestResult {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("posts");
        let theme = root.path().join("theme");
        std::fs::create_dir_all(&theme)?;
        std::fs::write(
            theme.join("article.html"),
            r#"<title>{{ .title }}</title>{{ template "missing" . }}"#,
        )?;
        let broken = Templates::load(Some(theme.as_path()))?;
        let sanitizer = Sanitizer::new()?;

        let entry = entry("Movie: Review!", "http://x/1");
        match renderer(&broken, &sanitizer, &dir, false).render(&entry) {
            Err(Error::Template(_)) => {}
            other => panic!("wanted a template error; found {:?}", other),
        }
        assert!(!dir.join("movie-review-c24252f3.html").exists());

        let templates = Templates::load(None)?;
        let outcome = renderer(&templates, &sanitizer, &dir, false).render(&entry)?;
        assert_eq!(Outcome::Created, outcome);
        assert!(ArticleMeta::load(&dir, "movie-review-c24252f3")?.is_some());
        let page = std::fs::read_to_string(dir.join("movie-review-c24252f3.html"))?;
        assert!(page.contains("<h1>Movie: Review!</h1>"));
        Ok(())
    }

    #[test]
    fn test_render_escapes_title() -> TestResult {
        let root = tempfile::tempdir()?;
        let dir = root.path().to_owned();
        let templates = Templates::load(None)?;
        let sanitizer = Sanitizer::new()?;
        let renderer = renderer(&templates, &sanitizer, &dir, false);

        renderer.render(&entry("<b>Bold</b> & Brash", "http://x/2"))?;
        let slug = slugify("<b>Bold</b> & Brash", "http://x/2");
        let page = std::fs::read_to_string(article_path(&dir, &slug))?;
        assert!(page.contains("<h1>&lt;b&gt;Bold&lt;/b&gt; &amp; Brash</h1>"));
        Ok(())
    }

    #[test]
    fn test_render_raw_summary_when_allowed() -> TestResult {
        let root = tempfile::tempdir()?;
        let dir = root.path().to_owned();
        let templates = Templates::load(None)?;
        let sanitizer = Sanitizer::new()?;
        let renderer = renderer(&templates, &sanitizer, &dir, true);

        renderer.render(&entry("Raw", "http://x/3"))?;
        let page = std::fs::read_to_string(article_path(&dir, &slugify("Raw", "http://x/3")))?;
        assert!(page.contains("<p>Numbers are <b>in</b>.</p>"));
        Ok(())
    }
}
