//! Enumerates the article pages on disk and the display metadata both the
//! index page and the homepage need. Metadata comes from each article's
//! record; pages without one (written by an earlier generator) are scraped
//! for their `<title>` and first `<img src="...">` instead.

use crate::article::{ArticleMeta, HTML_EXTENSION, INDEX_FILE_NAME};
use crate::html::{escape_text, escape_url};
use crate::template::object;
use chrono::{DateTime, Utc};
use gtmpl::Value;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One article page, ready to be turned into a card.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    /// The page's file name inside the articles directory.
    pub file_name: String,

    /// The title, safe to embed in HTML.
    pub title: String,

    /// The thumbnail URL, safe to embed in an attribute.
    pub thumbnail: String,

    /// The page's last modification time.
    pub modified: DateTime<Utc>,
}

impl Listing {
    /// Converts the listing into a card object with fields `href`, `title`
    /// and `thumbnail`. `href_prefix` is the path from the page the card is
    /// rendered into to the articles directory, including a trailing `/`
    /// (or empty when both are in the same directory).
    pub fn to_card(&self, href_prefix: &str) -> Value {
        object(vec![
            (
                "href",
                Value::String(escape_url(&format!("{}{}", href_prefix, self.file_name))),
            ),
            ("title", Value::String(self.title.clone())),
            ("thumbnail", Value::String(self.thumbnail.clone())),
        ])
    }
}

/// Lists every article page in `articles_directory`, newest first (ties are
/// broken by file name). The index page itself is skipped, as is anything
/// that isn't an `.html` file. A missing directory lists as empty.
pub fn list_articles(articles_directory: &Path, placeholder_image: &str) -> Result<Vec<Listing>> {
    if !articles_directory.is_dir() {
        return Ok(Vec::new());
    }

    let scraper = Scraper::new()?;
    let mut listings = Vec::new();
    for result in WalkDir::new(articles_directory).min_depth(1).max_depth(1) {
        let entry = result?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || entry.file_name() == INDEX_FILE_NAME
            || path.extension().map_or(true, |ext| ext != HTML_EXTENSION)
        {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let stem = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => continue,
        };
        let modified: DateTime<Utc> = entry
            .metadata()?
            .modified()
            .map_err(|err| Error::Io {
                path: path.to_owned(),
                err,
            })?
            .into();

        let (title, thumbnail) = match ArticleMeta::load(articles_directory, &stem) {
            Ok(Some(meta)) => (escape_text(&meta.title), escape_url(&meta.thumbnail)),
            Ok(None) => scraper.scrape(path, &stem, placeholder_image),
            Err(e) => {
                tracing::warn!("{}; falling back to the page itself", e);
                scraper.scrape(path, &stem, placeholder_image)
            }
        };

        listings.push(Listing {
            file_name,
            title,
            thumbnail,
            modified,
        });
    }

    listings.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    Ok(listings)
}

/// Pulls display metadata out of a rendered page. The captured text is
/// already markup, so it's used as-is.
struct Scraper {
    title: Regex,
    image: Regex,
}

impl Scraper {
    fn new() -> std::result::Result<Scraper, regex::Error> {
        Ok(Scraper {
            title: Regex::new(r"(?is)<title>(.*?)</title>")?,
            image: Regex::new(r#"<img src="(.*?)""#)?,
        })
    }

    fn scrape(&self, path: &Path, stem: &str, placeholder_image: &str) -> (String, String) {
        let text = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!("reading '{}': {}", path.display(), e);
                return (stem.to_owned(), placeholder_image.to_owned());
            }
        };
        let title = self
            .title
            .captures(&text)
            .map(|c| c[1].trim().to_owned())
            .unwrap_or_else(|| stem.to_owned());
        let thumbnail = self
            .image
            .captures(&text)
            .map(|c| c[1].to_owned())
            .unwrap_or_else(|| placeholder_image.to_owned());
        (title, thumbnail)
    }
}

/// The result of a fallible listing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem listing article pages.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors walking the articles directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the scraping patterns fail to compile.
    Regex(regex::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => err.fmt(f),
            Error::Io { path, err } => write!(f, "Reading '{}': {}", path.display(), err),
            Error::Regex(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::Io { path: _, err } => Some(err),
            Error::Regex(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the articles directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Error {
        Error::Regex(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    const PLACEHOLDER: &str = "https://example.com/none.png";

    fn touch(path: &Path, contents: &str, age_secs: u64) -> TestResult {
        fs::write(path, contents)?;
        let file = File::options().write(true).open(path)?;
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))?;
        Ok(())
    }

    #[test]
    fn test_list_articles_scrapes_legacy_pages() -> TestResult {
        let dir = tempfile::tempdir()?;
        touch(
            &dir.path().join("old-aaaaaaaa.html"),
            "<html><head><TITLE>\n  Old &amp; Gold </TITLE></head><body><img src=\"https://img/old.jpg\" alt=\"\"></body></html>",
            100,
        )?;
        touch(&dir.path().join("bare-bbbbbbbb.html"), "<p>nothing here</p>", 50)?;
        touch(&dir.path().join("index.html"), "<title>Index</title>", 0)?;
        touch(&dir.path().join("notes.txt"), "<title>Notes</title>", 0)?;

        let listings = list_articles(dir.path(), PLACEHOLDER)?;
        let summary: Vec<(&str, &str, &str)> = listings
            .iter()
            .map(|l| (l.file_name.as_str(), l.title.as_str(), l.thumbnail.as_str()))
            .collect();
        assert_eq!(
            vec![
                ("bare-bbbbbbbb.html", "bare-bbbbbbbb", PLACEHOLDER),
                ("old-aaaaaaaa.html", "Old &amp; Gold", "https://img/old.jpg"),
            ],
            summary
        );
        Ok(())
    }

    #[test]
    fn test_list_articles_prefers_records() -> TestResult {
        let dir = tempfile::tempdir()?;
        touch(
            &dir.path().join("x-c24252f3.html"),
            "<title>Scraped</title><img src=\"https://img/scraped.jpg\">",
            0,
        )?;
        fs::create_dir_all(dir.path().join(".meta"))?;
        fs::write(
            dir.path().join(".meta").join("x-c24252f3.yaml"),
            "slug: x-c24252f3\ntitle: \"Recorded <3\"\nlink: http://x/1\nthumbnail: https://img/recorded.jpg\ncreated: 2024-05-01T00:00:00Z\n",
        )?;

        let listings = list_articles(dir.path(), PLACEHOLDER)?;
        assert_eq!(1, listings.len());
        assert_eq!("Recorded &lt;3", listings[0].title);
        assert_eq!("https://img/recorded.jpg", listings[0].thumbnail);
        Ok(())
    }

    #[test]
    fn test_list_articles_missing_directory() -> TestResult {
        let dir = tempfile::tempdir()?;
        assert!(list_articles(&dir.path().join("absent"), PLACEHOLDER)?.is_empty());
        Ok(())
    }
}
