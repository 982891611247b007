//! Builds the article index page: one card per article page, written to
//! `{articles_directory}/index.html` and replaced in full on every run.

use crate::article::INDEX_FILE_NAME;
use crate::html::{escape_text, escape_url};
use crate::listing::Listing;
use crate::template::{self, object};
use gtmpl::{Template, Value};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Writes the index page for the articles in `listings`.
pub struct IndexWriter<'a> {
    /// The template for the index page.
    pub template: &'a Template,

    /// The directory holding the article pages; the index is written here.
    pub articles_directory: &'a Path,

    /// The heading and `<title>` of the index page.
    pub site_title: &'a str,

    /// The link back to the homepage, relative to the articles directory.
    pub home_href: &'a str,
}

impl IndexWriter<'_> {
    /// Renders one card per listing, in the given order, and overwrites the
    /// index page. Returns the path of the page.
    pub fn write_index(&self, listings: &[Listing]) -> Result<PathBuf> {
        std::fs::create_dir_all(self.articles_directory).map_err(|err| Error::Io {
            path: self.articles_directory.to_owned(),
            err,
        })?;

        let path = self.articles_directory.join(INDEX_FILE_NAME);
        let value = object(vec![
            ("site_title", Value::String(escape_text(self.site_title))),
            ("home_href", Value::String(escape_url(self.home_href))),
            (
                "cards",
                Value::Array(listings.iter().map(|l| l.to_card("")).collect()),
            ),
        ]);
        let mut file = File::create(&path).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;
        template::execute(self.template, value, &mut file)?;

        tracing::info!("wrote {} with {} articles", path.display(), listings.len());
        Ok(path)
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing the index page.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems creating the index page.
    Io { path: PathBuf, err: io::Error },

    /// Returned when the index template fails.
    Template(template::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "Writing index '{}': {}", path.display(), err),
            Error::Template(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Template(err) => Some(err),
        }
    }
}

impl From<template::Error> for Error {
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::template::Templates;
    use chrono::Utc;

    #[test]
    fn test_write_index() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let templates = Templates::load(None)?;
        let listing = |name: &str| Listing {
            file_name: format!("{}.html", name),
            title: name.to_uppercase(),
            thumbnail: String::from("https://img/x.png"),
            modified: Utc::now(),
        };
        let writer = IndexWriter {
            template: &templates.index,
            articles_directory: dir.path(),
            site_title: "Film & Friends",
            home_href: "../index.html",
        };

        std::fs::write(dir.path().join(INDEX_FILE_NAME), "stale")?;
        let path = writer.write_index(&[listing("a-1"), listing("b-2")])?;
        let html = std::fs::read_to_string(path)?;

        assert_eq!(2, html.matches(r#"class="card""#).count());
        assert!(html.contains(r#"<a href="a-1.html">"#));
        assert!(html.contains("<h2>B-2</h2>"));
        assert!(html.contains("<title>Film &amp; Friends</title>"));
        assert!(!html.contains("stale"));
        Ok(())
    }

    #[test]
    fn test_write_index_empty() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("posts");
        let templates = Templates::load(None)?;
        let writer = IndexWriter {
            template: &templates.index,
            articles_directory: &dir,
            site_title: "Films",
            home_href: "../index.html",
        };
        let html = std::fs::read_to_string(writer.write_index(&[])?)?;
        assert_eq!(0, html.matches(r#"class="card""#).count());
        Ok(())
    }
}
