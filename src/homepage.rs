//! Splices the most recent articles into the homepage. The homepage is
//! generated from a template file containing a placeholder token; the token is
//! replaced with rendered cards and the result written to the homepage file.
//! Keeping the template apart from the live homepage is what lets every run
//! refresh the "latest posts" section.

use crate::listing::Listing;
use crate::template::{self, object};
use gtmpl::{Template, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Regenerates the homepage.
pub struct HomepageWriter<'a> {
    /// The template for the card markup.
    pub cards_template: &'a Template,

    /// The homepage template containing `placeholder`.
    pub homepage_template: &'a Path,

    /// The homepage to (over)write.
    pub homepage: &'a Path,

    /// The literal token in the homepage template that the cards replace.
    pub placeholder: &'a str,

    /// The path from the homepage to the articles directory, ending in `/`.
    pub articles_href: &'a str,

    /// The number of articles to feature.
    pub latest_count: usize,
}

impl HomepageWriter<'_> {
    /// Features the first `latest_count` of `listings`, which must already
    /// be ordered newest first. Fails if the homepage template is missing or
    /// doesn't contain the placeholder.
    pub fn update_homepage(&self, listings: &[Listing]) -> Result<()> {
        let latest: Vec<Value> = listings
            .iter()
            .take(self.latest_count)
            .map(|l| l.to_card(self.articles_href))
            .collect();
        let count = latest.len();
        let cards = template::render(
            self.cards_template,
            object(vec![("cards", Value::Array(latest))]),
        )?;

        let source = std::fs::read_to_string(self.homepage_template).map_err(|err| {
            Error::ReadTemplate {
                path: self.homepage_template.to_owned(),
                err,
            }
        })?;
        if !source.contains(self.placeholder) {
            return Err(Error::MissingPlaceholder {
                path: self.homepage_template.to_owned(),
                placeholder: self.placeholder.to_owned(),
            });
        }

        std::fs::write(self.homepage, source.replace(self.placeholder, &cards)).map_err(
            |err| Error::Write {
                path: self.homepage.to_owned(),
                err,
            },
        )?;
        tracing::info!("wrote {} with {} latest articles", self.homepage.display(), count);
        Ok(())
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem regenerating the homepage.
#[derive(Debug)]
pub enum Error {
    /// Returned when the homepage template can't be read.
    ReadTemplate { path: PathBuf, err: io::Error },

    /// Returned when the homepage template doesn't contain the placeholder.
    MissingPlaceholder { path: PathBuf, placeholder: String },

    /// Returned when the homepage can't be written.
    Write { path: PathBuf, err: io::Error },

    /// Returned when the card template fails.
    Template(template::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadTemplate { path, err } => {
                write!(f, "Reading homepage template '{}': {}", path.display(), err)
            }
            Error::MissingPlaceholder { path, placeholder } => write!(
                f,
                "Homepage template '{}' doesn't contain the placeholder `{}`",
                path.display(),
                placeholder
            ),
            Error::Write { path, err } => {
                write!(f, "Writing homepage '{}': {}", path.display(), err)
            }
            Error::Template(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadTemplate { path: _, err } => Some(err),
            Error::MissingPlaceholder { .. } => None,
            Error::Write { path: _, err } => Some(err),
            Error::Template(err) => Some(err),
        }
    }
}

impl From<template::Error> for Error {
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}
