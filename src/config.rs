//! Loads the project configuration from a `filmfeed.yaml` file. All paths in
//! the file are relative to the directory containing it. A minimal project
//! file only lists the feeds:
//!
//! ```yaml
//! feeds:
//!   - https://www.boxofficemojo.com/rss/
//!   - https://editorial.rottentomatoes.com/feed/
//! ```

use crate::util::{normalize, relative_href};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE_NAME: &str = "filmfeed.yaml";

pub const DEFAULT_PLACEHOLDER: &str = "<!-- LATEST_POSTS -->";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x200.png?text=No+Image";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    feeds: Vec<Url>,

    #[serde(default = "default_articles_directory")]
    articles_directory: PathBuf,

    #[serde(default = "default_homepage_template")]
    homepage_template: PathBuf,

    #[serde(default = "default_homepage")]
    homepage: PathBuf,

    #[serde(default = "default_entry_limit")]
    max_entries_per_feed: usize,

    #[serde(default = "default_entry_limit")]
    latest_count: usize,

    #[serde(default = "default_placeholder")]
    placeholder: String,

    #[serde(default = "default_placeholder_image")]
    placeholder_image: String,

    #[serde(default = "default_untitled")]
    untitled: String,

    #[serde(default = "default_title")]
    title: String,

    #[serde(default = "default_fetch_timeout_secs")]
    fetch_timeout_secs: u64,

    #[serde(default)]
    allow_summary_html: bool,

    #[serde(default)]
    theme: Option<PathBuf>,
}

fn default_articles_directory() -> PathBuf {
    PathBuf::from("posts")
}

fn default_homepage_template() -> PathBuf {
    PathBuf::from("index.template.html")
}

fn default_homepage() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_entry_limit() -> usize {
    3
}

fn default_placeholder() -> String {
    String::from(DEFAULT_PLACEHOLDER)
}

fn default_placeholder_image() -> String {
    String::from(DEFAULT_PLACEHOLDER_IMAGE)
}

fn default_untitled() -> String {
    String::from("Untitled")
}

fn default_title() -> String {
    String::from("Latest Film Articles")
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

/// Everything a run needs to know. Paths are resolved against the project
/// directory.
#[derive(Clone, Debug)]
pub struct Config {
    /// The feeds to ingest, in order.
    pub feeds: Vec<Url>,

    /// The directory holding article pages, their records and the index.
    pub articles_directory: PathBuf,

    /// The template from which the homepage is generated. It must contain
    /// `placeholder`.
    pub homepage_template: PathBuf,

    /// The generated homepage.
    pub homepage: PathBuf,

    /// The number of entries taken from the top of each feed.
    pub max_entries_per_feed: usize,

    /// The number of articles featured on the homepage.
    pub latest_count: usize,

    /// The token in the homepage template replaced with the latest articles.
    pub placeholder: String,

    /// The thumbnail for entries without an image of their own.
    pub placeholder_image: String,

    /// The title for entries without one.
    pub untitled: String,

    /// The title of the article index page.
    pub title: String,

    /// How long a single feed request may take.
    pub fetch_timeout: Duration,

    /// Whether summaries are embedded with their markup intact. Off by
    /// default since feeds can inject arbitrary HTML this way.
    pub allow_summary_html: bool,

    /// A directory of templates overriding the built-in ones.
    pub theme: Option<PathBuf>,
}

impl Config {
    /// Looks for `filmfeed.yaml` in `dir` and each of its ancestors, and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE_NAME);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
            current = dir.parent();
        }
        Err(Error::ProjectNotFound(dir.to_owned()))
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let annotate = |err| Error::Io {
            path: path.to_owned(),
            err,
        };
        let file = std::fs::File::open(path).map_err(annotate)?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
            path: path.to_owned(),
            err,
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let root = std::fs::canonicalize(parent).map_err(|err| Error::Io {
            path: parent.to_owned(),
            err,
        })?;
        Config::from_project(project, &root)
    }

    fn from_project(project: Project, root: &Path) -> Result<Config> {
        if project.placeholder.is_empty() {
            return Err(Error::EmptyPlaceholder);
        }
        if project.feeds.is_empty() {
            tracing::warn!("no feeds configured; only the index and homepage will be rebuilt");
        }

        Ok(Config {
            feeds: project.feeds,
            articles_directory: normalize(&root.join(project.articles_directory)),
            homepage_template: normalize(&root.join(project.homepage_template)),
            homepage: normalize(&root.join(project.homepage)),
            max_entries_per_feed: project.max_entries_per_feed,
            latest_count: project.latest_count,
            placeholder: project.placeholder,
            placeholder_image: project.placeholder_image,
            untitled: project.untitled,
            title: project.title,
            fetch_timeout: Duration::from_secs(project.fetch_timeout_secs),
            allow_summary_html: project.allow_summary_html,
            theme: project.theme.map(|theme| normalize(&root.join(theme))),
        })
    }

    /// The link from an article page back to the homepage.
    pub fn home_href(&self) -> String {
        relative_href(&self.articles_directory, &self.homepage)
    }

    /// The prefix that turns an article file name into a link from the
    /// homepage. Either empty or ending in `/`.
    pub fn articles_href(&self) -> String {
        let homepage_directory = self.homepage.parent().unwrap_or_else(|| Path::new(""));
        let href = relative_href(homepage_directory, &self.articles_directory);
        match href.is_empty() {
            true => href,
            false => format!("{}/", href),
        }
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in a directory or its ancestors.
    ProjectNotFound(PathBuf),

    /// Returned for I/O errors reading the project file.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid.
    Yaml { path: PathBuf, err: serde_yaml::Error },

    /// Returned when the configured placeholder is the empty string.
    EmptyPlaceholder,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectNotFound(dir) => write!(
                f,
                "Could not find `{}` in '{}' or any parent directory",
                PROJECT_FILE_NAME,
                dir.display()
            ),
            Error::Io { path, err } => write!(f, "Opening '{}': {}", path.display(), err),
            Error::Yaml { path, err } => {
                write!(f, "Loading configuration '{}': {}", path.display(), err)
            }
            Error::EmptyPlaceholder => write!(f, "`placeholder` must not be empty"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectNotFound(_) => None,
            Error::Io { path: _, err } => Some(err),
            Error::Yaml { path: _, err } => Some(err),
            Error::EmptyPlaceholder => None,
        }
    }
}
