//! Fetches the configured feeds and hands their newest entries to the
//! [`Renderer`]. A feed that can't be fetched or parsed is logged and skipped;
//! it never stops the remaining feeds from being processed.

use crate::article::{self, Outcome, Renderer};
use crate::entry::{Defaults, FeedEntry};
use std::fmt;
use std::io;
use std::time::Duration;
use url::Url;

/// Retrieves the raw bytes of a feed.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Fetches `http` and `https` feeds with a blocking HTTP client, and reads
/// `file` URLs from disk.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<HttpFetcher> {
        Ok(HttpFetcher {
            client: reqwest::blocking::Client::builder()
                .user_agent(concat!("filmfeed/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()?,
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        match url.scheme() {
            "http" | "https" => {
                let response = self.client.get(url.clone()).send()?.error_for_status()?;
                Ok(response.bytes()?.to_vec())
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::UnsupportedUrl(url.to_string()))?;
                Ok(std::fs::read(path)?)
            }
            _ => Err(Error::UnsupportedUrl(url.to_string())),
        }
    }
}

/// Parses `bytes` as an RSS 2.0 channel, falling back to an Atom feed, and
/// normalizes its entries in feed order.
pub fn parse_feed(bytes: &[u8], source: &str, defaults: &Defaults) -> Result<Vec<FeedEntry>> {
    match rss::Channel::read_from(bytes) {
        Ok(channel) => Ok(channel
            .items()
            .iter()
            .map(|item| FeedEntry::from_rss(item, source, defaults))
            .collect()),
        Err(rss_err) => match atom_syndication::Feed::read_from(bytes) {
            Ok(feed) => Ok(feed
                .entries
                .iter()
                .map(|entry| FeedEntry::from_atom(entry, source, defaults))
                .collect()),
            Err(atom_err) => Err(Error::Parse { rss_err, atom_err }),
        },
    }
}

/// Tallies what a run of [`Ingestor::ingest`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Feeds that couldn't be fetched or parsed.
    pub failed_feeds: usize,

    /// Articles written for the first time.
    pub created: usize,

    /// Entries whose article already existed.
    pub skipped: usize,
}

/// Drives the [`Renderer`] over the newest entries of each feed.
pub struct Ingestor<'a, F: Fetch + ?Sized> {
    pub fetcher: &'a F,
    pub renderer: &'a Renderer<'a>,
    pub defaults: &'a Defaults,

    /// At most this many entries are taken from the top of each feed. Feeds
    /// are trusted to list their newest entries first.
    pub max_entries_per_feed: usize,
}

impl<F: Fetch + ?Sized> Ingestor<'_, F> {
    /// Processes `feeds` in order. Fetch and parse failures are logged and
    /// counted; only failures writing articles are returned.
    pub fn ingest(&self, feeds: &[Url]) -> article::Result<Report> {
        let mut report = Report::default();
        for feed in feeds {
            let entries = match self.entries(feed) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(feed = %feed, error = %e, "skipping feed");
                    report.failed_feeds += 1;
                    continue;
                }
            };
            tracing::debug!(feed = %feed, count = entries.len(), "parsed feed");

            for entry in entries.iter().take(self.max_entries_per_feed) {
                match self.renderer.render(entry)? {
                    Outcome::Created => report.created += 1,
                    Outcome::AlreadyExists => report.skipped += 1,
                }
            }
        }
        Ok(report)
    }

    fn entries(&self, feed: &Url) -> Result<Vec<FeedEntry>> {
        let bytes = self.fetcher.fetch(feed)?;
        parse_feed(&bytes, feed.as_str(), self.defaults)
    }
}

/// The result of a fallible fetch or parse.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem fetching or parsing a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned for HTTP failures, including non-success status codes.
    Http(reqwest::Error),

    /// Returned for I/O errors reading `file` feeds.
    Io(io::Error),

    /// Returned for URLs the fetcher can't handle.
    UnsupportedUrl(String),

    /// Returned when a feed is neither valid RSS nor valid Atom.
    Parse {
        rss_err: rss::Error,
        atom_err: atom_syndication::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::UnsupportedUrl(url) => write!(f, "unsupported feed URL `{}`", url),
            Error::Parse { rss_err, atom_err } => write!(
                f,
                "not an RSS feed ({}) nor an Atom feed ({})",
                rss_err, atom_err
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::UnsupportedUrl(_) => None,
            Error::Parse { rss_err, atom_err: _ } => Some(rss_err),
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for HTTP requests.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::html::Sanitizer;
    use crate::template::Templates;
    use std::collections::HashMap;

    /// Serves fixture feeds from memory; unknown URLs fail like a dead host.
    pub(crate) struct FixtureFetcher(pub HashMap<String, Vec<u8>>);

    impl Fetch for FixtureFetcher {
        fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
            self.0
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::NotFound, "no such feed")))
        }
    }

    fn defaults() -> Defaults {
        Defaults {
            untitled: String::from("Untitled"),
            placeholder_image: String::from("https://example.com/none.png"),
        }
    }

    #[test]
    fn test_parse_feed_rss_and_atom() -> std::result::Result<(), Error> {
        let rss = parse_feed(
            include_bytes!("../testdata/feeds/boxoffice.rss"),
            "https://feed",
            &defaults(),
        )?;
        assert_eq!(5, rss.len());
        let atom = parse_feed(
            include_bytes!("../testdata/feeds/reviews.atom"),
            "https://feed",
            &defaults(),
        )?;
        assert_eq!(2, atom.len());
        assert!(parse_feed(b"<html>not a feed</html>", "https://feed", &defaults()).is_err());
        Ok(())
    }

    #[test]
    fn test_ingest_skips_bad_feeds() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let templates = Templates::load(None)?;
        let sanitizer = Sanitizer::new()?;
        let renderer = Renderer {
            template: &templates.article,
            articles_directory: dir.path(),
            home_href: "../index.html",
            sanitizer: &sanitizer,
            allow_summary_html: false,
        };
        let mut feeds = HashMap::new();
        feeds.insert(String::from("https://broken.example/rss"), b"garbage".to_vec());
        feeds.insert(
            String::from("https://boxoffice.example/rss"),
            include_bytes!("../testdata/feeds/boxoffice.rss").to_vec(),
        );
        let fetcher = FixtureFetcher(feeds);
        let ingestor = Ingestor {
            fetcher: &fetcher,
            renderer: &renderer,
            defaults: &defaults(),
            max_entries_per_feed: 3,
        };
        let urls = vec![
            Url::parse("https://broken.example/rss")?,
            Url::parse("https://unreachable.example/rss")?,
            Url::parse("https://boxoffice.example/rss")?,
        ];

        let report = ingestor.ingest(&urls)?;
        assert_eq!(
            Report {
                failed_feeds: 2,
                created: 3,
                skipped: 0
            },
            report
        );

        let report = ingestor.ingest(&urls)?;
        assert_eq!(0, report.created);
        assert_eq!(3, report.skipped);
        Ok(())
    }

    #[test]
    fn test_http_fetcher_reads_file_urls() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("feed.xml");
        std::fs::write(&path, "<rss/>")?;
        let fetcher = HttpFetcher::new(Duration::from_secs(1))?;
        let url = Url::from_file_path(&path).map_err(|_| "bad path")?;
        assert_eq!(b"<rss/>".to_vec(), fetcher.fetch(&url)?);
        assert!(fetcher.fetch(&Url::parse("ftp://example.com/feed")?).is_err());
        Ok(())
    }
}
