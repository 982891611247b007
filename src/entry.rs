//! Defines [`FeedEntry`], the single internal shape every syndication item is
//! normalized into, regardless of whether it came from an RSS channel or an
//! Atom feed. Missing fields are defaulted here, once, so nothing downstream
//! has to probe for optional data.

use atom_syndication::Entry as AtomEntry;
use rss::Item as RssItem;

/// The link used for entries that don't carry one.
pub const MISSING_LINK: &str = "#";

/// Fallback values for fields an entry may not provide.
#[derive(Clone, Debug)]
pub struct Defaults {
    /// Title for entries without one (or with a blank one).
    pub untitled: String,

    /// Image URL for entries without any thumbnail-like field.
    pub placeholder_image: String,
}

/// One normalized feed item.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedEntry {
    pub title: String,

    /// The summary as published by the feed. This may contain markup.
    pub summary: String,

    pub link: String,

    /// The publication date exactly as the feed states it, if at all.
    pub published: Option<String>,

    /// The resolved thumbnail URL; never empty.
    pub thumbnail: String,

    /// The URL of the feed the entry was read from.
    pub source: String,
}

impl FeedEntry {
    /// Normalizes an RSS `<item>`. The thumbnail is looked up in
    /// `media:thumbnail`, then `media:content`, then an image `<enclosure>`.
    pub fn from_rss(item: &RssItem, source: &str, defaults: &Defaults) -> FeedEntry {
        let extensions = item.extensions();
        let media_url = |name: &str| -> Option<String> {
            extensions
                .get("media")?
                .get(name)?
                .iter()
                .find_map(|ext| ext.attrs().get("url").cloned())
        };
        let image = || -> Option<String> {
            item.enclosure()
                .filter(|enclosure| is_image(enclosure.mime_type()))
                .map(|enclosure| enclosure.url().to_owned())
        };

        FeedEntry {
            title: title_or_default(item.title(), defaults),
            summary: item
                .description()
                .or_else(|| item.content())
                .unwrap_or_default()
                .to_owned(),
            link: non_blank(item.link()).unwrap_or(MISSING_LINK).to_owned(),
            published: non_blank(item.pub_date()).map(str::to_owned),
            thumbnail: media_url("thumbnail")
                .or_else(|| media_url("content"))
                .or_else(image)
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| defaults.placeholder_image.clone()),
            source: source.to_owned(),
        }
    }

    /// Normalizes an Atom `<entry>`. The link is the first `alternate` link
    /// (or the first link of any kind), and the thumbnail is looked up in
    /// `media:thumbnail`, then `media:content`, then an image enclosure link.
    pub fn from_atom(entry: &AtomEntry, source: &str, defaults: &Defaults) -> FeedEntry {
        let media_url = |name: &str| -> Option<String> {
            entry
                .extensions
                .get("media")?
                .get(name)?
                .iter()
                .find_map(|ext| ext.attrs().get("url").cloned())
        };
        let image = || -> Option<String> {
            entry
                .links
                .iter()
                .find(|link| link.rel == "enclosure" && is_image(link.mime_type.as_deref().unwrap_or("")))
                .map(|link| link.href.clone())
        };
        let link = entry
            .links
            .iter()
            .find(|link| link.rel == "alternate")
            .or_else(|| entry.links.first())
            .map(|link| link.href.as_str());

        FeedEntry {
            title: title_or_default(Some(entry.title.value.as_str()), defaults),
            summary: entry
                .summary
                .as_ref()
                .map(|text| text.value.clone())
                .or_else(|| entry.content.as_ref().and_then(|content| content.value.clone()))
                .unwrap_or_default(),
            link: non_blank(link).unwrap_or(MISSING_LINK).to_owned(),
            published: entry.published.map(|date| date.to_rfc2822()),
            thumbnail: media_url("thumbnail")
                .or_else(|| media_url("content"))
                .or_else(image)
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| defaults.placeholder_image.clone()),
            source: source.to_owned(),
        }
    }
}

fn is_image(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn title_or_default(title: Option<&str>, defaults: &Defaults) -> String {
    match non_blank(title) {
        Some(title) => title.to_owned(),
        None => defaults.untitled.clone(),
    }
}
