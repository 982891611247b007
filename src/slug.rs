//! Derives the file stem under which an article is stored.

use sha1::{Digest, Sha1};

/// The number of hex characters of the link digest appended to every slug.
const HASH_LENGTH: usize = 8;

/// Builds the slug for an article from its `title` and `link`. The title is
/// reduced to ASCII letters, digits and spaces, trimmed, lowercased and has
/// its spaces replaced with hyphens; the first eight hex characters of the
/// SHA-1 digest of the raw `link` are then appended after a `-`. For example,
/// `slugify("Movie: Review!", "http://x/1")` returns `movie-review-c24252f3`.
///
/// Two articles only collide if their links hash to the same prefix, so a
/// title that sanitizes to nothing still yields a usable slug (`-c24252f3`).
pub fn slugify(title: &str, link: &str) -> String {
    let base: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let base = base.trim().to_lowercase().replace(' ', "-");
    format!("{}-{}", base, short_hash(link))
}

fn short_hash(link: &str) -> String {
    let mut digest = hex::encode(Sha1::digest(link.as_bytes()));
    digest.truncate(HASH_LENGTH);
    digest
}
