//! Loads and executes the page templates. Every project gets the built-in
//! theme; a project `theme` directory may override any of `article.html`,
//! `index.html` and `latest.html`. Templates use the Go template syntax
//! provided by [`gtmpl`], which does no escaping of its own, so every value
//! handed to a template must already be HTML-safe.

use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

const ARTICLE_TEMPLATE: &str = include_str!("../theme/article.html");
const INDEX_TEMPLATE: &str = include_str!("../theme/index.html");
const LATEST_TEMPLATE: &str = include_str!("../theme/latest.html");

/// The parsed templates for all generated pages.
pub struct Templates {
    /// Renders a single article page.
    pub article: Template,

    /// Renders the article index page.
    pub index: Template,

    /// Renders the card markup spliced into the homepage.
    pub latest: Template,
}

impl Templates {
    /// Parses the built-in templates, preferring same-named files from
    /// `theme` where they exist.
    pub fn load(theme: Option<&Path>) -> Result<Templates> {
        Ok(Templates {
            article: parse_template("article.html", ARTICLE_TEMPLATE, theme)?,
            index: parse_template("index.html", INDEX_TEMPLATE, theme)?,
            latest: parse_template("latest.html", LATEST_TEMPLATE, theme)?,
        })
    }
}

fn parse_template(name: &str, builtin: &str, theme: Option<&Path>) -> Result<Template> {
    let contents = match theme.map(|dir| dir.join(name)) {
        Some(path) if path.is_file() => {
            tracing::debug!("using theme template `{}`", path.display());
            std::fs::read_to_string(&path).map_err(|err| Error::OpenTemplateFile { path, err })?
        }
        _ => builtin.to_owned(),
    };

    let mut template = Template::default();
    template.parse(&contents).map_err(|err| Error::Parse {
        name: name.to_owned(),
        err,
    })?;
    Ok(template)
}

/// Executes `template` against `value`, writing the output to `w`.
pub fn execute<W: Write>(template: &Template, value: Value, w: &mut W) -> Result<()> {
    let context = Context::from(value).map_err(Error::Execute)?;
    template.execute(w, &context).map_err(Error::Execute)
}

/// Executes `template` against `value` and returns the output as a string.
pub fn render(template: &Template, value: Value) -> Result<String> {
    let mut out: Vec<u8> = Vec::new();
    execute(template, value, &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Builds a template object from `(key, value)` pairs.
pub fn object<I, K>(fields: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let m: HashMap<String, Value> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
    Value::Object(m)
}

/// Converts optional text into a template value; `None` becomes `Nil` so
/// templates can test for it with `{{ if }}`.
pub fn optional(value: Option<&str>) -> Value {
    match value {
        Some(value) => Value::String(value.to_owned()),
        None => Value::Nil,
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading or executing a template.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while reading a theme template file.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned when a template doesn't parse.
    Parse { name: String, err: String },

    /// Returned when executing a template fails, including failures writing
    /// its output.
    Execute(String),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::Parse { name, err } => write!(f, "Parsing template '{}': {}", name, err),
            Error::Execute(err) => write!(f, "Executing template: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::Parse { .. } => None,
            Error::Execute(_) => None,
        }
    }
}
