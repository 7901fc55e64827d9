use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use thiserror::Error;
use tracing::{Level, event};

use crate::constants;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("Error parsing XML: {0}")]
    ReaderError(#[from] quick_xml::Error),
    #[error("Element name is not valid UTF-8: {0}")]
    InvalidName(#[from] std::str::Utf8Error),
    #[error("Document ended inside `{0}`")]
    UnexpectedEof(Box<str>),
    #[error("Document has no root element")]
    MissingRoot,
}

/// Strips the scheme and a trailing slash, so `http`, `https` and slash-terminated spellings
/// of the same namespace compare equal
fn normalize_namespace(uri: &str) -> Option<&str> {
    let rest = uri
        .strip_prefix("http://")
        .or_else(|| uri.strip_prefix("https://"))?;

    Some(rest.strip_suffix('/').unwrap_or(rest))
}

/// Finds the fixed prefix we report for a namespace, if it is one we know
fn known_prefix(uri: &[u8]) -> Option<&'static str> {
    let uri = normalize_namespace(std::str::from_utf8(uri).ok()?)?;

    constants::READER_NAMESPACES
        .iter()
        .find(|&&(_, namespace)| normalize_namespace(namespace) == Some(uri))
        .map(|&(prefix, _)| prefix)
}

/// Streaming XML reader that keeps track of the path of the current element.
///
/// Paths are built from `prefix:local-name` segments joined with `/`, starting at the root element,
/// e.g. `s:Envelope/s:Body`. Elements in a namespace from [`constants::READER_NAMESPACES`] get that
/// table's prefix, all others keep the prefix used in the document.
pub struct XmlReader<'r> {
    reader: NsReader<&'r [u8]>,
    path: String,
    /// length of `path` before each currently open element was appended
    segments: Vec<usize>,
    seen_root: bool,
}

impl<'r> XmlReader<'r> {
    pub fn new(raw: &'r [u8]) -> Self {
        let mut reader = NsReader::from_reader(raw);

        let config = reader.config_mut();
        config.trim_text(true);
        config.expand_empty_elements = true;

        Self {
            reader,
            path: String::with_capacity(constants::STRING_DEFAULT_CAPACITY * 4),
            segments: Vec::new(),
            seen_root: false,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// A scope spanning the whole document
    pub fn document(&mut self) -> Scope<'_, 'r> {
        Scope {
            reader: self,
            entry_depth: 0,
            prefix_len: 0,
            finished: false,
        }
    }

    fn push(&mut self, prefix: Option<&str>, start: &BytesStart<'_>) -> Result<(), XmlError> {
        let local_name = std::str::from_utf8(start.local_name().into_inner())?;

        let prefix = match prefix {
            Some(prefix) => Some(prefix),
            None => start
                .name()
                .prefix()
                .map(|prefix| std::str::from_utf8(prefix.into_inner()))
                .transpose()?,
        };

        self.segments.push(self.path.len());
        self.seen_root = true;

        if !self.path.is_empty() {
            self.path.push('/');
        }

        if let Some(prefix) = prefix {
            self.path.push_str(prefix);
            self.path.push(':');
        }

        self.path.push_str(local_name);

        Ok(())
    }

    fn pop(&mut self) {
        if let Some(length) = self.segments.pop() {
            self.path.truncate(length);
        }
    }

    fn unexpected_eof(&self) -> XmlError {
        XmlError::UnexpectedEof(Box::from(self.path.as_str()))
    }

    /// Reads the text of the element that was just opened, up to and including its end tag.
    ///
    /// Text inside child elements is skipped.
    fn read_text(&mut self) -> Result<String, XmlError> {
        let depth = self.depth();
        let mut text = String::with_capacity(constants::STRING_DEFAULT_CAPACITY);

        loop {
            let (_, event) = self.reader.read_resolved_event()?;

            #[expect(clippy::wildcard_enum_match_arm, reason = "Library is stable")]
            match event {
                Event::Text(content) => {
                    if self.depth() == depth {
                        text.push_str(&content.unescape().map_err(quick_xml::Error::from)?);
                    }
                },
                Event::CData(content) => {
                    if self.depth() == depth {
                        text.push_str(&String::from_utf8_lossy(&content));
                    }
                },
                Event::Start(start) => {
                    // only the depth matters here, the name of a nested element is never reported
                    self.push(None, &start)?;
                },
                Event::End(_) => {
                    self.pop();

                    if self.depth() < depth {
                        break;
                    }
                },
                Event::Eof => {
                    return Err(self.unexpected_eof());
                },
                _ => {
                    // declarations, comments, processing instructions and doctypes carry no values
                },
            }
        }

        let trimmed = text.trim();

        if trimmed.len() == text.len() {
            Ok(text)
        } else {
            Ok(trimmed.to_owned())
        }
    }
}

/// A view on the reader bounded to the subtree of one element.
///
/// Elements are visited depth first. An element that isn't consumed (through [`Scope::read_text`]
/// or [`Scope::descend`]) has its children visited next; a consumed element is never revisited.
pub struct Scope<'x, 'r> {
    reader: &'x mut XmlReader<'r>,
    entry_depth: usize,
    prefix_len: usize,
    finished: bool,
}

impl<'r> Scope<'_, 'r> {
    /// Moves to the next element in this scope and returns its path relative to the element the scope
    /// was entered on (or the absolute path, for the document scope).
    ///
    /// Returns `None` once the scope's element is closed.
    pub fn next_element(&mut self) -> Result<Option<&str>, XmlError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let (namespace, event) = self.reader.reader.read_resolved_event()?;

            #[expect(clippy::wildcard_enum_match_arm, reason = "Library is stable")]
            match event {
                Event::Start(start) => {
                    let prefix = match namespace {
                        ResolveResult::Bound(Namespace(uri)) => known_prefix(uri),
                        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
                    };

                    self.reader.push(prefix, &start)?;

                    event!(Level::TRACE, path = %self.reader.path, "visiting");

                    return Ok(Some(&self.reader.path[self.prefix_len..]));
                },
                Event::End(_) => {
                    let closes_scope = self.reader.depth() == self.entry_depth;

                    self.reader.pop();

                    if closes_scope {
                        self.finished = true;

                        return Ok(None);
                    }
                },
                Event::Eof => {
                    self.finished = true;

                    if self.entry_depth > 0 || self.reader.depth() > 0 {
                        return Err(self.reader.unexpected_eof());
                    }

                    if !self.reader.seen_root {
                        return Err(XmlError::MissingRoot);
                    }

                    return Ok(None);
                },
                _ => {
                    // text between elements is not addressed by any path
                },
            }
        }
    }

    /// Reads the text content of the element last returned by [`Scope::next_element`]
    pub fn read_text(&mut self) -> Result<String, XmlError> {
        self.reader.read_text()
    }

    /// Hands the subtree of the element last returned by [`Scope::next_element`] to `parse`.
    ///
    /// Whatever `parse` leaves unvisited is skipped, so that on return this scope continues after the
    /// element's end tag.
    pub fn descend<T, E, F>(&mut self, parse: F) -> Result<T, E>
    where
        F: FnOnce(&mut Scope<'_, 'r>) -> Result<T, E>,
        E: From<XmlError>,
    {
        let entry_depth = self.reader.depth();
        let prefix_len = self.reader.path.len();

        let mut scope = Scope {
            reader: &mut *self.reader,
            entry_depth,
            prefix_len,
            finished: false,
        };

        let result = parse(&mut scope)?;

        scope.skip_rest()?;

        Ok(result)
    }

    fn skip_rest(&mut self) -> Result<(), XmlError> {
        while self.next_element()?.is_some() {}

        Ok(())
    }
}
