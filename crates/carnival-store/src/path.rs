//! Slash-separated document and collection paths.
//!
//! Documents live at an even number of segments
//! (`users/u1/apps/carnival-planner-v1`), collections at an odd number
//! (`users/u1/apps/carnival-planner-v1/carnivals`).

use std::fmt;

use crate::error::{Result, StoreError};

fn split_segments(path: &str) -> Result<Vec<String>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

fn check_segments(segments: &[String]) -> Result<()> {
    if segments.is_empty() || segments.iter().any(|s| s.is_empty() || s.contains('/')) {
        return Err(StoreError::InvalidPath(segments.join("/")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    pub fn parse(path: &str) -> Result<Self> {
        Self::from_segments(split_segments(path)?)
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        check_segments(&segments)?;
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath(format!(
                "{} (documents need an even number of segments)",
                segments.join("/")
            )));
        }
        Ok(Self { segments })
    }

    /// Last segment: the document id.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Collection that contains this document.
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Sub-collection nested under this document.
    pub fn collection(&self, name: &str) -> Result<CollectionPath> {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        CollectionPath::from_segments(segments)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    pub fn parse(path: &str) -> Result<Self> {
        Self::from_segments(split_segments(path)?)
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        check_segments(&segments)?;
        if segments.len() % 2 != 1 {
            return Err(StoreError::InvalidPath(format!(
                "{} (collections need an odd number of segments)",
                segments.join("/")
            )));
        }
        Ok(Self { segments })
    }

    /// Document with the given id inside this collection.
    pub fn doc(&self, id: &str) -> Result<DocumentPath> {
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        DocumentPath::from_segments(segments)
    }

    /// True if `path` is a direct child document of this collection.
    pub fn contains(&self, path: &DocumentPath) -> bool {
        path.parent() == *self
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
