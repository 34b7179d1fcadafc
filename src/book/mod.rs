//! Normalized book representation produced by every extractor.

/// Book metadata (Dublin Core subset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookMetadata {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub isbn: Option<String>,
    pub subjects: Vec<String>,
}

/// One chapter of a parsed book.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chapter {
    /// Stable id derived from position (`chapter-<index>`).
    pub id: String,
    pub title: String,
    /// Zero-based position in reading order.
    pub index: usize,
    /// Plain text, or the source markup when the parser keeps it.
    pub content: String,
    pub word_count: usize,
    /// Source-relative path of the content document, when the format has one.
    pub href: Option<String>,
}

/// A table of contents entry (hierarchical).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocItem {
    pub id: String,
    pub title: String,
    pub href: String,
    /// Depth in the tree, zero at the root.
    pub level: usize,
    pub children: Vec<TocItem>,
    /// Chapter this entry points at, if its href resolved to one.
    pub chapter_index: Option<usize>,
}

/// The output of the extraction pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedBook {
    pub metadata: BookMetadata,
    pub chapters: Vec<Chapter>,
    pub toc: Vec<TocItem>,
    pub total_word_count: usize,
}

impl BookMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }

    /// Replace a blank title with `fallback` (usually the filename stem).
    pub(crate) fn ensure_title(&mut self, fallback: &str) {
        if self.title.trim().is_empty() {
            self.title = fallback.to_string();
        } else {
            self.title = self.title.trim().to_string();
        }
    }
}

impl Chapter {
    /// `chapter-<index>`
    pub fn id_for(index: usize) -> String {
        format!("chapter-{index}")
    }
}

impl TocItem {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            href: href.into(),
            level: 0,
            children: Vec::new(),
            chapter_index: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_child(mut self, child: TocItem) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first iterator over this entry and all of its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &TocItem> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let item = stack.pop()?;
            stack.extend(item.children.iter().rev());
            Some(item)
        })
    }
}

impl ParsedBook {
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    /// Depth-first iterator over every TOC entry.
    pub fn toc_entries(&self) -> impl Iterator<Item = &TocItem> {
        self.toc.iter().flat_map(|item| item.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
