//! Chapter and TOC normalization.
//!
//! Turns extractor output into a [`ParsedBook`]: positional ids and indices,
//! fallback titles, TOC depths and ids, TOC-to-chapter links and the word
//! total.

use std::collections::HashMap;
use std::path::Path;

use crate::book::{Chapter, ParsedBook, TocItem};
use crate::import::ExtractedBook;
use crate::util::{file_stem, normalize_href};

/// Normalize an extracted book read from `path`.
pub fn normalize(extracted: ExtractedBook, path: &Path) -> ParsedBook {
    let ExtractedBook {
        mut metadata,
        chapters,
        mut toc,
    } = extracted;

    metadata.ensure_title(&file_stem(path));

    let chapters: Vec<Chapter> = chapters
        .into_iter()
        .enumerate()
        .map(|(index, chapter)| Chapter {
            id: Chapter::id_for(index),
            title: chapter
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| format!("Chapter {}", index + 1)),
            index,
            content: chapter.content,
            word_count: chapter.word_count,
            href: chapter.href,
        })
        .collect();

    let mut by_href: HashMap<String, usize> = HashMap::new();
    for chapter in &chapters {
        if let Some(href) = &chapter.href {
            let key = normalize_href(href);
            if !key.is_empty() {
                by_href.entry(key).or_insert(chapter.index);
            }
        }
    }

    let mut next_id = 0;
    for item in &mut toc {
        link_toc(item, 0, &by_href, chapters.len(), &mut next_id);
    }

    let total_word_count = chapters.iter().map(|c| c.word_count).sum();
    log::debug!(
        "normalized {:?}: {} chapters, {} words, {} toc entries",
        metadata.title,
        chapters.len(),
        total_word_count,
        next_id
    );

    ParsedBook {
        metadata,
        chapters,
        toc,
        total_word_count,
    }
}

fn link_toc(
    item: &mut TocItem,
    level: usize,
    by_href: &HashMap<String, usize>,
    chapter_count: usize,
    next_id: &mut usize,
) {
    if item.id.is_empty() {
        item.id = format!("toc-{next_id}");
    }
    *next_id += 1;
    item.level = level;
    item.title = item.title.trim().to_string();

    item.chapter_index = match item.chapter_index {
        Some(index) if index < chapter_count => Some(index),
        Some(_) => None,
        None => by_href.get(&normalize_href(&item.href)).copied(),
    };

    for child in &mut item.children {
        link_toc(child, level + 1, by_href, chapter_count, next_id);
    }
}
