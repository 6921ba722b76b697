//! Group contiguous pages into fixed-size chunks.
//!
//! Each chunk becomes exactly one generation request downstream, so the
//! chunk size is the request-size control: `ceil(M / K)` chunks for M pages
//! at K pages per chunk. Chunks cover the input exactly once, in order, with
//! no overlap and no gaps, and a chunk boundary never splits a page.

use crate::output::PageText;

/// A contiguous group of pages batched into one generation request.
///
/// Transient: exists only while iterating chunks for analysis calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based chunk index.
    pub index: usize,
    /// First page number (1-based, inclusive).
    pub first_page: usize,
    /// Last page number (1-based, inclusive).
    pub last_page: usize,
    /// All page texts of the chunk, newline-joined, page order preserved.
    pub text: String,
}

/// Partition pages into chunks of at most `chunk_size` pages.
///
/// `chunk_size` must be ≥ 1; config validation guarantees this for library
/// callers. An empty page list yields an empty chunk list.
pub fn chunk_pages(pages: &[PageText], chunk_size: usize) -> Vec<Chunk> {
    assert!(chunk_size >= 1, "chunk_size must be ≥ 1");

    pages
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, group)| Chunk {
            index: i + 1,
            first_page: group.first().map(|p| p.number).unwrap_or(0),
            last_page: group.last().map(|p| p.number).unwrap_or(0),
            text: group
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(n: usize) -> Vec<PageText> {
        (1..=n)
            .map(|number| PageText {
                number,
                text: format!("text of page {number}"),
            })
            .collect()
    }

    #[test]
    fn chunk_count_is_ceil_of_pages_over_size() {
        let cases = [(10, 3, 4), (9, 3, 3), (1, 3, 1), (90, 90, 1), (91, 90, 2)];
        for (m, k, expected) in cases {
            assert_eq!(
                chunk_pages(&pages(m), k).len(),
                expected,
                "M={m} K={k}"
            );
        }
    }

    #[test]
    fn chunks_cover_pages_exactly_once_in_order() {
        let input = pages(10);
        let chunks = chunk_pages(&input, 3);

        let mut covered = Vec::new();
        for chunk in &chunks {
            for n in chunk.first_page..=chunk.last_page {
                covered.push(n);
            }
        }
        assert_eq!(covered, (1..=10).collect::<Vec<_>>());

        // Boundaries are contiguous: each chunk starts right after the last.
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].first_page, pair[0].last_page + 1);
        }
    }

    #[test]
    fn chunk_size_at_least_page_count_gives_single_chunk() {
        let input = pages(3);
        let chunks = chunk_pages(&input, 90);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].first_page, 1);
        assert_eq!(chunks[0].last_page, 3);
        assert_eq!(
            chunks[0].text,
            "text of page 1\ntext of page 2\ntext of page 3"
        );
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_pages(&[], 5).is_empty());
    }

    #[test]
    fn chunk_text_preserves_page_order() {
        let chunks = chunk_pages(&pages(4), 2);
        assert_eq!(chunks[0].text, "text of page 1\ntext of page 2");
        assert_eq!(chunks[1].text, "text of page 3\ntext of page 4");
        assert_eq!(chunks[0].index, 1);
        assert_eq!(chunks[1].index, 2);
    }
}
