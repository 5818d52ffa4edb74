//! Heading-aware Markdown chunker.
//!
//! Splits a document's body text into [`Chunk`]s that respect a
//! configurable `max_tokens` budget, tagging each chunk with the chain of
//! headings in effect where it starts (e.g. `"# Title > ## Section"`).
//!
//! Each chunk receives a deterministic index, a UUID, and a SHA-256 hash
//! of its content for staleness detection in the embedding pipeline.
//!
//! # Algorithm
//!
//! 1. Scan the text into a flat block sequence: headings vs. opaque
//!    content (paragraphs, lists, tables, fenced code; fences are never
//!    parsed for headings).
//! 2. Maintain a running buffer and an explicit heading stack. A heading
//!    that starts a sibling or ancestor section (level ≤ stack top) closes
//!    the buffer under the path in effect before it; a heading that only
//!    deepens the stack keeps accumulating, so a section stays whole until
//!    the budget says otherwise.
//! 3. After appending a content block, a buffer at or over `max_tokens`
//!    closes under the current path and the next buffer is seeded with a
//!    paragraph-unit overlap from the closed chunk.
//! 4. Closing candidates below `min_tokens` merge into the previous chunk
//!    when the merged size stays within `max_tokens`.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::models::Chunk;
use crate::token::TokenCounter;

/// A block-level node of the scanned document. Closed set: everything
/// that is not a heading is opaque content.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Heading { level: usize, text: String },
    Content { text: String },
}

/// Heading-scoped, token-budgeted chunker with overlap and small-chunk
/// merging. Generic over the token counter so a real tokenizer can slot
/// in without touching the splitting logic.
pub struct MarkdownChunker<C> {
    counter: C,
    config: ChunkingConfig,
}

impl<C: TokenCounter> MarkdownChunker<C> {
    pub fn new(counter: C, config: ChunkingConfig) -> Self {
        Self { counter, config }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    /// Split `text` into ordered chunks. Empty or blank input yields an
    /// empty list.
    pub fn chunk(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut heading_path = String::new();
        let mut buffer = String::new();

        for block in scan_blocks(text) {
            match block {
                Block::Heading { level, text: line } => {
                    // A sibling/ancestor heading pops the stack and ends
                    // the current section chunk; a deeper heading keeps
                    // accumulating into it.
                    let pops = stack.last().is_some_and(|entry| level <= entry.0);
                    if pops && !buffer.trim().is_empty() {
                        self.close_candidate(document_id, &mut chunks, &buffer, &heading_path);
                        buffer.clear();
                    }
                    while stack.last().is_some_and(|entry| entry.0 >= level) {
                        stack.pop();
                    }
                    stack.push((level, line.clone()));
                    heading_path = self.render_path(&stack);
                    append_block(&mut buffer, &line);
                }
                Block::Content { text: body } => {
                    append_block(&mut buffer, &body);
                    if self.counter.count(&buffer) >= self.config.max_tokens {
                        self.close_candidate(document_id, &mut chunks, &buffer, &heading_path);
                        let overlap = self.extract_overlap(buffer.trim());
                        buffer.clear();
                        buffer.push_str(&overlap);
                    }
                }
            }
        }

        if !buffer.trim().is_empty() {
            self.close_candidate(document_id, &mut chunks, &buffer, &heading_path);
        }

        chunks
    }

    /// Close/emit rule: trim, discard if empty, merge into the previous
    /// chunk when below `min_tokens` and the merged size still fits,
    /// otherwise emit as a new chunk. The very first candidate always
    /// emits regardless of size.
    fn close_candidate(
        &self,
        document_id: &str,
        chunks: &mut Vec<Chunk>,
        candidate: &str,
        heading_path: &str,
    ) {
        let content = candidate.trim();
        if content.is_empty() {
            return;
        }
        let token_count = self.counter.count(content);
        if token_count < self.config.min_tokens {
            if let Some(prev) = chunks.last_mut() {
                let merged = format!("{}\n\n{}", prev.content, content);
                let merged_count = self.counter.count(&merged);
                if merged_count <= self.config.max_tokens {
                    // The merged chunk keeps the previous chunk's heading
                    // path and index.
                    prev.token_count = merged_count;
                    prev.hash = content_hash(&merged);
                    prev.content = merged;
                    return;
                }
            }
        }
        let index = chunks.len() as i64;
        chunks.push(make_chunk(
            document_id,
            index,
            content,
            heading_path,
            token_count,
        ));
    }

    /// Walk paragraph units of a closed chunk from the end, prepending
    /// whole units while the overlap stays within `overlap_tokens`.
    fn extract_overlap(&self, content: &str) -> String {
        if self.config.overlap_tokens == 0 {
            return String::new();
        }
        let mut overlap = String::new();
        for unit in content.rsplit("\n\n") {
            let unit = unit.trim();
            if unit.is_empty() {
                continue;
            }
            let candidate = if overlap.is_empty() {
                unit.to_string()
            } else {
                format!("{}\n\n{}", unit, overlap)
            };
            if self.counter.count(&candidate) > self.config.overlap_tokens {
                break;
            }
            overlap = candidate;
        }
        overlap
    }

    fn render_path(&self, stack: &[(usize, String)]) -> String {
        stack
            .iter()
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join(&self.config.heading_path_separator)
    }
}

/// Scan text into heading and content blocks. Fenced code (``` or ~~~) is
/// one opaque content block, blank lines and `#` included.
fn scan_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut para: Vec<&str> = Vec::new();
    let mut fence: Option<&str> = None;

    for line in text.lines() {
        if let Some(marker) = fence {
            para.push(line);
            if line.trim_start().starts_with(marker) {
                fence = None;
            }
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            fence = Some(&trimmed[..3]);
            para.push(line);
            continue;
        }
        if line.trim().is_empty() {
            flush_content(&mut blocks, &mut para);
            continue;
        }
        if let Some(level) = heading_level(line) {
            flush_content(&mut blocks, &mut para);
            blocks.push(Block::Heading {
                level,
                text: line.trim_end().to_string(),
            });
            continue;
        }
        para.push(line);
    }
    flush_content(&mut blocks, &mut para);
    blocks
}

fn flush_content<'a>(blocks: &mut Vec<Block>, para: &mut Vec<&'a str>) {
    if !para.is_empty() {
        blocks.push(Block::Content {
            text: para.join("\n"),
        });
        para.clear();
    }
}

/// ATX heading level: 1-6 leading `#` followed by whitespace or end of
/// line. Seven or more `#` is ordinary content.
fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match line.as_bytes().get(hashes) {
        None | Some(b' ') | Some(b'\t') => Some(hashes),
        _ => None,
    }
}

fn append_block(buffer: &mut String, text: &str) {
    if !buffer.is_empty() {
        buffer.push_str("\n\n");
    }
    buffer.push_str(text);
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn make_chunk(
    document_id: &str,
    index: i64,
    content: &str,
    heading_path: &str,
    token_count: usize,
) -> Chunk {
    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        content: content.to_string(),
        heading_path: heading_path.to_string(),
        token_count,
        hash: content_hash(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::HeuristicTokenCounter;

    fn chunker(
        max_tokens: usize,
        min_tokens: usize,
        overlap_tokens: usize,
    ) -> MarkdownChunker<HeuristicTokenCounter> {
        MarkdownChunker::new(
            HeuristicTokenCounter::default(),
            ChunkingConfig {
                max_tokens,
                min_tokens,
                overlap_tokens,
                heading_path_separator: " > ".to_string(),
            },
        )
    }

    fn assert_counts_consistent(chunks: &[Chunk]) {
        let counter = HeuristicTokenCounter::default();
        for c in chunks {
            assert_eq!(
                c.token_count,
                counter.count(&c.content),
                "token_count drifted for chunk {}",
                c.chunk_index
            );
        }
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let c = chunker(700, 1, 0);
        assert!(c.chunk("doc1", "").is_empty());
        assert!(c.chunk("doc1", "   \n\n  \n").is_empty());
    }

    #[test]
    fn test_document_that_fits_is_one_chunk() {
        let c = chunker(1000, 1, 0);
        let chunks = c.chunk("doc1", "# A\n\npara1\n\n## B\n\npara2");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].heading_path, "# A > ## B");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_counts_consistent(&chunks);
    }

    #[test]
    fn test_no_headings_single_chunk_empty_path() {
        let c = chunker(700, 1, 0);
        let chunks = c.chunk("doc1", "just some plain text\n\nsecond paragraph");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].heading_path, "");
        assert!(chunks[0].content.contains("second paragraph"));
    }

    #[test]
    fn test_sibling_headings_split_sections() {
        let c = chunker(700, 1, 0);
        let chunks = c.chunk("doc1", "# A\n\nalpha body\n\n# B\n\nbeta body");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading_path, "# A");
        assert_eq!(chunks[1].heading_path, "# B");
        assert!(chunks[0].content.contains("alpha body"));
        assert!(chunks[1].content.starts_with("# B"));
        assert_counts_consistent(&chunks);
    }

    #[test]
    fn test_ancestor_heading_pops_stack_and_closes() {
        let c = chunker(700, 1, 0);
        let chunks = c.chunk("doc1", "# A\n\n## B\n\nxxxx\n\n# C\n\nyyyy");
        assert_eq!(chunks.len(), 2);
        // The chunk closed by `# C` carries the path in effect before it.
        assert_eq!(chunks[0].heading_path, "# A > ## B");
        assert_eq!(chunks[1].heading_path, "# C");
    }

    #[test]
    fn test_consecutive_headings_concatenate() {
        let c = chunker(700, 1, 0);
        let chunks = c.chunk("doc1", "# A\n\n## B");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "# A\n\n## B");
        assert_eq!(chunks[0].heading_path, "# A > ## B");
    }

    #[test]
    fn test_token_budget_splits_content() {
        // Three 16-char paragraphs at 4 tokens each, budget 8.
        let text = "one one one 1111\n\ntwo two two 2222\n\nthr thr thr 3333";
        let c = chunker(8, 1, 0);
        let chunks = c.chunk("doc1", text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].token_count >= 8);
        assert_eq!(chunks[0].heading_path, "");
        assert_eq!(chunks[1].content, "thr thr thr 3333");
        assert_counts_consistent(&chunks);
    }

    #[test]
    fn test_overlap_seeds_next_chunk_within_budget() {
        let text =
            "one one one 1111\n\ntwo two two 2222\n\nthr thr thr 3333\n\nfou fou fou 4444";
        let c = chunker(10, 1, 6);
        let chunks = c.chunk("doc1", text);
        assert_eq!(chunks.len(), 2);
        // Only the last paragraph fits the 6-token overlap budget.
        assert!(chunks[1].content.starts_with("thr thr thr 3333"));
        let counter = HeuristicTokenCounter::default();
        assert!(counter.count("thr thr thr 3333") <= 6);
        assert_counts_consistent(&chunks);
    }

    #[test]
    fn test_zero_overlap_has_no_duplication() {
        let text = "one one one 1111\n\ntwo two two 2222\n\nthr thr thr 3333";
        let c = chunker(8, 1, 0);
        let chunks = c.chunk("doc1", text);
        assert_eq!(chunks.len(), 2);
        assert!(!chunks[1].content.contains("two two two 2222"));
    }

    #[test]
    fn test_small_tail_merges_into_previous() {
        let c = chunker(100, 4, 0);
        let chunks = c.chunk("doc1", "# A\n\npara one is long enough here\n\n# B\n\nhi");
        assert_eq!(chunks.len(), 1);
        // Merged chunk keeps the previous chunk's heading path.
        assert_eq!(chunks[0].heading_path, "# A");
        assert!(chunks[0].content.ends_with("hi"));
        assert_counts_consistent(&chunks);
    }

    #[test]
    fn test_small_tail_emits_when_merge_would_overflow() {
        let c = chunker(12, 4, 0);
        let chunks = c.chunk(
            "doc1",
            "# A\n\nwords words words words words 123456\n\n# B\n\nhi",
        );
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].heading_path, "# B");
        assert!(chunks[1].token_count < 4);
    }

    #[test]
    fn test_first_chunk_may_be_below_min() {
        let c = chunker(700, 50, 0);
        let chunks = c.chunk("doc1", "hi");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].token_count < 50);
    }

    #[test]
    fn test_code_fence_hides_hash_lines() {
        let text = "# A\n\n```\n# not a heading\ncode line\n```\n\nafter";
        let c = chunker(700, 1, 0);
        let chunks = c.chunk("doc1", text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].heading_path, "# A");
        assert!(chunks[0].content.contains("# not a heading"));
        assert!(chunks[0].content.contains("```"));
    }

    #[test]
    fn test_seven_hashes_is_content() {
        let c = chunker(700, 1, 0);
        let chunks = c.chunk("doc1", "# A\n\n####### not a heading");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].heading_path, "# A");
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let text = (0..20)
            .map(|i| format!("# H{}\n\nparagraph number {} with some body text", i, i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let c = chunker(20, 1, 0);
        let chunks = c.chunk("doc1", &text);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as i64);
        }
    }

    #[test]
    fn test_reconstruction_covers_original_content() {
        let text = "# A\n\nalpha body text\n\n## B\n\nbeta body text\n\n# C\n\ngamma body";
        let c = chunker(700, 1, 0);
        let chunks = c.chunk("doc1", text);
        let joined = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        for needle in ["alpha body text", "beta body text", "gamma body", "## B"] {
            assert!(joined.contains(needle), "missing {:?}", needle);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "# A\n\nalpha\n\n## B\n\nbeta\n\n# C\n\ngamma";
        let a = chunker(10, 1, 4).chunk("doc1", text);
        let b = chunker(10, 1, 4).chunk("doc1", text);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.content, y.content);
            assert_eq!(x.heading_path, y.heading_path);
            assert_eq!(x.hash, y.hash);
        }
    }
}
