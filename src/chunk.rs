use crate::normalize::NormalizedText;

/// Partition normalized text into chunks of at most `max_len` bytes, splitting
/// only at line boundaries. A single line longer than `max_len` is emitted as
/// its own oversized chunk rather than split mid-line.
///
/// `max_len` must be positive; passing 0 is a caller bug.
pub fn chunk(text: &NormalizedText, max_len: usize) -> Vec<String> {
    assert!(max_len > 0, "chunk size must be positive");

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > max_len {
            chunks.push(current.trim_end().to_string());
            current = String::new();
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        chunks.push(current.trim_end().to_string());
    }

    chunks
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[&str]) -> NormalizedText {
        NormalizedText::from_text(&lines.join("\n"))
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk(&text(&[]), 100).is_empty());
    }

    #[test]
    fn single_chunk_when_under_limit() {
        let chunks = chunk(&text(&["one", "two", "three"]), 100);
        assert_eq!(chunks, ["one\ntwo\nthree"]);
    }

    #[test]
    fn splits_at_line_boundaries() {
        let chunks = chunk(&text(&["aaaa", "bbbb", "cccc"]), 10);
        assert_eq!(chunks, ["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn oversized_line_becomes_own_chunk() {
        let long = "x".repeat(50);
        let chunks = chunk(&text(&["short", &long, "tail"]), 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], long);
        assert!(chunks[1].len() > 10);
    }

    #[test]
    fn reconstruction_preserves_line_sequence() {
        let lines: Vec<String> = (0..40).map(|i| format!("line number {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
        let input = text(&refs);

        for max_len in [1, 8, 40, 200, 10_000] {
            let chunks = chunk(&input, max_len);
            let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.lines()).collect();
            assert_eq!(rejoined, refs, "max_len={}", max_len);
        }
    }

    #[test]
    fn no_chunk_exceeds_limit_unless_single_line() {
        let lines: Vec<String> = (0..30).map(|i| format!("entry {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
        let chunks = chunk(&text(&refs), 25);
        for c in &chunks {
            assert!(c.len() <= 25 || !c.contains('\n'), "bad chunk: {:?}", c);
        }
    }

    #[test]
    #[should_panic(expected = "chunk size must be positive")]
    fn zero_max_len_panics() {
        chunk(&text(&["a"]), 0);
    }
}
