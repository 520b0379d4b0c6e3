//! Greedy paragraph/sentence packing for summarization input
//!
//! Lengths are measured in `char`s so CJK text packs the same way as ASCII.

const PARAGRAPH_SEP: &str = "\n\n";
const SENTENCE_SEP: &str = " ";

/// Pack `text` into chunks of at most `max_chunk_size` chars
///
/// Paragraphs (split on blank lines) are packed greedily. A paragraph that
/// cannot fit on its own is split into sentences, and a sentence that cannot
/// fit on its own is sliced into `max_chunk_size` windows. Content order is
/// preserved and empty chunks are never emitted.
pub fn pack(text: &str, max_chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut packer = Packer::new(max_chunk_size.max(1));

    for paragraph in text.split(PARAGRAPH_SEP) {
        packer.push_paragraph(paragraph);
    }

    packer.finish()
}

struct Packer {
    max: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl Packer {
    fn new(max: usize) -> Self {
        Self {
            max,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn push_paragraph(&mut self, paragraph: &str) {
        let len = paragraph.chars().count();

        if self.current_len + len + 2 <= self.max {
            self.append(paragraph, len, PARAGRAPH_SEP);
            return;
        }

        self.flush();

        if len > self.max {
            for sentence in split_sentences(paragraph) {
                self.push_sentence(sentence);
            }
        } else {
            self.append(paragraph, len, PARAGRAPH_SEP);
        }
    }

    fn push_sentence(&mut self, sentence: &str) {
        let len = sentence.chars().count();

        if self.current_len + len + 1 <= self.max {
            self.append(sentence, len, SENTENCE_SEP);
            return;
        }

        self.flush();

        if len > self.max {
            self.chunks.extend(hard_slice(sentence, self.max));
        } else {
            self.append(sentence, len, SENTENCE_SEP);
        }
    }

    fn append(&mut self, piece: &str, len: usize, sep: &str) {
        if !self.current.is_empty() {
            self.current.push_str(sep);
            self.current_len += sep.chars().count();
        }
        self.current.push_str(piece);
        self.current_len += len;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
        }
        self.current_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// Split a paragraph into sentences, keeping terminators attached
///
/// `。！？` always end a sentence; `.!?` only when followed by whitespace or
/// the end of the paragraph, so decimals and abbreviations like "e.g" stay
/// whole. Single newlines are boundaries too. Empty pieces are dropped.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        let end = i + c.len_utf8();

        let boundary = match c {
            '。' | '！' | '？' => Some(end),
            '.' | '!' | '?' if next.map_or(true, char::is_whitespace) => Some(end),
            '\n' => {
                push_sentence(&mut sentences, &paragraph[start..i]);
                start = end;
                None
            }
            _ => None,
        };

        if let Some(end) = boundary {
            push_sentence(&mut sentences, &paragraph[start..end]);
            start = end;
        }
    }

    push_sentence(&mut sentences, &paragraph[start..]);
    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim_start_matches([' ', '\t']);
    if !piece.is_empty() {
        sentences.push(piece);
    }
}

/// Slice into windows of exactly `max` chars; the last may be shorter
fn hard_slice(text: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max).map(|w| w.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    fn strip_separators(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(pack("", 100).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let text = "First paragraph.\n\nSecond paragraph.";
        assert_eq!(pack(text, 4000), vec![text.to_string()]);
    }

    #[test]
    fn test_paragraphs_split_at_limit() {
        let text = format!("{}\n\n{}\n\n{}", "a".repeat(40), "b".repeat(40), "c".repeat(40));
        let chunks = pack(&text, 90);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{}\n\n{}", "a".repeat(40), "b".repeat(40)));
        assert_eq!(chunks[1], "c".repeat(40));
    }

    #[test]
    fn test_twelve_thousand_chars_make_three_chunks() {
        let paragraph = "x".repeat(3990);
        let text = vec![paragraph.as_str(); 3].join("\n\n");
        let chunks = pack(&text, 4000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c == &paragraph));
    }

    #[test]
    fn test_size_bound_and_content_preserved() {
        let text = "The quick brown fox jumps over the lazy dog. It was not amused! \
                    Why would it be? Dogs rarely are.\n\n\
                    Short one.\n\n\
                    Another paragraph follows here, with a decimal 3.14 inside it.";
        for max in [10, 25, 40, 80, 500] {
            let chunks = pack(text, max);
            assert!(chunks.iter().all(|c| char_len(c) <= max), "max = {max}");
            assert!(chunks.iter().all(|c| !c.is_empty()));
            assert_eq!(strip_separators(&chunks.concat()), strip_separators(text));
        }
    }

    #[test]
    fn test_cjk_sentences() {
        let text = "这是第一句。这是第二句！这是第三句？";
        let chunks = pack(text, 8);
        assert_eq!(chunks, vec!["这是第一句。", "这是第二句！", "这是第三句？"]);
    }

    #[test]
    fn test_hard_slice_oversized_sentence() {
        let text = "y".repeat(25);
        let chunks = pack(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(char_len(&chunks[0]), 10);
        assert_eq!(char_len(&chunks[1]), 10);
        assert_eq!(char_len(&chunks[2]), 5);
    }

    #[test]
    fn test_sentence_remainder_carries_into_next_paragraph() {
        // Last sentence of an oversized paragraph stays open for the next one
        let text = format!("{}. {}.\n\nok", "a".repeat(12), "b".repeat(3));
        let chunks = pack(&text, 16);
        assert_eq!(chunks, vec![format!("{}.", "a".repeat(12)), "bbb.\n\nok".to_string()]);
    }

    #[test]
    fn test_decimal_is_not_a_boundary() {
        assert_eq!(split_sentences("Pi is 3.14 roughly. Next"), vec!["Pi is 3.14 roughly.", "Next"]);
    }

    #[test]
    fn test_zero_max_treated_as_one() {
        let chunks = pack("abc", 0);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    /// Text mixing paragraph breaks, ASCII and CJK terminators, decimals and
    /// long runs without any boundary
    fn mixed_text() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            Just("\n\n".to_string()),
            Just("\n".to_string()),
            Just(". ".to_string()),
            Just("! ".to_string()),
            Just("。".to_string()),
            Just(" ".to_string()),
            Just("3.14".to_string()),
            "[a-z]{1,8}",
            "[a-z]{20,60}",
            "[一-龥]{1,10}",
        ];
        prop::collection::vec(piece, 0..40).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn prop_chunks_within_bound(text in mixed_text(), max in 1usize..50) {
            for chunk in pack(&text, max) {
                prop_assert!(!chunk.is_empty());
                prop_assert!(char_len(&chunk) <= max, "chunk {:?} over {}", chunk, max);
            }
        }

        #[test]
        fn prop_content_preserved(text in mixed_text(), max in 1usize..50) {
            let chunks = pack(&text, max);
            prop_assert_eq!(strip_separators(&chunks.concat()), strip_separators(&text));
        }

        #[test]
        fn prop_unbroken_run_sliced_into_full_windows(run in "[a-z]{1,200}", max in 1usize..50) {
            let len = char_len(&run);
            let lengths: Vec<usize> = pack(&run, max).iter().map(|c| char_len(c)).collect();

            let mut expected = vec![max; len / max];
            if len % max != 0 {
                expected.push(len % max);
            }
            prop_assert_eq!(lengths, expected);
        }
    }
}
