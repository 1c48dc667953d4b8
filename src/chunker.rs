use serde::Serialize;

/// A paragraph of the reference document used as a retrieval unit.
/// `index` is the chunk's position among the kept chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Splits a document on blank lines and keeps paragraphs whose trimmed
/// length is strictly greater than `min_chars` characters.
pub fn chunk_paragraphs(text: &str, min_chars: usize) -> Vec<Chunk> {
    let normalized = text.replace("\r\n", "\n");

    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| paragraph.chars().count() > min_chars)
        .enumerate()
        .map(|(index, paragraph)| Chunk {
            index,
            text: paragraph.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = "A set is a well-defined collection of objects, such as the vowels of the English alphabet.";
    const SET_BUILDER: &str = "In set-builder form, all the elements of a set possess a single common property which is not possessed by any element outside the set.";

    #[test]
    fn test_empty_document_yields_no_chunks() {
        assert!(chunk_paragraphs("", 50).is_empty());
        assert!(chunk_paragraphs("\n\n\n\n", 50).is_empty());
    }

    #[test]
    fn test_short_paragraphs_are_dropped() {
        let text = format!("Sets\n\n{DEFINITION}\n\nExercise 1.1\n\n{SET_BUILDER}");
        let chunks = chunk_paragraphs(&text, 50);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, DEFINITION);
        assert_eq!(chunks[1].text, SET_BUILDER);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_length_threshold_is_strict() {
        let exactly_fifty = "x".repeat(50);
        let fifty_one = "y".repeat(51);
        let text = format!("{exactly_fifty}\n\n{fifty_one}");

        let chunks = chunk_paragraphs(&text, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, fifty_one);
    }

    #[test]
    fn test_chunks_are_trimmed() {
        let text = format!("   {DEFINITION}   \n\n\t{SET_BUILDER}\n");
        let chunks = chunk_paragraphs(&text, 50);

        assert_eq!(chunks[0].text, DEFINITION);
        assert_eq!(chunks[1].text, SET_BUILDER);
    }

    #[test]
    fn test_windows_line_endings_split_paragraphs() {
        let text = format!("{DEFINITION}\r\n\r\n{SET_BUILDER}");
        let chunks = chunk_paragraphs(&text, 50);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = format!("{DEFINITION}\n\n{SET_BUILDER}\n\nshort");
        assert_eq!(chunk_paragraphs(&text, 50), chunk_paragraphs(&text, 50));
    }

    #[test]
    fn test_threshold_counts_characters_not_bytes() {
        // 26 two-byte characters: 52 bytes but only 26 chars
        let greek = "α".repeat(26);
        assert!(chunk_paragraphs(&greek, 50).is_empty());
    }
}
