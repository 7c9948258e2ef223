use rand::Rng;

const MIN_WORDS: usize = 3;
const MAX_WORDS: usize = 5;

/// Splits an already complete reply into runs of 3-5 words so the client can
/// render it progressively. Joining the chunks gives back `text` exactly.
pub fn chunk_words<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let words: Vec<&str> = text.split(' ').collect();
    let mut chunks = Vec::with_capacity(words.len() / MIN_WORDS + 1);
    let mut start = 0;

    while start < words.len() {
        let size = rng.gen_range(MIN_WORDS..=MAX_WORDS);
        let end = (start + size).min(words.len());
        let mut chunk = words[start..end].join(" ");
        if end < words.len() {
            chunk.push(' ');
        }
        chunks.push(chunk);
        start = end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_chunks_reassemble_to_input() {
        let text = "Protein helps repair muscle after training, so aim for a source of it at every meal. \
                    Vegetables add fiber and micronutrients.";
        let mut rng = StdRng::seed_from_u64(7);

        let chunks = chunk_words(text, &mut rng);

        assert_eq!(chunks.concat(), text);
        for chunk in &chunks[..chunks.len() - 1] {
            let words = chunk.trim_end_matches(' ').split(' ').count();
            assert!((MIN_WORDS..=MAX_WORDS).contains(&words), "chunk {:?}", chunk);
            assert!(chunk.ends_with(' '));
        }
    }

    #[test]
    fn test_short_and_empty_text() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(chunk_words("", &mut rng).is_empty());
        assert_eq!(chunk_words("Hello there", &mut rng), vec!["Hello there"]);
    }
}
