use rand::seq::IndexedRandom;

const VOCABULARY: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "eu", "fugiat", "nulla",
    "pariatur", "excepteur", "sint", "occaecat", "cupidatat", "non", "proident", "sunt",
    "culpa", "qui", "officia", "deserunt", "mollit", "anim", "id", "est", "laborum",
];

/// Source of single words for paragraph generation
pub trait WordSource: Send + Sync {
    fn word(&self) -> &'static str;
}

/// Picks words uniformly from the lorem ipsum vocabulary using the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct LoremWords;

impl WordSource for LoremWords {
    fn word(&self) -> &'static str {
        VOCABULARY.choose(&mut rand::rng()).copied().unwrap_or("lorem")
    }
}

/// Generate `paragraphs` strings of `words` space-separated words each.
///
/// `words == 0` yields empty strings; `paragraphs == 0` yields an empty list.
pub fn generate<W: WordSource + ?Sized>(source: &W, paragraphs: u32, words: u32) -> Vec<String> {
    (0..paragraphs)
        .map(|_| {
            (0..words)
                .map(|_| source.word())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
