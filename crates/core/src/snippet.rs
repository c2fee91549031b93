/// Lower-cased copy of a text that can map matches back onto the original.
///
/// Lower-casing may change byte lengths, so every folded byte remembers the
/// offset of the original character it came from.
#[derive(Debug, Clone)]
pub struct FoldedText {
    folded: String,
    origins: Vec<usize>,
}

impl FoldedText {
    pub fn new(original: &str) -> Self {
        let mut folded = String::with_capacity(original.len());
        let mut origins = Vec::with_capacity(original.len() + 1);

        for (offset, ch) in original.char_indices() {
            for lower in ch.to_lowercase() {
                let before = folded.len();
                folded.push(lower);
                origins.extend(std::iter::repeat(offset).take(folded.len() - before));
            }
        }
        origins.push(original.len());

        Self { folded, origins }
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    /// Byte range in the original text of the first occurrence of `term`,
    /// which must already be lower-case.
    pub fn find(&self, term: &str) -> Option<(usize, usize)> {
        let start = self.folded.find(term)?;
        let end = start + term.len();
        Some((self.origins[start], self.origins[end]))
    }
}

/// Per-character lower-casing, the same folding [`FoldedText`] applies, so
/// a query copied from a document always finds it.
fn fold(token: &str) -> String {
    token.chars().flat_map(char::to_lowercase).collect()
}

/// Lower-cases and splits on whitespace, keeping tokens of at least
/// `min_chars` characters.
pub fn query_terms(query: &str, min_chars: usize) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|token| token.chars().count() >= min_chars)
        .map(fold)
        .collect()
}

/// Cuts `window` characters of context around `content[start..end]`, split
/// evenly on both sides, then widens both edges outward to whitespace so no
/// word is cut in half.
pub fn snippet_around(content: &str, start: usize, end: usize, window: usize) -> String {
    let half = window / 2;
    let from = widen_start(content, step_back(content, start, half));
    let to = widen_end(content, step_forward(content, end, half));

    content[from..to].trim().to_string()
}

fn step_back(content: &str, offset: usize, chars: usize) -> usize {
    if chars == 0 {
        return offset;
    }
    content[..offset]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map_or(0, |(index, _)| index)
}

fn step_forward(content: &str, offset: usize, chars: usize) -> usize {
    content[offset..]
        .char_indices()
        .nth(chars)
        .map_or(content.len(), |(index, _)| offset + index)
}

fn widen_start(content: &str, from: usize) -> usize {
    if from == 0 {
        return 0;
    }

    // a window that already starts on whitespace stays where it is
    let upto = from + content[from..].chars().next().map_or(0, char::len_utf8);
    content[..upto]
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(0, |(index, ch)| index + ch.len_utf8())
}

fn widen_end(content: &str, to: usize) -> usize {
    if to >= content.len() {
        return content.len();
    }

    content[to..]
        .char_indices()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(content.len(), |(index, _)| to + index)
}
