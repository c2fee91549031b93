use crate::snippet::{query_terms, snippet_around, FoldedText};
use crate::{DocumentRecord, IndexOptions, SearchHit};

/// A stored record plus its lower-cased text, folded once at ingestion.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub record: DocumentRecord,
    folded: FoldedText,
}

impl IndexedDocument {
    pub fn new(record: DocumentRecord) -> Self {
        let folded = FoldedText::new(&record.content);
        Self { record, folded }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMatch {
    pub score: usize,
    pub snippet: String,
}

/// Scores one point per query term found anywhere in the document. The
/// snippet is anchored on the longest matching term (earliest on ties),
/// at its first occurrence.
pub fn match_document(
    document: &IndexedDocument,
    terms: &[String],
    window: usize,
) -> Option<DocumentMatch> {
    let mut score = 0;
    let mut anchor: Option<(usize, usize, usize)> = None;

    for term in terms {
        let Some((start, end)) = document.folded.find(term) else {
            continue;
        };
        score += 1;

        let length = term.chars().count();
        if anchor.map_or(true, |(best, _, _)| length > best) {
            anchor = Some((length, start, end));
        }
    }

    let (_, start, end) = anchor?;
    let snippet = snippet_around(&document.record.content, start, end, window);
    if snippet.is_empty() {
        return None;
    }

    Some(DocumentMatch { score, snippet })
}

/// Top `result_limit` documents by descending score. Equal scores keep
/// corpus order.
pub fn rank(documents: &[IndexedDocument], query: &str, options: &IndexOptions) -> Vec<SearchHit> {
    let terms = query_terms(query, options.min_token_chars);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut matches = documents
        .iter()
        .filter_map(|document| {
            match_document(document, &terms, options.snippet_window)
                .map(|found| (found, &document.record))
        })
        .collect::<Vec<_>>();

    matches.sort_by(|left, right| right.0.score.cmp(&left.0.score));

    matches
        .into_iter()
        .take(options.result_limit)
        .map(|(found, record)| SearchHit {
            text: found.snippet,
            title: record.title.clone(),
            locator: record.locator.clone(),
        })
        .collect()
}
