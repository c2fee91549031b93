use docportal_core::{DocumentIndex, SearchHit, TextExtractor};

pub const NO_GROUNDING: &str = "no grounding found for this question";

/// Context block a prompt builder feeds to the answer model, one numbered
/// source per hit.
pub fn grounding_block(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_GROUNDING.to_string();
    }

    let mut block = format!("question: {query}\n");
    for (position, hit) in hits.iter().enumerate() {
        block.push_str(&format!(
            "[{}] {} ({})\n{}\n",
            position + 1,
            hit.title,
            hit.locator,
            hit.text
        ));
    }
    block
}

pub fn document_listing<E: TextExtractor>(index: &DocumentIndex<E>) -> String {
    let mut listing = String::new();

    for record in index.documents() {
        listing.push_str(&format!(
            "indexed  [{}] {} pages={} chars={} locator={}\n",
            record.category,
            record.title,
            record.pages,
            record.content.chars().count(),
            record.locator
        ));
    }
    for skipped in index.skipped() {
        listing.push_str(&format!(
            "skipped  {} locator={} reason={}\n",
            skipped.title, skipped.locator, skipped.reason
        ));
    }

    listing
}
