pub mod error;
pub mod extractor;
pub mod index;
pub mod manifest;
pub mod models;
pub mod search;
pub mod snippet;

pub use error::{IngestError, Result};
pub use extractor::{
    extract_pdf_text, DocumentSource, ExtractedText, LopdfExtractor, ResolvedLocator,
    TextExtractor,
};
pub use index::DocumentIndex;
pub use manifest::{discover_manifest, is_indexable_locator, load_manifest};
pub use models::{
    DocumentDescriptor, DocumentRecord, IndexOptions, IndexState, SearchHit, SkippedDocument,
};
pub use search::{match_document, rank, DocumentMatch, IndexedDocument};
pub use snippet::{query_terms, snippet_around, FoldedText};
pub use tokio_util::sync::CancellationToken;
