use crate::extractor::TextExtractor;
use crate::manifest::is_indexable_locator;
use crate::search::{rank, IndexedDocument};
use crate::{
    DocumentDescriptor, DocumentRecord, IndexOptions, IndexState, IngestError, SearchHit,
    SkippedDocument,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Corpus {
    documents: Vec<IndexedDocument>,
    skipped: Vec<SkippedDocument>,
}

/// In-memory text index over a manifest of documents.
///
/// `initialize` ingests once; later and concurrent calls wait on the same
/// ingestion and never repeat it. `search` is a plain read of the finished
/// corpus and needs no locking. Neither operation returns an error: failed
/// documents are left out and an unready index answers with no hits.
pub struct DocumentIndex<E> {
    extractor: E,
    options: IndexOptions,
    corpus: OnceCell<Corpus>,
    started: AtomicBool,
}

impl<E> DocumentIndex<E>
where
    E: TextExtractor,
{
    pub fn new(extractor: E) -> Self {
        Self::with_options(extractor, IndexOptions::default())
    }

    pub fn with_options(extractor: E, options: IndexOptions) -> Self {
        Self {
            extractor,
            options,
            corpus: OnceCell::new(),
            started: AtomicBool::new(false),
        }
    }

    pub async fn initialize(&self, manifest: &[DocumentDescriptor]) {
        self.initialize_with_cancel(manifest, &CancellationToken::new())
            .await;
    }

    /// Like [`initialize`](Self::initialize), but stops fetching once `cancel`
    /// fires. Documents finished by then stay indexed and the index is ready.
    pub async fn initialize_with_cancel(
        &self,
        manifest: &[DocumentDescriptor],
        cancel: &CancellationToken,
    ) {
        if self.corpus.initialized() {
            debug!("document index already initialized");
            return;
        }

        self.corpus
            .get_or_init(|| async {
                let started = StartedGuard::arm(&self.started);
                let corpus = self.ingest(manifest, cancel).await;
                started.disarm();
                corpus
            })
            .await;
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let Some(corpus) = self.corpus.get() else {
            warn!(query, "search before document index is ready");
            return Vec::new();
        };

        rank(&corpus.documents, query, &self.options)
    }

    pub fn state(&self) -> IndexState {
        if self.corpus.initialized() {
            IndexState::Ready
        } else if self.started.load(Ordering::Acquire) {
            IndexState::Initializing
        } else {
            IndexState::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.corpus.initialized()
    }

    /// Ingested records in manifest order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentRecord> + '_ {
        self.corpus
            .get()
            .into_iter()
            .flat_map(|corpus| corpus.documents.iter().map(|document| &document.record))
    }

    pub fn skipped(&self) -> &[SkippedDocument] {
        self.corpus
            .get()
            .map(|corpus| corpus.skipped.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.corpus
            .get()
            .map_or(0, |corpus| corpus.documents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn ingest(&self, manifest: &[DocumentDescriptor], cancel: &CancellationToken) -> Corpus {
        let mut corpus = Corpus::default();
        let mut selected = Vec::new();

        for descriptor in manifest {
            if is_indexable_locator(&descriptor.locator) {
                selected.push(descriptor);
            } else {
                debug!(title = %descriptor.title, locator = %descriptor.locator, "not an indexable document");
                corpus.skipped.push(skipped(
                    descriptor,
                    &IngestError::UnsupportedLocator(descriptor.locator.clone()),
                ));
            }
        }

        if let Some(limit) = self.options.max_documents {
            selected.truncate(limit);
        }

        info!(
            requested = manifest.len(),
            selected = selected.len(),
            max_pages = self.options.max_pages,
            "initializing document index"
        );

        let jobs = selected
            .into_iter()
            .map(|descriptor| async move { (descriptor, self.ingest_one(descriptor).await) })
            .collect::<Vec<_>>();
        let pending = stream::iter(jobs).buffered(self.options.concurrency.max(1));
        tokio::pin!(pending);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(ingested = corpus.documents.len(), "document ingestion cancelled");
                    break;
                }
                next = pending.next() => next,
            };

            let Some((descriptor, outcome)) = next else {
                break;
            };

            match outcome {
                Ok(record) => {
                    debug!(title = %record.title, pages = record.pages, chars = record.content.len(), "indexed document");
                    corpus.documents.push(IndexedDocument::new(record));
                }
                Err(error) => {
                    warn!(title = %descriptor.title, locator = %descriptor.locator, reason = %error, "skipped document");
                    corpus.skipped.push(skipped(descriptor, &error));
                }
            }
        }

        info!(
            ingested = corpus.documents.len(),
            skipped = corpus.skipped.len(),
            "document index ready"
        );
        corpus
    }

    async fn ingest_one(
        &self,
        descriptor: &DocumentDescriptor,
    ) -> Result<DocumentRecord, IngestError> {
        let after = self.options.fetch_timeout;
        let extracted = tokio::time::timeout(
            after,
            self.extractor
                .extract_text(&descriptor.locator, self.options.max_pages),
        )
        .await
        .map_err(|_| IngestError::Timeout {
            locator: descriptor.locator.clone(),
            after,
        })??;

        Ok(DocumentRecord {
            title: descriptor.title.clone(),
            locator: descriptor.locator.clone(),
            category: descriptor.category.clone(),
            checksum: digest_text(&extracted.text),
            content: extracted.text,
            pages: extracted.pages,
            ingested_at: Utc::now(),
        })
    }
}

/// Marks ingestion as started; clears the mark again if the ingesting
/// future is dropped before it finishes.
struct StartedGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> StartedGuard<'a> {
    fn arm(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self { flag }
    }

    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl Drop for StartedGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn skipped(descriptor: &DocumentDescriptor, error: &IngestError) -> SkippedDocument {
    SkippedDocument {
        title: descriptor.title.clone(),
        locator: descriptor.locator.clone(),
        reason: error.to_string(),
    }
}

pub fn digest_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
