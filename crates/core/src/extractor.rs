use crate::error::IngestError;
use async_trait::async_trait;
use lopdf::Document;
use reqwest::Client;
use std::path::PathBuf;
use url::Url;

/// Raw text pulled from the first pages of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub pages: u32,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>, pages: u32) -> Self {
        Self {
            text: text.into(),
            pages,
        }
    }
}

/// Turns a locator into text. Documents longer than `max_pages` are cut to
/// their first `max_pages` pages; unreadable ones fail.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, locator: &str, max_pages: u32)
        -> Result<ExtractedText, IngestError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocator {
    Remote(Url),
    Local(PathBuf),
}

/// Where document bytes come from. Absolute `http(s)`/`file` URLs are used
/// as-is; anything else is joined onto the base URL, then the root directory.
#[derive(Debug, Clone, Default)]
pub struct DocumentSource {
    client: Client,
    root: Option<PathBuf>,
    base_url: Option<Url>,
}

impl DocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_base_url(mut self, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = Some(base_url);
        self
    }

    pub fn resolve(&self, locator: &str) -> Result<ResolvedLocator, IngestError> {
        match Url::parse(locator) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(ResolvedLocator::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(ResolvedLocator::Local)
                    .map_err(|()| IngestError::UnsupportedLocator(locator.to_string())),
                _ => Err(IngestError::UnsupportedLocator(locator.to_string())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let relative = locator.trim_start_matches('/');
                if let Some(base_url) = &self.base_url {
                    return Ok(ResolvedLocator::Remote(base_url.join(relative)?));
                }

                match &self.root {
                    Some(root) => Ok(ResolvedLocator::Local(root.join(relative))),
                    None => Ok(ResolvedLocator::Local(PathBuf::from(locator))),
                }
            }
            Err(error) => Err(IngestError::Url(error)),
        }
    }

    pub async fn fetch(&self, locator: &str) -> Result<Vec<u8>, IngestError> {
        match self.resolve(locator)? {
            ResolvedLocator::Remote(url) => {
                let response = self.client.get(url).send().await?;
                if !response.status().is_success() {
                    return Err(IngestError::FetchStatus {
                        locator: locator.to_string(),
                        status: response.status().as_u16(),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
            ResolvedLocator::Local(path) => Ok(tokio::fs::read(&path).await?),
        }
    }
}

/// Reads the PDF text layer with `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct LopdfExtractor {
    source: DocumentSource,
}

impl LopdfExtractor {
    pub fn new(source: DocumentSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl TextExtractor for LopdfExtractor {
    async fn extract_text(
        &self,
        locator: &str,
        max_pages: u32,
    ) -> Result<ExtractedText, IngestError> {
        let bytes = self.source.fetch(locator).await?;
        let label = locator.to_string();

        tokio::task::spawn_blocking(move || extract_pdf_text(&bytes, max_pages, &label))
            .await
            .map_err(|error| IngestError::PdfParse(format!("extraction task failed: {error}")))?
    }
}

/// Extracts pages `1..=max_pages` and joins their text with single spaces.
pub fn extract_pdf_text(
    bytes: &[u8],
    max_pages: u32,
    label: &str,
) -> Result<ExtractedText, IngestError> {
    let document =
        Document::load_mem(bytes).map_err(|error| IngestError::PdfParse(format!("{label}: {error}")))?;

    if document.is_encrypted() {
        return Err(IngestError::Encrypted(label.to_string()));
    }

    let page_numbers = document
        .get_pages()
        .into_keys()
        .take(max_pages as usize)
        .collect::<Vec<_>>();

    let mut texts = Vec::with_capacity(page_numbers.len());
    for page_no in &page_numbers {
        let text = document
            .extract_text(&[*page_no])
            .map_err(|error| IngestError::PdfParse(format!("{label} page {page_no}: {error}")))?;

        let text = text.trim();
        if !text.is_empty() {
            texts.push(text.to_string());
        }
    }

    Ok(ExtractedText {
        text: texts.join(" "),
        pages: page_numbers.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentDescriptor, DocumentIndex};
    use lopdf::content::{Content, Operation};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use lopdf::{dictionary, Object, Stream};

    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = document.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = document.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content should encode"),
            ));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).expect("pdf should serialize");
        bytes
    }

    #[test]
    fn extraction_stops_after_max_pages() {
        let bytes = build_pdf(&["Alpha routing", "Bravo switching", "Charlie trunking"]);

        let extracted = extract_pdf_text(&bytes, 2, "three.pdf").expect("pdf should extract");

        assert_eq!(extracted.pages, 2);
        assert!(extracted.text.contains("Alpha"));
        assert!(extracted.text.contains("Bravo"));
        assert!(!extracted.text.contains("Charlie"));
    }

    #[test]
    fn corrupt_bytes_fail_as_parse_error() {
        let result = extract_pdf_text(b"%PDF-1.4\n%broken", 5, "broken.pdf");
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
    }

    #[test]
    fn relative_locators_join_the_base_url() {
        let base = Url::parse("http://localhost:3000/portal").expect("valid url");
        let source = DocumentSource::new().with_base_url(base);

        let resolved = source.resolve("/pdfs/a.pdf").expect("locator should resolve");

        assert_eq!(
            resolved,
            ResolvedLocator::Remote(
                Url::parse("http://localhost:3000/portal/pdfs/a.pdf").expect("valid url")
            )
        );
    }

    #[test]
    fn relative_locators_join_the_root_directory() {
        let source = DocumentSource::new().with_root("/srv/docs");

        let resolved = source.resolve("/pdfs/a.pdf").expect("locator should resolve");

        assert_eq!(
            resolved,
            ResolvedLocator::Local(PathBuf::from("/srv/docs/pdfs/a.pdf"))
        );
    }

    #[test]
    fn unknown_schemes_are_rejected() {
        let result = DocumentSource::new().resolve("ftp://example.com/a.pdf");
        assert!(matches!(result, Err(IngestError::UnsupportedLocator(_))));
    }

    #[tokio::test]
    async fn extractor_reads_local_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("a.pdf"), build_pdf(&["Softswitch routing"]))?;

        let extractor = LopdfExtractor::new(DocumentSource::new().with_root(dir.path()));
        let extracted = extractor.extract_text("a.pdf", 5).await?;

        assert_eq!(extracted.pages, 1);
        assert!(extracted.text.contains("Softswitch"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_files_fail_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let extractor = LopdfExtractor::new(DocumentSource::new().with_root(dir.path()));

        let result = extractor.extract_text("missing.pdf", 5).await;

        assert!(matches!(result, Err(IngestError::Io(_))));
    }

    /// Serves `/docs/a.pdf` and answers 404 for everything else.
    async fn serve_pdf(pdf: Vec<u8>) -> std::io::Result<Url> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let pdf = pdf.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buffer = [0u8; 1024];
                    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                        match stream.read(&mut buffer).await {
                            Ok(0) | Err(_) => return,
                            Ok(read) => request.extend_from_slice(&buffer[..read]),
                        }
                    }

                    let head = String::from_utf8_lossy(&request);
                    let (status, body) = if head.starts_with("GET /docs/a.pdf ") {
                        ("200 OK", pdf)
                    } else {
                        ("404 Not Found", b"not found".to_vec())
                    };
                    let header = format!(
                        "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    if stream.write_all(header.as_bytes()).await.is_ok()
                        && stream.write_all(&body).await.is_ok()
                    {
                        stream.shutdown().await.ok();
                    }
                });
            }
        });

        Url::parse(&format!("http://{address}/"))
            .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidInput, error))
    }

    #[tokio::test]
    async fn remote_fetch_reports_non_success_status() -> Result<(), Box<dyn std::error::Error>> {
        let base = serve_pdf(build_pdf(&["Softswitch routing"])).await?;
        let source = DocumentSource::new().with_base_url(base);

        let result = source.fetch("/docs/missing.pdf").await;

        assert!(matches!(
            result,
            Err(IngestError::FetchStatus { status: 404, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn index_ingests_remote_documents_and_skips_missing_ones(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let base = serve_pdf(build_pdf(&["Softswitch routing configuration"])).await?;
        let extractor = LopdfExtractor::new(DocumentSource::new().with_base_url(base));
        let index = DocumentIndex::new(extractor);

        index
            .initialize(&[
                DocumentDescriptor::new("Doc A", "/docs/a.pdf", "Routing"),
                DocumentDescriptor::new("Doc B", "/docs/b.pdf", "Routing"),
            ])
            .await;

        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped().len(), 1);
        assert_eq!(index.skipped()[0].title, "Doc B");
        assert!(index.skipped()[0]
            .reason
            .contains("fetch of /docs/b.pdf returned 404"));
        let hits = index.search("softswitch");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Doc A");
        Ok(())
    }
}
