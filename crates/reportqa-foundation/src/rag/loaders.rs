//! Document parsers
//!
//! [`DocumentParser`] implementations that turn files into ordered,
//! page-tagged structural elements, plus a registry that dispatches on
//! the file extension. A form feed (`\x0c`) in text input starts a new page;
//! PDF pages keep their own numbers.

use regex::Regex;
use reportqa_kernel::error::IngestionError;
use reportqa_kernel::rag::{DocumentParser, ElementTag, StructuralElement};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

const PAGE_BREAK: char = '\x0c';

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("blank line pattern is valid"));

static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}#{1,6}(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").expect("heading pattern is valid")
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:[-*+]|\d{1,9}[.)])[ \t]+(.*)$").expect("list item pattern is valid")
});

fn read_document(path: &Path) -> Result<String, IngestionError> {
    if !path.exists() {
        return Err(IngestionError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| IngestionError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Narrative elements for each blank-line separated block of `text`.
fn narrative_blocks(text: &str, page: u32, elements: &mut Vec<StructuralElement>) {
    for block in BLANK_LINES.split(text) {
        let block = block.trim();
        if !block.is_empty() {
            elements.push(StructuralElement::narrative(block).with_page(page));
        }
    }
}

/// Pages of `content`, numbered from 1.
fn pages(content: &str) -> impl Iterator<Item = (u32, &str)> {
    content
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| (i as u32 + 1, page))
}

fn non_empty(path: &Path, elements: Vec<StructuralElement>) -> Result<Vec<StructuralElement>, IngestionError> {
    if elements.is_empty() {
        return Err(IngestionError::Empty(path.to_path_buf()));
    }
    debug!(path = %path.display(), elements = elements.len(), "Document parsed");
    Ok(elements)
}

// =============================================================================
// TextParser
// =============================================================================

/// Plain text: every blank-line separated block is one narrative element.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(&self, content: &str) -> Vec<StructuralElement> {
        let content = content.replace("\r\n", "\n");
        let mut elements = Vec::new();

        for (page, text) in pages(&content) {
            narrative_blocks(text, page, &mut elements);
        }

        elements
    }
}

impl DocumentParser for TextParser {
    fn name(&self) -> &str {
        "text"
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt", "text"]
    }

    fn parse(&self, path: &Path) -> Result<Vec<StructuralElement>, IngestionError> {
        let content = read_document(path)?;
        non_empty(path, self.parse_str(&content))
    }
}

// =============================================================================
// MarkdownParser
// =============================================================================

/// Markdown: ATX headings become titles, pipe tables become tables, list
/// items and paragraphs become list and narrative elements. Fenced code
/// blocks are kept as uncategorized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

#[derive(Default)]
struct MarkdownBlocks {
    elements: Vec<StructuralElement>,
    paragraph: Vec<String>,
    table: Vec<String>,
    /// Open fence: the page it started on and its lines so far
    code: Option<(u32, Vec<String>)>,
}

impl MarkdownBlocks {
    fn push(&mut self, tag: ElementTag, text: String, page: u32) {
        if !text.trim().is_empty() {
            self.elements
                .push(StructuralElement::new(tag, text.trim()).with_page(page));
        }
    }

    fn flush_paragraph(&mut self, page: u32) {
        if !self.paragraph.is_empty() {
            let text = std::mem::take(&mut self.paragraph).join("\n");
            self.push(ElementTag::NarrativeText, text, page);
        }
    }

    fn flush_table(&mut self, page: u32) {
        if !self.table.is_empty() {
            let text = std::mem::take(&mut self.table).join("\n");
            self.push(ElementTag::Table, text, page);
        }
    }

    fn flush(&mut self, page: u32) {
        self.flush_paragraph(page);
        self.flush_table(page);
    }

    /// Emit the open code block, tagged with the page its fence opened on.
    fn close_code(&mut self) {
        if let Some((page, lines)) = self.code.take() {
            self.push(ElementTag::UncategorizedText, lines.join("\n"), page);
        }
    }
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(&self, content: &str) -> Vec<StructuralElement> {
        let content = content.replace("\r\n", "\n");
        let mut blocks = MarkdownBlocks::default();

        for (page, text) in pages(&content) {
            for line in text.lines() {
                let trimmed = line.trim();

                if let Some((_, code)) = blocks.code.as_mut() {
                    if trimmed.starts_with("```") {
                        blocks.close_code();
                    } else {
                        code.push(line.to_string());
                    }
                    continue;
                }

                if trimmed.starts_with("```") {
                    blocks.flush(page);
                    blocks.code = Some((page, Vec::new()));
                    continue;
                }

                if trimmed.starts_with('|') {
                    blocks.flush_paragraph(page);
                    blocks.table.push(trimmed.to_string());
                    continue;
                }
                blocks.flush_table(page);

                if trimmed.is_empty() {
                    blocks.flush_paragraph(page);
                } else if let Some(caps) = ATX_HEADING.captures(line) {
                    blocks.flush_paragraph(page);
                    let heading = caps.get(1).map_or("", |m| m.as_str()).to_string();
                    blocks.push(ElementTag::Title, heading, page);
                } else if let Some(caps) = LIST_ITEM.captures(line) {
                    blocks.flush_paragraph(page);
                    blocks.push(ElementTag::ListItem, caps[1].to_string(), page);
                } else {
                    blocks.paragraph.push(trimmed.to_string());
                }
            }
            // Paragraphs and tables end at a page break; an open fence carries on.
            blocks.flush(page);
        }
        blocks.close_code();

        blocks.elements
    }
}

impl DocumentParser for MarkdownParser {
    fn name(&self) -> &str {
        "markdown"
    }

    fn extensions(&self) -> &[&'static str] {
        &["md", "markdown"]
    }

    fn parse(&self, path: &Path) -> Result<Vec<StructuralElement>, IngestionError> {
        let content = read_document(path)?;
        non_empty(path, self.parse_str(&content))
    }
}

// =============================================================================
// PdfParser
// =============================================================================

/// PDF: each page's extracted text is split into narrative blocks tagged
/// with that page's number.
///
/// Text comes from `pdf-extract`, which handles font encodings well but can
/// fail or panic on unusual files; `lopdf` is the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    /// Elements for already extracted page texts, the first being page 1.
    pub fn elements_from_pages<S: AsRef<str>>(&self, pages: &[S]) -> Vec<StructuralElement> {
        let mut elements = Vec::new();
        for (i, text) in pages.iter().enumerate() {
            let text = text.as_ref().replace("\r\n", "\n");
            narrative_blocks(&text, i as u32 + 1, &mut elements);
        }
        elements
    }

    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, IngestionError> {
        let primary = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)));
        let reason = match primary {
            Ok(Ok(pages)) => return Ok(pages),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(&*payload),
        };
        warn!(path = %path.display(), reason = %reason, "pdf-extract failed, falling back to lopdf");
        extract_pages_with_lopdf(path)
    }
}

fn extract_pages_with_lopdf(path: &Path) -> Result<Vec<String>, IngestionError> {
    let parse_error = |reason: String| IngestionError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let doc = lopdf::Document::load(path).map_err(|e| parse_error(e.to_string()))?;
    doc.get_pages()
        .keys()
        .map(|&number| doc.extract_text(&[number]).map_err(|e| parse_error(e.to_string())))
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl DocumentParser for PdfParser {
    fn name(&self) -> &str {
        "pdf"
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn parse(&self, path: &Path) -> Result<Vec<StructuralElement>, IngestionError> {
        if !path.exists() {
            return Err(IngestionError::NotFound(path.to_path_buf()));
        }
        let pages = self.extract_pages(path)?;
        debug!(path = %path.display(), pages = pages.len(), "PDF text extracted");
        non_empty(path, self.elements_from_pages(&pages))
    }
}

// =============================================================================
// ParserRegistry
// =============================================================================

/// Chooses a parser by (lowercased) file extension.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the text, markdown and PDF parsers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextParser::new()));
        registry.register(Arc::new(MarkdownParser::new()));
        registry.register(Arc::new(PdfParser::new()));
        registry
    }

    /// Register `parser` for each of its extensions, replacing earlier ones.
    pub fn register(&mut self, parser: Arc<dyn DocumentParser>) {
        for ext in parser.extensions() {
            self.parsers.insert(ext.to_lowercase(), Arc::clone(&parser));
        }
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn parser_for(&self, path: &Path) -> Result<Arc<dyn DocumentParser>, IngestionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.parsers
            .get(&ext)
            .cloned()
            .ok_or_else(|| IngestionError::UnsupportedFormat(format!(".{ext}")))
    }

    /// Parse `path` with the matching parser. Missing files are reported
    /// before unsupported extensions.
    pub fn parse(&self, path: &Path) -> Result<Vec<StructuralElement>, IngestionError> {
        if !path.exists() {
            return Err(IngestionError::NotFound(path.to_path_buf()));
        }
        let parser = self.parser_for(path)?;
        debug!(path = %path.display(), parser = parser.name(), "Parsing document");
        parser.parse(path)
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}
