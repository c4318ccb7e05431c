//! Output-side transformations applied to stored rich text.

use std::sync::Arc;

/// A display transformation over stored content.
pub trait ContentFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, content: &str) -> String;
}

/// Ordered chain of content filters; each receives the previous output.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn ContentFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain used for book content.
    pub fn standard() -> Self {
        Self::new().with(Autop)
    }

    pub fn with(mut self, filter: impl ContentFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    pub fn render(&self, raw: &str) -> String {
        self.filters
            .iter()
            .fold(raw.to_string(), |content, filter| filter.render(&content))
    }
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "ol", "p", "pre", "section",
    "table", "ul",
];

fn starts_with_block(chunk: &str) -> bool {
    let Some(rest) = chunk.strip_prefix('<') else {
        return false;
    };
    let name: String = rest
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

/// Turns blank-line separated text into paragraphs and single newlines
/// into line breaks. Chunks that already open with a block element pass
/// through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autop;

impl ContentFilter for Autop {
    fn name(&self) -> &'static str {
        "autop"
    }

    fn render(&self, content: &str) -> String {
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

        let mut blocks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in normalized.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    blocks.push(current.join("\n"));
                    current.clear();
                }
            } else {
                current.push(line.trim_end());
            }
        }
        if !current.is_empty() {
            blocks.push(current.join("\n"));
        }

        blocks
            .into_iter()
            .map(|block| {
                let block = block.trim();
                if starts_with_block(block) {
                    format!("{block}\n")
                } else {
                    format!("<p>{}</p>\n", block.replace('\n', "<br />\n"))
                }
            })
            .collect()
    }
}
