use std::sync::RwLock;
use tokio::sync::watch;

/// A heading element in the article body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: Option<String>,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    Heading(Heading),
}

impl Block {
    fn text(&self) -> &str {
        match self {
            Block::Paragraph(text) => text,
            Block::Heading(heading) => &heading.text,
        }
    }
}

/// Observable article body.
pub trait ContentSource: Send + Sync + 'static {
    /// Plain text of the whole body
    fn text(&self) -> String;

    /// Headings in document order
    fn headings(&self) -> Vec<Heading>;

    /// Set the anchor id of the heading at `index` (document order) if it
    /// has none. Returns whether the id was written. Attribute changes are
    /// not reported as mutations.
    fn set_heading_id(&self, index: usize, id: &str) -> bool;

    /// Give every heading without an id the one produced by `make_id`, in a
    /// single step, and return the headings as they stand afterwards.
    /// `make_id` returning `None` leaves the heading without an id.
    fn assign_missing_heading_ids(&self, make_id: &dyn Fn(&str) -> Option<String>) -> Vec<Heading>;

    /// Receiver that changes whenever the body's structure or text changes
    fn mutations(&self) -> watch::Receiver<u64>;
}

/// In-memory article body
pub struct ArticleContent {
    blocks: RwLock<Vec<Block>>,
    revision: watch::Sender<u64>,
}

impl Default for ArticleContent {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleContent {
    pub fn new() -> Self {
        Self::with_blocks(Vec::new())
    }

    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            blocks: RwLock::new(blocks),
            revision,
        }
    }

    pub fn push_paragraph(&self, text: impl Into<String>) {
        self.mutate(|blocks| blocks.push(Block::Paragraph(text.into())));
    }

    pub fn push_heading(&self, heading: Heading) {
        self.mutate(|blocks| blocks.push(Block::Heading(heading)));
    }

    /// Swap out the whole body
    pub fn replace(&self, new_blocks: Vec<Block>) {
        self.mutate(|blocks| *blocks = new_blocks);
    }

    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.blocks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn mutate(&self, f: impl FnOnce(&mut Vec<Block>)) {
        {
            let mut blocks = self.blocks.write().unwrap_or_else(|e| e.into_inner());
            f(&mut blocks);
        }
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl ContentSource for ArticleContent {
    fn text(&self) -> String {
        let blocks = self.blocks.read().unwrap_or_else(|e| e.into_inner());
        blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn headings(&self) -> Vec<Heading> {
        let blocks = self.blocks.read().unwrap_or_else(|e| e.into_inner());
        blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading(heading) => Some(heading.clone()),
                Block::Paragraph(_) => None,
            })
            .collect()
    }

    fn set_heading_id(&self, index: usize, id: &str) -> bool {
        let mut blocks = self.blocks.write().unwrap_or_else(|e| e.into_inner());
        let heading = blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Heading(heading) => Some(heading),
                Block::Paragraph(_) => None,
            })
            .nth(index);

        match heading {
            Some(heading) if heading.id.is_none() => {
                heading.id = Some(id.to_string());
                true
            }
            _ => false,
        }
    }

    fn assign_missing_heading_ids(&self, make_id: &dyn Fn(&str) -> Option<String>) -> Vec<Heading> {
        let mut blocks = self.blocks.write().unwrap_or_else(|e| e.into_inner());
        blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Heading(heading) => {
                    if heading.id.is_none() {
                        heading.id = make_id(&heading.text);
                    }
                    Some(heading.clone())
                }
                Block::Paragraph(_) => None,
            })
            .collect()
    }

    fn mutations(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
