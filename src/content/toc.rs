use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::observer::{observe, Observation};
use super::source::ContentSource;
use crate::html::escape_html;

// ASCII word characters only; accented letters are dropped
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\s-]").expect("valid slug regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("valid separator regex"));

/// Turn heading text into an anchor id.
///
/// `"Hello, World! 2.0"` becomes `"hello-world-20"`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = SEPARATORS.replace_all(&stripped, "-");
    hyphenated.trim_matches('-').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOfContents {
    pub entries: Vec<TocEntry>,
}

/// Give every heading without an id a generated one and collect the
/// linkable headings. Existing ids are left alone.
pub fn assign_heading_ids<S>(source: &S) -> TableOfContents
where
    S: ContentSource + ?Sized,
{
    let headings = source.assign_missing_heading_ids(&|text: &str| {
        let slug = slugify(text);
        (!slug.is_empty()).then_some(slug)
    });

    let entries = headings
        .into_iter()
        .filter_map(|heading| {
            heading.id.map(|id| TocEntry {
                level: heading.level,
                text: heading.text,
                id,
            })
        })
        .collect();

    TableOfContents { entries }
}

/// Keep a table of contents in sync with `source`, assigning ids to new
/// headings as they appear
pub fn observe_toc<S>(source: Arc<S>) -> Observation<TableOfContents>
where
    S: ContentSource + ?Sized,
{
    observe(source, |content: &S| assign_heading_ids(content))
}

impl TableOfContents {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as nested `<ul>` lists, one level of nesting per deeper
    /// heading level
    pub fn to_html(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let mut html = String::new();
        // levels of the currently open lists, outermost first
        let mut open: Vec<u8> = Vec::new();

        for entry in &self.entries {
            match open.last().copied() {
                None => {
                    html.push_str("<ul>");
                    open.push(entry.level);
                }
                Some(top) if entry.level > top => {
                    html.push_str("<ul>");
                    open.push(entry.level);
                }
                Some(_) => {
                    html.push_str("</li>");
                    while open.len() > 1 && entry.level <= open[open.len() - 2] {
                        html.push_str("</ul></li>");
                        open.pop();
                    }
                    if let Some(top) = open.last_mut() {
                        *top = entry.level;
                    }
                }
            }

            html.push_str(&format!(
                "<li><a href=\"#{}\">{}</a>",
                escape_html(&entry.id),
                escape_html(&entry.text)
            ));
        }

        html.push_str("</li>");
        for _ in 1..open.len() {
            html.push_str("</ul></li>");
        }
        html.push_str("</ul>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::source::{ArticleContent, Block, Heading};
    use std::time::Duration;
    use tokio::sync::watch;

    /// Body that is swapped for another one right before ids are assigned
    struct ReplacedBeforeAssign {
        inner: ArticleContent,
        replacement: Vec<Block>,
    }

    impl ContentSource for ReplacedBeforeAssign {
        fn text(&self) -> String {
            self.inner.text()
        }

        fn headings(&self) -> Vec<Heading> {
            self.inner.headings()
        }

        fn set_heading_id(&self, index: usize, id: &str) -> bool {
            self.inner.set_heading_id(index, id)
        }

        fn assign_missing_heading_ids(
            &self,
            make_id: &dyn Fn(&str) -> Option<String>,
        ) -> Vec<Heading> {
            self.inner.replace(self.replacement.clone());
            self.inner.assign_missing_heading_ids(make_id)
        }

        fn mutations(&self) -> watch::Receiver<u64> {
            self.inner.mutations()
        }
    }

    fn entry(level: u8, text: &str, id: &str) -> TocEntry {
        TocEntry {
            level,
            text: text.to_string(),
            id: id.to_string(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World! 2.0"), "hello-world-20");
        assert_eq!(slugify("  CSS   Grid -- Basics  "), "css-grid-basics");
        assert_eq!(slugify("--Edge--"), "edge");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_drops_non_ascii_letters() {
        assert_eq!(slugify("Café Menu"), "caf-menu");
        assert_eq!(slugify("Über alles"), "ber-alles");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn test_assign_ids_only_when_missing() {
        let content = ArticleContent::with_blocks(vec![
            Block::Heading(Heading::new(2, "Getting Started")),
            Block::Paragraph("text".to_string()),
            Block::Heading(Heading::new(2, "Custom").with_id("my-anchor")),
            Block::Heading(Heading::new(3, "???")),
        ]);

        let toc = assign_heading_ids(&content);
        assert_eq!(
            toc.entries,
            vec![
                entry(2, "Getting Started", "getting-started"),
                entry(2, "Custom", "my-anchor"),
            ]
        );

        let headings = content.headings();
        assert_eq!(headings[0].id.as_deref(), Some("getting-started"));
        assert_eq!(headings[1].id.as_deref(), Some("my-anchor"));
        assert_eq!(headings[2].id, None);
    }

    #[test]
    fn test_assign_is_stable_across_runs() {
        let content = ArticleContent::with_blocks(vec![Block::Heading(Heading::new(2, "Intro"))]);
        let first = assign_heading_ids(&content);
        let second = assign_heading_ids(&content);
        assert_eq!(first, second);
    }

    #[test]
    fn test_assign_keeps_author_id_when_body_changes() {
        let source = ReplacedBeforeAssign {
            inner: ArticleContent::with_blocks(vec![Block::Heading(Heading::new(2, "Intro"))]),
            replacement: vec![Block::Heading(
                Heading::new(2, "Other").with_id("author-anchor"),
            )],
        };

        let toc = assign_heading_ids(&source);

        assert_eq!(toc.entries, vec![entry(2, "Other", "author-anchor")]);
        assert_eq!(
            source.headings()[0].id.as_deref(),
            Some("author-anchor")
        );
    }

    #[test]
    fn test_to_html_nesting() {
        let toc = TableOfContents {
            entries: vec![
                entry(2, "A", "a"),
                entry(3, "B", "b"),
                entry(2, "C", "c"),
            ],
        };
        assert_eq!(
            toc.to_html(),
            "<ul><li><a href=\"#a\">A</a><ul><li><a href=\"#b\">B</a></li></ul></li>\
             <li><a href=\"#c\">C</a></li></ul>"
        );
    }

    #[test]
    fn test_to_html_skipped_level() {
        let toc = TableOfContents {
            entries: vec![
                entry(2, "A", "a"),
                entry(4, "B", "b"),
                entry(3, "C", "c"),
            ],
        };
        assert_eq!(
            toc.to_html(),
            "<ul><li><a href=\"#a\">A</a><ul><li><a href=\"#b\">B</a></li>\
             <li><a href=\"#c\">C</a></li></ul></li></ul>"
        );
    }

    #[test]
    fn test_to_html_escapes_text() {
        let toc = TableOfContents {
            entries: vec![entry(2, "<T> & \"U\"", "t-u")],
        };
        assert_eq!(
            toc.to_html(),
            "<ul><li><a href=\"#t-u\">&lt;T&gt; &amp; &quot;U&quot;</a></li></ul>"
        );
        assert_eq!(TableOfContents::default().to_html(), "");
    }

    #[tokio::test]
    async fn test_observed_toc_picks_up_new_headings() {
        let source = Arc::new(ArticleContent::new());
        let mut observation = observe_toc(source.clone());
        assert!(observation.current().is_empty());

        source.push_heading(Heading::new(2, "Hello, World! 2.0"));
        tokio::time::timeout(Duration::from_secs(1), observation.changed())
            .await
            .unwrap();

        assert_eq!(
            observation.current().entries,
            vec![entry(2, "Hello, World! 2.0", "hello-world-20")]
        );
        assert_eq!(source.headings()[0].id.as_deref(), Some("hello-world-20"));
    }
}
