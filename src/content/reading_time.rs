use std::fmt;
use std::sync::Arc;

use super::observer::{observe, Observation};
use super::source::ContentSource;

pub const DEFAULT_WORDS_PER_MINUTE: usize = 225;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingTime {
    pub words: usize,
    pub minutes: usize,
}

impl ReadingTime {
    /// Estimate from text, rounding partial minutes up. A zero rate falls
    /// back to [`DEFAULT_WORDS_PER_MINUTE`].
    pub fn from_text(text: &str, words_per_minute: usize) -> Self {
        let wpm = if words_per_minute == 0 {
            DEFAULT_WORDS_PER_MINUTE
        } else {
            words_per_minute
        };
        let words = text.split_whitespace().count();

        Self {
            words,
            minutes: words.div_ceil(wpm),
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min read", self.minutes)
    }
}

/// Keep a reading time estimate in sync with `source`
pub fn observe_reading_time<S>(source: Arc<S>, words_per_minute: usize) -> Observation<ReadingTime>
where
    S: ContentSource + ?Sized,
{
    observe(source, move |content: &S| {
        ReadingTime::from_text(&content.text(), words_per_minute)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::source::ArticleContent;
    use std::time::Duration;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_450_words_is_two_minutes() {
        let reading_time = ReadingTime::from_text(&words(450), 225);
        assert_eq!(reading_time.words, 450);
        assert_eq!(reading_time.label(), "2 min read");
    }

    #[test]
    fn test_empty_text_is_zero_minutes() {
        assert_eq!(ReadingTime::from_text("", 225).label(), "0 min read");
        assert_eq!(ReadingTime::from_text("  \n\t ", 225).label(), "0 min read");
    }

    #[test]
    fn test_partial_minute_rounds_up() {
        assert_eq!(ReadingTime::from_text(&words(1), 225).minutes, 1);
        assert_eq!(ReadingTime::from_text(&words(451), 225).minutes, 3);
    }

    #[test]
    fn test_zero_rate_uses_default() {
        assert_eq!(ReadingTime::from_text(&words(450), 0).minutes, 2);
    }

    #[tokio::test]
    async fn test_observed_reading_time_follows_content() {
        let source = Arc::new(ArticleContent::new());
        let mut observation = observe_reading_time(source.clone(), DEFAULT_WORDS_PER_MINUTE);
        assert_eq!(observation.current().label(), "0 min read");

        source.push_paragraph(words(450));
        tokio::time::timeout(Duration::from_secs(1), observation.changed())
            .await
            .unwrap();
        assert_eq!(observation.current().label(), "2 min read");
    }
}
