//! Bullet-level impact check: does a resume bullet state a measurable outcome?

const VAGUE_VERBS: &[&str] = &[
    "improved",
    "enhanced",
    "helped",
    "worked on",
    "assisted",
    "supported",
    "participated",
    "involved",
];

const VAGUE_SCALE_WORDS: &[&str] = &[
    "significant",
    "major",
    "large",
    "huge",
    "massive",
    "substantial",
    "considerable",
    "many",
    "numerous",
    "various",
    "several",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletReview {
    pub quantified: bool,
    /// Set when the bullet is unquantified and leans on vague wording.
    pub vague_term: Option<&'static str>,
}

/// A bullet counts as quantified when it carries a number, a percentage or
/// a currency amount.
pub fn is_quantified(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        || text.contains('%')
        || text.contains('$')
        || text.contains('€')
        || text.contains('£')
        || text.contains('₹')
}

pub fn review_bullet(text: &str) -> BulletReview {
    if is_quantified(text) {
        return BulletReview {
            quantified: true,
            vague_term: None,
        };
    }

    let lowered = text.to_lowercase();
    let vague_term = VAGUE_VERBS
        .iter()
        .chain(VAGUE_SCALE_WORDS)
        .find(|w| lowered.contains(*w))
        .copied();

    BulletReview {
        quantified: false,
        vague_term,
    }
}

/// Lines that look like list items in a plain-text resume.
pub fn bullets(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter_map(|line| {
        let line = line.trim_start();
        ['-', '*', '•', '–', '▪']
            .iter()
            .find_map(|marker| line.strip_prefix(*marker))
            .map(str::trim)
            .filter(|rest| !rest.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_count_as_quantified() {
        assert!(review_bullet("Cut p99 latency by 40%").quantified);
        assert!(review_bullet("Saved ₹12L in infra spend").quantified);
        assert!(review_bullet("Mentored 3 interns").quantified);
    }

    #[test]
    fn test_vague_verb_is_reported() {
        let review = review_bullet("Helped the team ship features");
        assert!(!review.quantified);
        assert_eq!(review.vague_term, Some("helped"));
    }

    #[test]
    fn test_vague_scale_word_is_reported() {
        let review = review_bullet("Owned a massive migration");
        assert_eq!(review.vague_term, Some("massive"));
    }

    #[test]
    fn test_plain_unquantified_bullet() {
        let review = review_bullet("Wrote the billing service");
        assert!(!review.quantified);
        assert!(review.vague_term.is_none());
    }

    #[test]
    fn test_bullet_markers() {
        let text = "EXPERIENCE\n- Built X\n  • Ran Y\n* \nplain line";
        let found: Vec<_> = bullets(text).collect();
        assert_eq!(found, vec!["Built X", "Ran Y"]);
    }
}
