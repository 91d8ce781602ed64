/// Substrings that block a chat message when present in any letter case.
pub const DEFAULT_DENYLIST: &[&str] = &["spam", "scam", "abuse", "idiot", "stupid"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Allowed,
    Blocked { matched: String },
}

#[derive(Debug, Clone)]
pub struct Denylist {
    // Stored lowercased.
    words: Vec<String>,
}

impl Denylist {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive substring scan. The first denylisted word found wins.
    pub fn check(&self, message: &str) -> FilterVerdict {
        let lowered = message.to_lowercase();
        match self.words.iter().find(|w| lowered.contains(w.as_str())) {
            Some(word) => FilterVerdict::Blocked {
                matched: word.clone(),
            },
            None => FilterVerdict::Allowed,
        }
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST)
    }
}

/// Room shared by two users: both ids sorted and joined with `_`, so either
/// side computes the same key.
pub fn room_id(user_a: &str, user_b: &str) -> String {
    if user_a <= user_b {
        format!("{user_a}_{user_b}")
    } else {
        format!("{user_b}_{user_a}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_message_allowed() {
        assert_eq!(
            Denylist::default().check("Congrats on the offer!"),
            FilterVerdict::Allowed
        );
    }

    #[test]
    fn test_blocks_ignoring_case() {
        assert_eq!(
            Denylist::default().check("This is a SCAM link"),
            FilterVerdict::Blocked {
                matched: "scam".to_string()
            }
        );
    }

    #[test]
    fn test_blocks_substring_inside_word() {
        assert!(matches!(
            Denylist::default().check("stop spamming"),
            FilterVerdict::Blocked { .. }
        ));
    }

    #[test]
    fn test_custom_list_normalized() {
        let list = Denylist::new(["  Foo ", ""]);
        assert!(matches!(list.check("FOOBAR"), FilterVerdict::Blocked { .. }));
        assert_eq!(list.check("bar"), FilterVerdict::Allowed);
    }

    #[test]
    fn test_empty_list_allows_everything() {
        let list = Denylist::new(Vec::<String>::new());
        assert_eq!(list.check("scam"), FilterVerdict::Allowed);
    }

    #[test]
    fn test_room_id_is_order_independent() {
        assert_eq!(room_id("bob", "alice"), "alice_bob");
        assert_eq!(room_id("alice", "bob"), "alice_bob");
        assert_eq!(room_id("same", "same"), "same_same");
    }
}
