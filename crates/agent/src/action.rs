/// Queries that never need the document index.
const TRIVIAL_QUERIES: &[&str] = &["hello", "hi", "how are you", "who are you"];

/// First matching keyword wins.
const RULES: &[(&str, Action)] = &[
    ("summarize", Action::Summarize),
    ("calculate", Action::Calculate),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Summarize,
    Calculate,
    Retrieve,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Summarize => "summarize",
            Action::Calculate => "calculate",
            Action::Retrieve => "retrieve",
        }
    }
}

/// False only for exact small talk, compared case-insensitively.
pub fn should_call_external_search(query: &str) -> bool {
    let lowered = query.to_lowercase();
    !TRIVIAL_QUERIES.contains(&lowered.as_str())
}

pub fn decide_action(query: &str) -> Action {
    let lowered = query.to_lowercase();
    RULES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, action)| *action)
        .unwrap_or(Action::Retrieve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_queries_in_any_case() {
        for q in ["hello", "Hello", "HI", "How Are You", "who are you"] {
            assert!(!should_call_external_search(q), "{q:?} is trivial");
        }
    }

    #[test]
    fn non_exact_matches_still_search() {
        for q in ["hello there", " hi", "hi!", "what is this pdf about?", ""] {
            assert!(should_call_external_search(q), "{q:?} needs search");
        }
    }

    #[test]
    fn summarize_beats_calculate() {
        assert_eq!(decide_action("Summarize and calculate 2+2"), Action::Summarize);
        assert_eq!(decide_action("calculate then summarize"), Action::Summarize);
    }

    #[test]
    fn calculate_and_fallback() {
        assert_eq!(decide_action("Please CALCULATE 3*4"), Action::Calculate);
        assert_eq!(decide_action("What does chapter 2 say?"), Action::Retrieve);
    }
}
