//! Atomic "have we already queued this title" bookkeeping shared across the
//! crawler's concurrent frontier expansion tasks.

use std::collections::HashSet;

use tokio::sync::Mutex;

/// Records which page titles have already been queued for expansion, so two
/// frontier nodes that both link to the same page don't both re-queue it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        VisitedSet { seen: Mutex::new(HashSet::new()) }
    }

    /// Atomically checks whether `title` has been visited and, if not, marks
    /// it visited. Returns `true` only to the caller that wins the race.
    pub async fn try_visit(&self, title: &str) -> bool {
        let mut seen = self.seen.lock().await;
        seen.insert(title.to_string())
    }

    /// Whether `title` has already been queued for expansion.
    pub async fn contains(&self, title: &str) -> bool {
        self.seen.lock().await.contains(title)
    }
}

#[cfg(test)]
mod test {
    use super::VisitedSet;

    #[tokio::test]
    async fn test_try_visit_first_caller_wins() {
        let visited = VisitedSet::new();
        assert!(visited.try_visit("Mike Tyson").await);
        assert!(!visited.try_visit("Mike Tyson").await);
    }

    #[tokio::test]
    async fn test_try_visit_distinct_titles_independent() {
        let visited = VisitedSet::new();
        assert!(visited.try_visit("Mike Tyson").await);
        assert!(visited.try_visit("Alexander the Great").await);
    }

    #[tokio::test]
    async fn test_contains_reflects_prior_visits() {
        let visited = VisitedSet::new();
        assert!(!visited.contains("Mike Tyson").await);
        visited.try_visit("Mike Tyson").await;
        assert!(visited.contains("Mike Tyson").await);
    }
}
