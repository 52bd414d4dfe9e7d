//! A route through the link graph, built up by forking and extending.

/// An ordered chain of page titles from an origin to wherever the chain
/// currently ends.
///
/// `Path` is plain-copy-on-fork: every time the crawler follows a link it
/// clones the path up to that point and appends the new title, rather than
/// mutating a shared structure. With many frontier nodes racing in parallel
/// this trades a little allocation for never having to reason about a path
/// another task is still reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(Vec<String>);

impl Path {
    /// A path consisting only of `origin`.
    pub fn new(origin: impl Into<String>) -> Self {
        Path(vec![origin.into()])
    }

    /// The title this path currently ends at.
    pub fn last(&self) -> &str {
        // a `Path` is never empty: `new` seeds it with one title, and
        // `fork_extend` only ever appends.
        self.0.last().expect("path is never empty").as_str()
    }

    /// Clone this path and append `title` to the end.
    pub fn fork_extend(&self, title: impl Into<String>) -> Path {
        let mut extended = self.0.clone();
        extended.push(title.into());
        Path(extended)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

#[cfg(test)]
mod test {
    use super::Path;

    #[test]
    fn test_new_is_single_element() {
        let p = Path::new("Mike Tyson");
        assert_eq!(p.as_slice(), &["Mike Tyson".to_string()]);
        assert_eq!(p.last(), "Mike Tyson");
    }

    #[test]
    fn test_fork_extend_does_not_mutate_original() {
        let origin = Path::new("Mike Tyson");
        let extended = origin.fork_extend("Alexander the Great");

        assert_eq!(origin.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.last(), "Alexander the Great");
        assert_eq!(extended.as_slice(), &["Mike Tyson".to_string(), "Alexander the Great".to_string()]);
    }

    #[test]
    fn test_display_joins_with_arrows() {
        let p = Path::new("A").fork_extend("B").fork_extend("C");
        assert_eq!(p.to_string(), "A -> B -> C");
    }
}
