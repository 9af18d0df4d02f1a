use ahash::AHashSet;

/// Canonical country names, in source order.
///
/// Matching is exact string equality on `Record::country`; no case folding and no
/// trimming, so `"Germany "` does not match `"Germany"`.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    names: Vec<String>,
    lookup: AHashSet<String>,
}

impl Whitelist {
    /// Parse a newline- or comma-separated list. Line endings are stripped and empty
    /// entries skipped; duplicates keep their first position.
    pub fn parse(text: &str) -> Self {
        text.split(['\n', ','])
            .map(|s| s.strip_suffix('\r').unwrap_or(s))
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn contains(&self, country: &str) -> bool {
        self.lookup.contains(country)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Whitelist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut out = Whitelist::default();
        for name in iter {
            let name = name.into();
            if out.lookup.insert(name.clone()) {
                out.names.push(name);
            }
        }
        out
    }
}
