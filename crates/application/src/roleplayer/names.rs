/// Flattened list of role names built from arbitrarily nested input.
///
/// ```
/// use roleplayer_application::RoleNames;
///
/// let names = RoleNames::new()
///     .with("admin")
///     .with_all([vec!["editor", "vip"], vec!["invited"]].into_iter().flatten());
/// assert_eq!(names.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleNames(Vec<String>);

impl RoleNames {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single name.
    #[must_use]
    pub fn with(mut self, name: impl AsRef<str>) -> Self {
        self.0.push(name.as_ref().to_owned());
        self
    }

    /// Appends every name from an iterator.
    #[must_use]
    pub fn with_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0
            .extend(names.into_iter().map(|name| name.as_ref().to_owned()));
        self
    }

    /// Returns the number of collected names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no names were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleNames {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new().with_all(iter)
    }
}

impl IntoIterator for RoleNames {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RoleNames {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
