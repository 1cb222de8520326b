//! The in-memory cookie collection.
//!
//! A `CookieCollection` is a plain value: operations that change it take
//! `&self` and hand back a new collection, which the owning store swaps in.

use crate::cookies::canonical_cookie::CanonicalCookie;

/// A set of cookies with unique `(name, domain, path)` keys.
///
/// Storage order is insertion order; a replaced cookie keeps its slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieCollection {
    cookies: Vec<CanonicalCookie>,
}

impl CookieCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalCookie> {
        self.cookies.iter()
    }

    pub fn as_slice(&self) -> &[CanonicalCookie] {
        &self.cookies
    }

    /// Return a collection keeping only the cookies matching `keep`, along
    /// with the number of cookies dropped.
    pub fn retained<F>(&self, mut keep: F) -> (Self, usize)
    where
        F: FnMut(&CanonicalCookie) -> bool,
    {
        let cookies: Vec<CanonicalCookie> =
            self.cookies.iter().filter(|&c| keep(c)).cloned().collect();
        let removed = self.cookies.len() - cookies.len();
        (Self { cookies }, removed)
    }

    pub(crate) fn upsert(&mut self, cookie: CanonicalCookie) {
        match self.cookies.iter_mut().find(|c| c.same_key(&cookie)) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }
}

impl FromIterator<CanonicalCookie> for CookieCollection {
    /// Later cookies replace earlier ones sharing a key.
    fn from_iter<I: IntoIterator<Item = CanonicalCookie>>(iter: I) -> Self {
        let mut collection = CookieCollection::new();
        for cookie in iter {
            collection.upsert(cookie);
        }
        collection
    }
}

impl IntoIterator for CookieCollection {
    type Item = CanonicalCookie;
    type IntoIter = std::vec::IntoIter<CanonicalCookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.cookies.into_iter()
    }
}

impl<'a> IntoIterator for &'a CookieCollection {
    type Item = &'a CanonicalCookie;
    type IntoIter = std::slice::Iter<'a, CanonicalCookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.cookies.iter()
    }
}
