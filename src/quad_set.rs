//! Sets of quadruples as they appear in `[...]` pattern sets.
//!
//! Elements are kept sorted and disjoint: every insertion merges the new
//! element with whatever it overlaps or touches, so a set never holds two
//! elements that could be written as one. Negated sets are stored as given
//! and complemented when the expression is generated.

use crate::quad::Quad;
use crate::quad_interval::QuadInterval;

/// One member of a [`QuadSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Quad(Quad),
    Interval(QuadInterval),
}

impl Element {
    /// A single quadruple for a zero-width interval, an interval otherwise.
    fn from_interval(iv: QuadInterval) -> Element {
        if iv.width() == 0 {
            Element::Quad(iv.lower())
        } else {
            Element::Interval(iv)
        }
    }

    #[inline]
    pub fn lower(&self) -> Quad {
        match self {
            Element::Quad(q) => *q,
            Element::Interval(iv) => iv.lower(),
        }
    }

    #[inline]
    pub fn upper(&self) -> Quad {
        match self {
            Element::Quad(q) => *q,
            Element::Interval(iv) => iv.upper(),
        }
    }

    pub fn contains(&self, q: Quad) -> bool {
        match self {
            Element::Quad(own) => *own == q,
            Element::Interval(iv) => iv.contains(q),
        }
    }

    fn to_interval(self) -> QuadInterval {
        match self {
            Element::Quad(q) => QuadInterval::single(q),
            Element::Interval(iv) => iv,
        }
    }

    pub fn generate_posix(&self) -> String {
        match self {
            Element::Quad(q) => q.hexrepr(),
            Element::Interval(iv) => iv.generate_posix(),
        }
    }
}

impl From<Quad> for Element {
    fn from(q: Quad) -> Self {
        Element::Quad(q)
    }
}

impl From<QuadInterval> for Element {
    fn from(iv: QuadInterval) -> Self {
        Element::Interval(iv)
    }
}

/// Sorted, merged set of quadruples and intervals with an optional negation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadSet {
    elements: Vec<Element>,
    negate: bool,
}

impl QuadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quadruple or an interval. Returns false if the set already
    /// covered it.
    pub fn add(&mut self, element: impl Into<Element>) -> bool {
        match element.into() {
            Element::Quad(q) => self.add_quad(q),
            Element::Interval(iv) => self.add_interval(iv),
        }
    }

    pub fn add_quad(&mut self, q: Quad) -> bool {
        if self.has_quad(q) {
            return false;
        }
        self.insert_range(QuadInterval::single(q))
    }

    /// Add an interval, absorbing every element it overlaps or touches.
    pub fn add_interval(&mut self, iv: QuadInterval) -> bool {
        self.insert_range(iv)
    }

    fn insert_range(&mut self, iv: QuadInterval) -> bool {
        let lower = iv.lower().value() as u64;
        let upper = iv.upper().value() as u64;
        // First element that ends no more than one step before the new range.
        let idx = self
            .elements
            .partition_point(|e| e.upper().value() as u64 + 1 < lower);

        match self.elements.get(idx) {
            Some(e) if e.lower().value() as u64 <= upper + 1 => {
                let mut joined = e.to_interval();
                if joined.contains_interval(&iv) {
                    return false;
                }
                joined.join(&iv);
                self.elements[idx] = Element::Interval(joined);
                self.join_if_possible(idx);
            }
            _ => self.elements.insert(idx, Element::from_interval(iv)),
        }
        true
    }

    /// Merge the elements after `idx` that the widened element at `idx` now
    /// overlaps or touches.
    fn join_if_possible(&mut self, idx: usize) {
        let mut current = self.elements[idx].to_interval();
        let mut end = idx + 1;
        while let Some(next) = self.elements.get(end) {
            if next.lower().value() as u64 > current.upper().value() as u64 + 1 {
                break;
            }
            current.join(&next.to_interval());
            end += 1;
        }
        if end > idx + 1 {
            self.elements.drain(idx + 1..end);
            self.elements[idx] = Element::Interval(current);
        }
    }

    /// Add every element of `other` to this set. Negation of `other` is not
    /// taken into account.
    pub fn join(&mut self, other: &QuadSet) {
        for element in &other.elements {
            self.add(*element);
        }
    }

    pub fn set_negate(&mut self, negate: bool) {
        self.negate = negate;
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// True if a stored element covers `q`. The negation flag is ignored.
    pub fn has_quad(&self, q: Quad) -> bool {
        let idx = self.elements.partition_point(|e| e.upper() < q);
        self.elements.get(idx).is_some_and(|e| e.lower() <= q)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Expression matching the 8-letter form of every quadruple in the set.
    ///
    /// A negated set is first replaced by its complement and the negation
    /// flag is cleared, so calling this again yields the same expression.
    ///
    /// A set without elements, including the complement of the full code
    /// space, gives `()`. That group matches only the empty word, so no
    /// 8-letter quadruple matches it.
    pub fn generate_posix(&mut self) -> String {
        if self.negate {
            self.do_negate();
            self.negate = false;
        }
        let mut res = String::from("(");
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                res.push('|');
            }
            res.push_str(&element.generate_posix());
        }
        res.push(')');
        res
    }

    /// Replace the elements with their complement in `[0, Quad::MAX]`.
    fn do_negate(&mut self) {
        let mut complement = QuadSet::new();
        let mut gap_start: u64 = 0;
        for element in &self.elements {
            let lower = element.lower().value() as u64;
            if lower > gap_start {
                complement.add_negate_interval(gap_start as u32, (lower - 1) as u32);
            }
            gap_start = element.upper().value() as u64 + 1;
        }
        if gap_start <= u32::MAX as u64 {
            complement.add_negate_interval(gap_start as u32, u32::MAX);
        }
        self.elements = complement.elements;
    }

    fn add_negate_interval(&mut self, first: u32, last: u32) {
        if last < first {
            return;
        }
        let (first, last) = (Quad::from_value(first), Quad::from_value(last));
        if first == last {
            self.add_quad(first);
        } else if let Ok(iv) = QuadInterval::new(first, last) {
            self.add_interval(iv);
        }
    }
}

impl<'a> IntoIterator for &'a QuadSet {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<E: Into<Element>> Extend<E> for QuadSet {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        for element in iter {
            self.add(element);
        }
    }
}

impl<E: Into<Element>> FromIterator<E> for QuadSet {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut set = QuadSet::new();
        set.extend(iter);
        set
    }
}
