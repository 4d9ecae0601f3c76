//! Closed ranges of quadruples and their translation to POSIX EREs.
//!
//! A range of 32-bit codes cannot be written as one bracket expression over
//! the 8-letter form, so it is split byte by byte: the bytes shared by both
//! bounds become a literal prefix, and at the first byte that differs the
//! range falls apart into a low corner, a block of fully covered values and
//! a high corner.

use smallvec::SmallVec;

use crate::quad::{char_hexrepr, Quad};
use crate::PatternError;

/// A fully spanned byte: any two letters.
const ANY_BYTE: &str = "..";

/// Wildcards of this many characters or more are written as `.{n}`.
const REPEAT_THRESHOLD: usize = 6;

/// Closed interval `[lower, upper]` of quadruples, `lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadInterval {
    lower: Quad,
    upper: Quad,
}

impl QuadInterval {
    pub fn new(lower: Quad, upper: Quad) -> Result<QuadInterval, PatternError> {
        if upper < lower {
            return Err(PatternError::InvertedInterval { lower, upper });
        }
        Ok(QuadInterval { lower, upper })
    }

    /// The interval holding only `q`.
    #[inline]
    pub fn single(q: Quad) -> QuadInterval {
        QuadInterval { lower: q, upper: q }
    }

    #[inline]
    pub fn lower(&self) -> Quad {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> Quad {
        self.upper
    }

    #[inline]
    pub fn contains(&self, q: Quad) -> bool {
        self.lower <= q && q <= self.upper
    }

    #[inline]
    pub fn contains_interval(&self, other: &QuadInterval) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }

    /// True if the two intervals share at least one quadruple.
    #[inline]
    pub fn has_intersection(&self, other: &QuadInterval) -> bool {
        other.lower <= self.upper && self.lower <= other.upper
    }

    /// True if the intervals touch without overlapping, like `[0, 4]` and `[5, 9]`.
    pub fn is_adjacent(&self, other: &QuadInterval) -> bool {
        let touches = |a: Quad, b: Quad| a.value().checked_add(1) == Some(b.value());
        touches(self.upper, other.lower) || touches(other.upper, self.lower)
    }

    /// Widen `self` to the bounding box of both intervals.
    ///
    /// Only a union when the intervals intersect or are adjacent; the caller
    /// checks that.
    pub fn join(&mut self, other: &QuadInterval) {
        if other.lower < self.lower {
            self.lower = other.lower;
        }
        if other.upper > self.upper {
            self.upper = other.upper;
        }
    }

    /// Number of steps from `lower` to `upper`; 0 for a single quadruple.
    #[inline]
    pub fn width(&self) -> u32 {
        (self.upper - self.lower).value()
    }

    /// Expression matching exactly the 8-letter forms of the quadruples in
    /// the interval.
    pub fn generate_posix(&self) -> String {
        let lo = self.lower.bytes();
        let hi = self.upper.bytes();

        let Some(c) = (0..4).find(|&i| lo[i] != hi[i]) else {
            return self.lower.hexrepr();
        };

        // lower <= upper and the bytes before c agree, so lo[c] < hi[c].
        debug_assert!(lo[c] < hi[c], "interval end lower than start: {:?}", self);
        let mut res = String::new();
        if c == 3 {
            push_bytes(&mut res, &lo[..3]);
            res.push_str(&hex_interval(lo[3], hi[3]));
            return res;
        }

        res.push('(');
        res.push_str(&low_corner(&lo, c));
        if hi[c] - lo[c] > 1 {
            res.push('|');
            push_bytes(&mut res, &lo[..c]);
            res.push_str(&hex_interval(lo[c] + 1, hi[c] - 1));
            push_wildcard(&mut res, 2 * (3 - c));
        }
        res.push('|');
        res.push_str(&high_corner(&hi, c));
        res.push(')');
        res
    }
}

/// Byte `c` fixed at its lower value, the bytes after it ranging from their
/// lower values up to 255.
fn low_corner(lo: &[u8; 4], c: usize) -> String {
    let mut terms: SmallVec<[String; 3]> = SmallVec::new();
    for j in (c + 1..4).rev() {
        let start = if j == 3 {
            lo[3]
        } else if lo[j] < u8::MAX {
            lo[j] + 1
        } else {
            continue;
        };
        let mut term = String::new();
        push_bytes(&mut term, &lo[..j]);
        term.push_str(&hex_interval(start, u8::MAX));
        for _ in j + 1..4 {
            term.push_str(ANY_BYTE);
        }
        terms.push(term);
    }
    format!("({})", terms.join("|"))
}

/// Byte `c` fixed at its upper value, the bytes after it ranging from 0 up
/// to their upper values.
fn high_corner(hi: &[u8; 4], c: usize) -> String {
    let mut terms: SmallVec<[String; 3]> = SmallVec::new();
    for j in c + 1..4 {
        let end = if j == 3 {
            hi[3]
        } else if hi[j] > 0 {
            hi[j] - 1
        } else {
            continue;
        };
        let mut term = String::new();
        push_bytes(&mut term, &hi[..j]);
        term.push_str(&hex_interval(0, end));
        for _ in j + 1..4 {
            term.push_str(ANY_BYTE);
        }
        terms.push(term);
    }
    format!("({})", terms.join("|"))
}

fn push_bytes(out: &mut String, bytes: &[u8]) {
    for &b in bytes {
        let [h, l] = char_hexrepr(b);
        out.push(h as char);
        out.push(l as char);
    }
}

fn push_wildcard(out: &mut String, len: usize) {
    if len < REPEAT_THRESHOLD {
        out.extend(std::iter::repeat('.').take(len));
    } else {
        out.push_str(&format!(".{{{}}}", len));
    }
}

/// Expression for the 2-letter forms of the bytes in `[source, dest]`.
///
/// ```
/// use quadpattern::generate_hex_interval;
///
/// assert_eq!(generate_hex_interval(0x30, 0x39).unwrap(), "D[A-J]");
/// assert_eq!(generate_hex_interval(0x00, 0xFF).unwrap(), "(..)");
/// assert!(generate_hex_interval(9, 3).is_err());
/// ```
pub fn generate_hex_interval(source: u8, dest: u8) -> Result<String, PatternError> {
    if source > dest {
        return Err(PatternError::InvertedByteRange { source, dest });
    }
    Ok(hex_interval(source, dest))
}

/// [`generate_hex_interval`] for `source <= dest`.
fn hex_interval(source: u8, dest: u8) -> String {
    let [mut s_hi, s_lo] = char_hexrepr(source);
    let [mut d_hi, d_lo] = char_hexrepr(dest);
    let mut res = String::new();

    if s_hi == d_hi {
        res.push(s_hi as char);
        if s_lo == d_lo {
            res.push(s_lo as char);
        } else if s_lo == b'A' && d_lo == b'P' {
            res.push('.');
        } else {
            push_bracket(&mut res, s_lo, d_lo);
        }
        return res;
    }

    let mut parts: SmallVec<[String; 3]> = SmallVec::new();
    if s_lo != b'A' {
        let mut part = String::from(s_hi as char);
        push_bracket(&mut part, s_lo, b'P');
        parts.push(part);
        s_hi += 1;
    }
    if d_lo != b'P' {
        let mut part = String::from(d_hi as char);
        push_bracket(&mut part, b'A', d_lo);
        parts.push(part);
        d_hi -= 1;
    }
    if d_hi >= s_hi {
        let mut part = String::new();
        if s_hi == b'A' && d_hi == b'P' {
            part.push('.');
        } else if s_hi == d_hi {
            part.push(s_hi as char);
        } else {
            push_bracket(&mut part, s_hi, d_hi);
        }
        part.push('.');
        parts.push(part);
    }

    res.push('(');
    res.push_str(&parts.join("|"));
    res.push(')');
    res
}

fn push_bracket(out: &mut String, from: u8, to: u8) {
    out.push('[');
    out.push(from as char);
    out.push('-');
    out.push(to as char);
    out.push(']');
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn anchored(fragment: &str) -> Regex {
        Regex::new(&format!("^(?:{})$", fragment)).unwrap()
    }

    fn interval(lo: u32, hi: u32) -> QuadInterval {
        QuadInterval::new(Quad::from_value(lo), Quad::from_value(hi)).unwrap()
    }

    /// Checks the generated expression against every sample quadruple.
    fn check_interval(lo: u32, hi: u32, samples: impl IntoIterator<Item = u32>) {
        let iv = interval(lo, hi);
        let posix = iv.generate_posix();
        let re = anchored(&posix);
        for v in samples {
            let q = Quad::from_value(v);
            assert_eq!(
                re.is_match(&q.hexrepr()),
                iv.contains(q),
                "interval [{:#x}, {:#x}] as {} on {:#x}",
                lo,
                hi,
                posix,
                v
            );
        }
    }

    /// Values around the interesting points of an interval.
    fn edge_samples(lo: u32, hi: u32) -> Vec<u32> {
        let mut out = Vec::new();
        for base in [0, lo, hi, u32::MAX] {
            for delta in [-257i64, -256, -255, -2, -1, 0, 1, 2, 255, 256, 257] {
                let v = base as i64 + delta;
                if (0..=u32::MAX as i64).contains(&v) {
                    out.push(v as u32);
                }
            }
        }
        for shift in [8, 16, 24] {
            for b in [lo, hi] {
                let aligned = (b >> shift) << shift;
                out.push(aligned);
                out.push(aligned | ((1u32 << shift) - 1));
            }
        }
        out
    }

    struct XorShift(u32);

    impl XorShift {
        fn next(&mut self) -> u32 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            self.0
        }
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        let err = QuadInterval::new(Quad::from_value(5), Quad::from_value(4)).unwrap_err();
        assert_eq!(
            err,
            PatternError::InvertedInterval {
                lower: Quad::from_value(5),
                upper: Quad::from_value(4),
            }
        );
        assert!(QuadInterval::new(Quad::from_value(5), Quad::from_value(5)).is_ok());
    }

    #[test]
    fn test_contains_and_intersection() {
        let a = interval(10, 20);
        assert!(a.contains(Quad::from_value(10)));
        assert!(a.contains(Quad::from_value(20)));
        assert!(!a.contains(Quad::from_value(21)));
        assert!(a.contains_interval(&interval(12, 20)));
        assert!(!a.contains_interval(&interval(12, 21)));

        assert!(a.has_intersection(&interval(20, 30)));
        assert!(a.has_intersection(&interval(0, 10)));
        assert!(a.has_intersection(&interval(0, 40)));
        assert!(a.has_intersection(&interval(15, 16)));
        assert!(!a.has_intersection(&interval(21, 30)));
        assert!(!a.has_intersection(&interval(0, 9)));
    }

    #[test]
    fn test_adjacency() {
        let a = interval(10, 20);
        assert!(a.is_adjacent(&interval(21, 30)));
        assert!(a.is_adjacent(&interval(0, 9)));
        assert!(!a.is_adjacent(&interval(22, 30)));
        assert!(!a.is_adjacent(&interval(20, 30)));
        assert!(!interval(0, u32::MAX).is_adjacent(&interval(0, 0)));
    }

    #[test]
    fn test_join_and_width() {
        let mut a = interval(10, 20);
        a.join(&interval(15, 40));
        assert_eq!(a, interval(10, 40));
        a.join(&interval(0, 9));
        assert_eq!(a, interval(0, 40));
        assert_eq!(a.width(), 40);
        assert_eq!(interval(7, 7).width(), 0);
        assert_eq!(interval(0, u32::MAX).width(), u32::MAX);
    }

    #[test]
    fn test_hex_interval_shapes() {
        assert_eq!(generate_hex_interval(0x41, 0x41).unwrap(), "EB");
        assert_eq!(generate_hex_interval(0x40, 0x4F).unwrap(), "E.");
        assert_eq!(generate_hex_interval(0x41, 0x4E).unwrap(), "E[B-O]");
        assert_eq!(generate_hex_interval(0x00, 0x41).unwrap(), "(E[A-B]|[A-D].)");
        assert_eq!(generate_hex_interval(0x05, 0xFA).unwrap(), "(A[F-P]|P[A-K]|[B-O].)");
        assert_eq!(generate_hex_interval(0x05, 0x1F).unwrap(), "(A[F-P]|B.)");
        assert_eq!(generate_hex_interval(0x00, 0x10).unwrap(), "(B[A-A]|A.)");
        assert_eq!(generate_hex_interval(0x0F, 0x10).unwrap(), "(A[P-P]|B[A-A])");
        assert_eq!(generate_hex_interval(0x00, 0xFF).unwrap(), "(..)");
    }

    #[test]
    fn test_hex_interval_exhaustive() {
        let all: Vec<String> = (0..=255u8)
            .map(|b| crate::quad::char_hexrepr_str(b))
            .collect();
        for source in 0..=255u8 {
            for dest in source..=255u8 {
                let fragment = generate_hex_interval(source, dest).unwrap();
                assert!(fragment
                    .bytes()
                    .all(|b| b"()|[]-.".contains(&b) || (b'A'..=b'P').contains(&b)));
                let re = anchored(&fragment);
                for (b, hex) in all.iter().enumerate() {
                    let inside = (source as usize..=dest as usize).contains(&b);
                    assert_eq!(
                        re.is_match(hex),
                        inside,
                        "[{}, {}] as {} on {}",
                        source,
                        dest,
                        fragment,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_hex_interval_rejects_inverted() {
        for (s, d) in [(1u8, 0u8), (0x20, 0x1F), (255, 0)] {
            assert_eq!(
                generate_hex_interval(s, d),
                Err(PatternError::InvertedByteRange { source: s, dest: d })
            );
        }
    }

    #[test]
    fn test_generate_posix_single_cell_range() {
        let iv = QuadInterval::new(Quad::new(0, 0, 0, 0), Quad::new(0, 0, 0, 15)).unwrap();
        let posix = iv.generate_posix();
        assert_eq!(posix, "AAAAAAA.");
        let re = anchored(&posix);
        assert!(re.is_match(&Quad::new(0, 0, 0, 5).hexrepr()));
        assert!(!re.is_match(&Quad::new(0, 0, 1, 0).hexrepr()));
    }

    #[test]
    fn test_generate_posix_degenerate_interval() {
        assert_eq!(interval(0x41, 0x41).generate_posix(), "AAAAAAEB");
    }

    #[test]
    fn test_generate_posix_trailing_bytes_may_descend() {
        // Bytes after the first differing one are lower in `upper` than in
        // `lower`; only the first differing byte has to ascend.
        let iv = QuadInterval::new(Quad::new(0, 0, 0xFF, 0xFF), Quad::new(0, 1, 0, 0)).unwrap();
        assert_eq!(iv.generate_posix(), "((AAAAPPPP)|(AABAAAAA))");
        check_interval(0xFFFF, 0x1_0000, [0, 0xFFFE, 0xFFFF, 0x1_0000, 0x1_0001]);

        check_interval(0x00FF_FFFF, 0x0100_0000, edge_samples(0x00FF_FFFF, 0x0100_0000));
    }

    #[test]
    fn test_generate_posix_uses_repetition_count() {
        let posix = interval(0x0100_0000, 0x05FF_FFFF).generate_posix();
        assert!(posix.contains(".{6}"), "{}", posix);
        let posix = interval(0x0001_0000, 0x0005_FFFF).generate_posix();
        assert!(posix.contains("...."), "{}", posix);
        assert!(!posix.contains('{'), "{}", posix);
    }

    #[test]
    fn test_generate_posix_output_alphabet() {
        let posix = interval(0x0012_3456, 0x89AB_CDEF).generate_posix();
        assert!(posix
            .bytes()
            .all(|b| b"()|[]-.{}0123456789".contains(&b) || (b'A'..=b'P').contains(&b)));
    }

    #[test]
    fn test_generate_posix_two_byte_ranges() {
        // Every interval inside the low 0x300 codes, checked against every code
        // in [0, 0x400).
        for lo in (0..0x300u32).step_by(7) {
            for hi in (lo..0x300).step_by(13) {
                check_interval(lo, hi, 0..0x400);
            }
        }
    }

    #[test]
    fn test_generate_posix_edges() {
        let bounds = [
            (0, 0),
            (0, u32::MAX),
            (1, u32::MAX - 1),
            (0xFF, 0x100),
            (0xFFFF, 0x1_0000),
            (0x00FF_FFFF, 0x0100_0000),
            (0x0001_0000, 0x0001_FFFF),
            (0x0000_FF00, 0x0002_00FF),
            (0x0102_0304, 0x0102_0304),
            (0x0102_0304, 0x0102_FFFF),
            (0x0102_0304, 0x0302_0100),
            (0x00FF_FFFF, 0xFF00_0000),
            (0x0010_FFFF, 0x0011_0000),
            (0x0000_D800, 0x0000_DFFF),
        ];
        for (lo, hi) in bounds {
            check_interval(lo, hi, edge_samples(lo, hi));
        }
    }

    #[test]
    fn test_generate_posix_random_intervals() {
        let mut rng = XorShift(0x1234_5678);
        for _ in 0..300 {
            let a = rng.next();
            let b = rng.next();
            // Narrow some intervals so that they share leading bytes.
            let b = match a % 3 {
                0 => b,
                1 => (a & 0xFFFF_0000) | (b & 0xFFFF),
                _ => (a & 0xFFFF_FF00) | (b & 0xFF),
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let mut samples = edge_samples(lo, hi);
            samples.extend((0..64).map(|_| rng.next()));
            samples.extend((0..64).map(|_| lo.wrapping_add(rng.next() % (hi - lo).max(1))));
            check_interval(lo, hi, samples);
        }
    }
}
