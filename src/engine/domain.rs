//! Integer domains: a bitset for dense intervals, a sorted list for
//! sparse value sets.

/// Widest span stored as a bitset by [`Domain::from_values`].
const DENSE_SPAN_LIMIT: i64 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Values {
    /// Bit `i` of the words stands for `offset + i`.
    Bits { offset: i64, words: Vec<u64> },
    /// Strictly increasing values.
    Sorted(Vec<i64>),
}

/// A finite set of integers.
///
/// Intervals are stored as a bitset over `[offset, offset + 64·words)`.
/// Value sets with a wide span, such as changeover costs, keep only their
/// members in a sorted list so that memory and iteration follow the number
/// of values rather than their magnitude.
///
/// # Examples
///
/// ```
/// use u_lotsizing::engine::Domain;
///
/// let mut d = Domain::new(-1, 4);
/// assert_eq!(d.size(), 6);
/// d.remove(2);
/// assert_eq!(d.iter().collect::<Vec<_>>(), vec![-1, 0, 1, 3, 4]);
/// d.remove_below(1);
/// assert_eq!(d.min(), Some(1));
///
/// let costs = Domain::from_values([90_000_000, 0, 45_000_000, 0]);
/// assert_eq!(costs.size(), 3);
/// assert_eq!(costs.max(), Some(90_000_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    values: Values,
    size: usize,
}

impl Domain {
    /// Creates the interval domain `[min, max]`; empty when `min > max`.
    pub fn new(min: i64, max: i64) -> Self {
        if min > max {
            return Self {
                values: Values::Sorted(Vec::new()),
                size: 0,
            };
        }
        let width = (max - min + 1) as usize;
        let mut words = vec![u64::MAX; width.div_ceil(64)];
        let tail = width % 64;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Self {
            values: Values::Bits { offset: min, words },
            size: width,
        }
    }

    /// Creates the domain holding exactly `values` (duplicates ignored).
    ///
    /// A bitset is used when the span is at most 4096; otherwise the values
    /// are kept as a sorted list.
    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        let mut sorted: Vec<i64> = values.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Self::new(1, 0);
        };
        if max.saturating_sub(min) < DENSE_SPAN_LIMIT {
            let mut domain = Self::new(min, max);
            let mut members = sorted.iter().copied().peekable();
            domain.retain(|v| {
                while members.next_if(|&m| m < v).is_some() {}
                members.peek() == Some(&v)
            });
            return domain;
        }
        Self {
            size: sorted.len(),
            values: Values::Sorted(sorted),
        }
    }

    /// Creates the singleton domain `{value}`.
    pub fn singleton(value: i64) -> Self {
        Self::new(value, value)
    }

    /// Number of values.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if no value is left.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if exactly one value is left.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.size == 1
    }

    /// The single remaining value, if fixed.
    pub fn value(&self) -> Option<i64> {
        if self.is_fixed() {
            self.min()
        } else {
            None
        }
    }

    #[inline]
    fn locate(offset: i64, words: &[u64], value: i64) -> Option<(usize, u64)> {
        if value < offset {
            return None;
        }
        let bit = (value - offset) as usize;
        let word = bit / 64;
        if word >= words.len() {
            return None;
        }
        Some((word, 1u64 << (bit % 64)))
    }

    /// Returns `true` if `value` is in the domain.
    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        match &self.values {
            Values::Bits { offset, words } => Self::locate(*offset, words, value)
                .is_some_and(|(w, mask)| words[w] & mask != 0),
            Values::Sorted(values) => values.binary_search(&value).is_ok(),
        }
    }

    /// Smallest value.
    pub fn min(&self) -> Option<i64> {
        match &self.values {
            Values::Bits { offset, words } => words
                .iter()
                .enumerate()
                .find(|&(_, &w)| w != 0)
                .map(|(i, w)| offset + (i * 64) as i64 + w.trailing_zeros() as i64),
            Values::Sorted(values) => values.first().copied(),
        }
    }

    /// Largest value.
    pub fn max(&self) -> Option<i64> {
        match &self.values {
            Values::Bits { offset, words } => words
                .iter()
                .enumerate()
                .rev()
                .find(|&(_, &w)| w != 0)
                .map(|(i, w)| offset + (i * 64) as i64 + 63 - w.leading_zeros() as i64),
            Values::Sorted(values) => values.last().copied(),
        }
    }

    /// Removes `value`. Returns `true` if the domain changed.
    pub fn remove(&mut self, value: i64) -> bool {
        let removed = match &mut self.values {
            Values::Bits { offset, words } => match Self::locate(*offset, words, value) {
                Some((w, mask)) if words[w] & mask != 0 => {
                    words[w] &= !mask;
                    true
                }
                _ => false,
            },
            Values::Sorted(values) => match values.binary_search(&value) {
                Ok(index) => {
                    values.remove(index);
                    true
                }
                Err(_) => false,
            },
        };
        if removed {
            self.size -= 1;
        }
        removed
    }

    /// Reduces the domain to `{value}` (or to empty if absent).
    /// Returns `true` if the domain changed.
    pub fn assign(&mut self, value: i64) -> bool {
        if self.is_fixed() && self.contains(value) {
            return false;
        }
        let present = self.contains(value);
        match &mut self.values {
            Values::Bits { offset, words } => {
                let keep = Self::locate(*offset, words, value).filter(|_| present);
                words.iter_mut().for_each(|w| *w = 0);
                if let Some((w, mask)) = keep {
                    words[w] = mask;
                }
            }
            Values::Sorted(values) => {
                values.clear();
                if present {
                    values.push(value);
                }
            }
        }
        self.size = usize::from(present);
        true
    }

    /// Keeps only the values satisfying `keep`. Returns `true` if the domain changed.
    pub fn retain(&mut self, mut keep: impl FnMut(i64) -> bool) -> bool {
        let before = self.size;
        if let Values::Sorted(values) = &mut self.values {
            values.retain(|&v| keep(v));
            self.size = values.len();
        } else {
            let dropped: Vec<i64> = self.iter().filter(|&v| !keep(v)).collect();
            for v in dropped {
                self.remove(v);
            }
        }
        self.size != before
    }

    /// Removes every value below `bound`.
    pub fn remove_below(&mut self, bound: i64) -> bool {
        if self.min().is_none_or(|min| min >= bound) {
            return false;
        }
        self.retain(|v| v >= bound)
    }

    /// Removes every value above `bound`.
    pub fn remove_above(&mut self, bound: i64) -> bool {
        if self.max().is_none_or(|max| max <= bound) {
            return false;
        }
        self.retain(|v| v <= bound)
    }

    /// Iterates the values in increasing order.
    pub fn iter(&self) -> DomainIter<'_> {
        let cursor = match &self.values {
            Values::Bits { offset, words } => Cursor::Bits {
                offset: *offset,
                words,
                word: 0,
                bits: words.first().copied().unwrap_or(0),
            },
            Values::Sorted(values) => Cursor::Sorted(values.iter()),
        };
        DomainIter { cursor }
    }
}

#[derive(Debug, Clone)]
enum Cursor<'a> {
    Bits {
        offset: i64,
        words: &'a [u64],
        word: usize,
        bits: u64,
    },
    Sorted(std::slice::Iter<'a, i64>),
}

/// Increasing iterator over a [`Domain`].
#[derive(Debug, Clone)]
pub struct DomainIter<'a> {
    cursor: Cursor<'a>,
}

impl Iterator for DomainIter<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        match &mut self.cursor {
            Cursor::Bits {
                offset,
                words,
                word,
                bits,
            } => loop {
                if *bits != 0 {
                    let tz = bits.trailing_zeros();
                    *bits &= *bits - 1;
                    return Some(*offset + (*word * 64) as i64 + tz as i64);
                }
                *word += 1;
                if *word >= words.len() {
                    return None;
                }
                *bits = words[*word];
            },
            Cursor::Sorted(values) => values.next().copied(),
        }
    }
}
