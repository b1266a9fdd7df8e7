use std::{cmp, iter::Fuse};

/// Zips two iterators up to the longer one, filling the exhausted side with `Default::default()`.
pub struct ZipPadded<T, U> {
    lhs: Fuse<T>,
    rhs: Fuse<U>,
}

pub fn zip_padded<T, U>(lhs: T, rhs: U) -> ZipPadded<T, U>
where
    T: Iterator,
    U: Iterator<Item = T::Item>,
    T::Item: Default,
{
    ZipPadded {
        lhs: lhs.fuse(),
        rhs: rhs.fuse(),
    }
}

impl<T, U> Iterator for ZipPadded<T, U>
where
    T: Iterator,
    U: Iterator<Item = T::Item>,
    T::Item: Default,
{
    type Item = (T::Item, T::Item);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match (self.lhs.next(), self.rhs.next()) {
            (None, None) => None,
            (a, b) => Some((a.unwrap_or_default(), b.unwrap_or_default())),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let (a_lower, a_upper) = self.lhs.size_hint();
        let (b_lower, b_upper) = self.rhs.size_hint();

        let upper = match (a_upper, b_upper) {
            (Some(x), Some(y)) => Some(cmp::max(x, y)),
            _ => None,
        };

        (cmp::max(a_lower, b_lower), upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_shorter_side() {
        let pairs: Vec<(i32, i32)> = zip_padded([1, 2, 3].into_iter(), [4].into_iter()).collect();
        assert_eq!(pairs, vec![(1, 4), (2, 0), (3, 0)]);

        let pairs: Vec<(i32, i32)> = zip_padded([].into_iter(), [7, 8].into_iter()).collect();
        assert_eq!(pairs, vec![(0, 7), (0, 8)]);
    }

    #[test]
    fn test_size_hint_uses_longer_side() {
        let iter = zip_padded([1, 2].into_iter(), [1, 2, 3, 4].into_iter());
        assert_eq!(iter.size_hint(), (4, Some(4)));
    }
}
