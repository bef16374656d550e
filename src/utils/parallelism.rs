//! Slice iteration which is parallel through rayon if the `parallel` feature is enabled and sequential otherwise.
//! Callers use the same `map`/`collect` chain in both cases and import this module's [ParallelIterator].

#[cfg(feature = "parallel")]
pub use rayon::iter::ParallelIterator;

pub trait MaybeParallelRefIterator<'data> {
    type Iter;

    fn maybe_par_iter(&'data self) -> Self::Iter;
}

#[cfg(feature = "parallel")]
impl<'data, T: Sync + 'data> MaybeParallelRefIterator<'data> for [T] {
    type Iter = rayon::slice::Iter<'data, T>;

    fn maybe_par_iter(&'data self) -> Self::Iter {
        use rayon::iter::IntoParallelRefIterator;

        self.par_iter()
    }
}

#[cfg(not(feature = "parallel"))]
impl<'data, T: 'data> MaybeParallelRefIterator<'data> for [T] {
    type Iter = std::slice::Iter<'data, T>;

    fn maybe_par_iter(&'data self) -> Self::Iter {
        self.iter()
    }
}

/// Stands in for rayon's trait so imports are the same with and without the `parallel` feature.
#[cfg(not(feature = "parallel"))]
pub use std::iter::Iterator as ParallelIterator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order() {
        let items: Vec<usize> = (0..100).collect();
        let doubled: Vec<usize> = items[..].maybe_par_iter().map(|x| x * 2).collect();

        assert_eq!(doubled, (0..100).map(|x| x * 2).collect::<Vec<_>>());
    }
}
