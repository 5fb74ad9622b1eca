//! Lexicographic k-subsets of a candidate pool.

/// Iterator over every `k`-element subset of `pool`, in lexicographic order of
/// positions within `pool`.
///
/// With an ascending pool this is lexicographic over vertex indices.
/// `k = 0` yields exactly one empty subset; `k > pool.len()` yields nothing.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    pool: &'a [usize],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    /// Create the iterator.
    pub fn new(pool: &'a [usize], k: usize) -> Self {
        Self {
            pool,
            indices: (0..k).collect(),
            done: k > pool.len(),
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.indices.iter().map(|&i| self.pool[i]).collect();

        // Advance to the next index tuple.
        let n = self.pool.len();
        let k = self.indices.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] != i + n - k {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(item)
    }
}

/// Number of `k`-subsets of an `n`-set.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}
