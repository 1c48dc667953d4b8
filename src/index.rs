use anyhow::Result;

/// Exact nearest-neighbour index over squared L2 distance.
///
/// Vectors are stored contiguously in insertion order; a vector's id is its
/// insertion position. Search is a brute-force scan, which is plenty for a
/// single chapter's worth of paragraphs.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a vector and returns its id.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        anyhow::ensure!(self.dim > 0, "index dimension must be non-zero");
        anyhow::ensure!(
            vector.len() == self.dim,
            "vector dimension {} does not match index dimension {}",
            vector.len(),
            self.dim
        );

        let id = self.len();
        self.data.extend_from_slice(vector);
        Ok(id)
    }

    fn vector(&self, id: usize) -> &[f32] {
        &self.data[id * self.dim..(id + 1) * self.dim]
    }

    /// Returns up to `k` `(id, distance)` pairs ordered by ascending squared
    /// L2 distance. Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 || self.is_empty() {
            return Ok(vec![]);
        }
        anyhow::ensure!(
            query.len() == self.dim,
            "query dimension {} does not match index dimension {}",
            query.len(),
            self.dim
        );

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|id| (id, squared_l2(query, self.vector(id))))
            .collect();

        // stable sort keeps insertion order for ties
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

#[inline(always)]
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
