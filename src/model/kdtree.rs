use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Balanced k-d tree over fixed-dimension points.
///
/// Build is O(n log n) via median splits; nearest-neighbor queries prune on
/// the splitting plane and average O(log n) visited depth. Ties on equal
/// distances are broken by insertion index, so queries are deterministic for
/// a fixed build.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Vec<f64>>,
    nodes: Vec<Node>,
    root: Option<usize>,
    dims: usize,
}

#[derive(Debug, Clone)]
struct Node {
    /// Index into `points`.
    point: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Query result: squared distance plus the point's insertion index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub dist_sq: f64,
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap order: farther first, index breaks exact-distance ties.
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl KdTree {
    /// Build a balanced tree. Point order is preserved: `Neighbor::index`
    /// refers to the position in `points` as given.
    pub fn build(points: Vec<Vec<f64>>) -> Self {
        let dims = points.first().map(|p| p.len()).unwrap_or(0);
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = build_recursive(&points, &mut indices, 0, dims, &mut nodes);
        Self {
            points,
            nodes,
            root,
            dims,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The `k` nearest points to `query` by Euclidean distance, closest
    /// first. Returns fewer than `k` when the tree is smaller.
    pub fn nearest(&self, query: &[f64], k: usize) -> Vec<Neighbor> {
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);
        if k > 0 {
            if let Some(root) = self.root {
                self.search(root, query, k, &mut heap);
            }
        }
        let mut result = heap.into_vec();
        result.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq).then(a.index.cmp(&b.index)));
        result
    }

    fn search(&self, node_idx: usize, query: &[f64], k: usize, heap: &mut BinaryHeap<Neighbor>) {
        let node = &self.nodes[node_idx];
        let point = &self.points[node.point];
        let candidate = Neighbor {
            index: node.point,
            dist_sq: dist_sq(point, query),
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            if candidate < *worst {
                heap.push(candidate);
                heap.pop();
            }
        }

        if self.dims == 0 {
            return;
        }
        let axis_delta = query[node.axis] - point[node.axis];
        let (first, second) = if axis_delta < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(n) = first {
            self.search(n, query, k, heap);
        }
        // Visit the far side only if the splitting plane can still hold a
        // closer point than the current worst.
        let must_check = heap.len() < k
            || heap
                .peek()
                .map(|w| axis_delta * axis_delta <= w.dist_sq)
                .unwrap_or(true);
        if must_check {
            if let Some(n) = second {
                self.search(n, query, k, heap);
            }
        }
    }
}

fn build_recursive(
    points: &[Vec<f64>],
    indices: &mut [usize],
    depth: usize,
    dims: usize,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if indices.is_empty() {
        return None;
    }
    let axis = if dims == 0 { 0 } else { depth % dims };
    let median = indices.len() / 2;
    // Order by coordinate, then insertion index so equal coordinates split
    // the same way on every build.
    indices.select_nth_unstable_by(median, |&a, &b| {
        points[a][axis]
            .total_cmp(&points[b][axis])
            .then(a.cmp(&b))
    });
    let point = indices[median];

    let (left_slice, rest) = indices.split_at_mut(median);
    let right_slice = &mut rest[1..];
    let left = build_recursive(points, left_slice, depth + 1, dims, nodes);
    let right = build_recursive(points, right_slice, depth + 1, dims, nodes);

    nodes.push(Node {
        point,
        axis,
        left,
        right,
    });
    Some(nodes.len() - 1)
}

fn dist_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
