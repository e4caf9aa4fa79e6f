use std::collections::HashSet;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub type NodeId = usize;

/// Trees larger than this are refused outright; the path oracle and every
/// consumer snapshot are linear in node count.
pub const MAX_NODES: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub depth: u32,
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Parent → child link. The parent's depth is looked up through
/// [`GameState::edge_parent_depth`] rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

/// Validated tree shape: `width ≥ 1` nodes per non-root layer, `depth` layers
/// below the root. Only [`Dimensions::new`] and [`Dimensions::from_signed`]
/// build one, so a value in hand is always generatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    width: u32,
    depth: u32,
}

impl Dimensions {
    pub fn new(width: u32, depth: u32) -> Result<Self> {
        if width < 1 {
            return Err(Error::invalid_configuration(format!(
                "width must be at least 1, got {width}"
            )));
        }
        let dims = Self { width, depth };
        if dims.node_count() > MAX_NODES {
            return Err(Error::invalid_configuration(format!(
                "a {width}x{depth} tree exceeds the {MAX_NODES} node limit"
            )));
        }
        Ok(dims)
    }

    /// Entry point for untyped input (settings files, CLI flags, HTTP bodies).
    pub fn from_signed(width: i64, depth: i64) -> Result<Self> {
        if depth < 0 {
            return Err(Error::invalid_configuration(format!(
                "depth must not be negative, got {depth}"
            )));
        }
        if width < 1 {
            return Err(Error::invalid_configuration(format!(
                "width must be at least 1, got {width}"
            )));
        }
        let width = u32::try_from(width)
            .map_err(|_| Error::invalid_configuration(format!("width {width} is out of range")))?;
        let depth = u32::try_from(depth)
            .map_err(|_| Error::invalid_configuration(format!("depth {depth} is out of range")))?;
        Self::new(width, depth)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn node_count(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.depth as usize)
            .saturating_add(1)
    }
}

/// A randomly generated rooted tree plus the queries the traversal game needs.
///
/// Immutable once built: every game gets a fresh instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(flatten)]
    dims: Dimensions,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    layers: Vec<Vec<NodeId>>,
}

impl GameState {
    /// Builds the tree layer by layer. Each node below the root gets a parent
    /// drawn uniformly, with replacement, from the layer above.
    pub fn generate<R: Rng>(width: u32, depth: u32, rng: &mut R) -> Result<Self> {
        let dims = Dimensions::new(width, depth)?;
        Ok(Self::generate_with_dimensions(dims, rng))
    }

    pub fn generate_with_dimensions<R: Rng>(dims: Dimensions, rng: &mut R) -> Self {
        let total = dims.node_count();
        let mut nodes = Vec::with_capacity(total);
        let mut edges = Vec::with_capacity(total - 1);
        let mut layers: Vec<Vec<NodeId>> = Vec::with_capacity(dims.depth as usize + 1);

        nodes.push(Node {
            id: 0,
            depth: 0,
            parent: None,
        });
        layers.push(vec![0]);

        for depth in 1..=dims.depth {
            let previous = &layers[(depth - 1) as usize];
            let mut layer = Vec::with_capacity(dims.width as usize);
            for _ in 0..dims.width {
                let parent = previous[rng.random_range(0..previous.len())];
                let id = nodes.len();
                nodes.push(Node {
                    id,
                    depth,
                    parent: Some(parent),
                });
                edges.push(Edge { source: parent, target: id });
                layer.push(id);
            }
            layers.push(layer);
        }

        tracing::debug!(
            width = dims.width,
            depth = dims.depth,
            nodes = nodes.len(),
            "generated tree"
        );

        Self {
            dims,
            nodes,
            edges,
            layers,
        }
    }

    pub fn from_seed(width: u32, depth: u32, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::generate(width, depth, &mut rng)
    }

    pub fn random(width: u32, depth: u32) -> Result<Self> {
        Self::generate(width, depth, &mut rand::rng())
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn width(&self) -> u32 {
        self.dims.width
    }

    pub fn depth(&self) -> u32 {
        self.dims.depth
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn layers(&self) -> &[Vec<NodeId>] {
        &self.layers
    }

    pub fn layer(&self, depth: u32) -> Option<&[NodeId]> {
        self.layers.get(depth as usize).map(Vec::as_slice)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::UnknownNode { id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id < self.nodes.len()
    }

    pub fn parent(&self, node: &Node) -> Option<&Node> {
        node.parent.map(|id| &self.nodes[id])
    }

    pub fn edge_parent_depth(&self, edge: &Edge) -> Result<u32> {
        Ok(self.node(edge.source)?.depth)
    }

    /// `node`, its parent, …, up to and including the root.
    pub fn ancestors<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        std::iter::successors(Some(node), move |n| self.parent(n))
    }

    pub fn children(&self, id: NodeId) -> Result<impl Iterator<Item = &Node> + '_> {
        let node = self.node(id)?;
        let below = self.layer(node.depth + 1).unwrap_or(&[]);
        Ok(below
            .iter()
            .map(move |&child| &self.nodes[child])
            .filter(move |child| child.parent == Some(id)))
    }

    /// True when `ancestor` lies on the root path of `node` (inclusive).
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> Result<bool> {
        self.node(ancestor)?;
        let node = self.node(node)?;
        Ok(self.ancestors(node).any(|n| n.id == ancestor))
    }

    /// # Panics
    ///
    /// If two nodes of this tree share no ancestor. The root is a common
    /// ancestor of everything, so this only fires on a corrupted parent graph.
    pub fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> Result<&Node> {
        let a = self.node(a)?;
        let b = self.node(b)?;

        let seen: HashSet<NodeId> = self.ancestors(a).map(|n| n.id).collect();
        match self.ancestors(b).find(|n| seen.contains(&n.id)) {
            Some(lca) => Ok(lca),
            None => panic!(
                "nodes {} and {} share no ancestor: parent links are corrupted",
                a.id, b.id
            ),
        }
    }

    /// Walk from `a` up to the lowest common ancestor and back down to `b`.
    /// Both endpoints are included, so the move cost is `len - 1`.
    pub fn path_between(&self, a: NodeId, b: NodeId) -> Result<Vec<Node>> {
        let lca = *self.lowest_common_ancestor(a, b)?;
        let a = self.node(a)?;
        let b = self.node(b)?;

        let mut path: Vec<Node> = self
            .ancestors(a)
            .take_while(|n| n.id != lca.id)
            .copied()
            .collect();
        path.push(lca);

        let mut down: Vec<Node> = self
            .ancestors(b)
            .take_while(|n| n.id != lca.id)
            .copied()
            .collect();
        down.reverse();
        path.extend(down);

        Ok(path)
    }

    pub fn distance(&self, a: NodeId, b: NodeId) -> Result<u64> {
        Ok(self.path_between(a, b)?.len() as u64 - 1)
    }

    /// Hex SHA-256 over the shape and the parent links. Two trees with the
    /// same fingerprint are the same game board.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.dims.width.to_le_bytes());
        hasher.update(self.dims.depth.to_le_bytes());
        for node in &self.nodes {
            let parent = node.parent.map_or(u64::MAX, |p| p as u64);
            hasher.update(parent.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Test hook: build a tree from explicit parent links, one `Vec` per
    /// layer below the root. Parents index into the flat id space.
    pub fn from_parent_layers(parent_layers: &[Vec<NodeId>]) -> Result<Self> {
        let width = parent_layers.first().map_or(1, Vec::len);
        let dims = Dimensions::new(
            u32::try_from(width).map_err(|_| Error::invalid_configuration("layer too wide"))?,
            u32::try_from(parent_layers.len())
                .map_err(|_| Error::invalid_configuration("too many layers"))?,
        )?;

        let mut nodes = vec![Node {
            id: 0,
            depth: 0,
            parent: None,
        }];
        let mut edges = Vec::new();
        let mut layers = vec![vec![0]];

        for (index, parents) in parent_layers.iter().enumerate() {
            let depth = index as u32 + 1;
            if parents.len() != width {
                return Err(Error::invalid_configuration(format!(
                    "layer {depth} has {} nodes, expected {width}",
                    parents.len()
                )));
            }
            let mut layer = Vec::with_capacity(width);
            for &parent in parents {
                if !layers[index].contains(&parent) {
                    return Err(Error::invalid_configuration(format!(
                        "node {parent} is not on layer {index}"
                    )));
                }
                let id = nodes.len();
                nodes.push(Node {
                    id,
                    depth,
                    parent: Some(parent),
                });
                edges.push(Edge { source: parent, target: id });
                layer.push(id);
            }
            layers.push(layer);
        }

        Ok(Self {
            dims,
            nodes,
            edges,
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0
    // ├── 1 ── 4, 5
    // ├── 2 ── 6
    // └── 3
    fn sample() -> GameState {
        GameState::from_parent_layers(&[vec![0, 0, 0], vec![1, 1, 2]]).unwrap()
    }

    #[test]
    fn lca_of_siblings_is_their_parent() {
        let tree = sample();
        assert_eq!(tree.lowest_common_ancestor(4, 5).unwrap().id, 1);
        assert_eq!(tree.lowest_common_ancestor(4, 6).unwrap().id, 0);
    }

    #[test]
    fn lca_of_ancestor_pair_is_the_ancestor() {
        let tree = sample();
        assert_eq!(tree.lowest_common_ancestor(1, 5).unwrap().id, 1);
        assert_eq!(tree.lowest_common_ancestor(0, 6).unwrap().id, 0);
    }

    #[test]
    fn path_goes_up_then_down() {
        let tree = sample();
        let ids: Vec<NodeId> = tree.path_between(4, 6).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4, 1, 0, 2, 6]);
        assert_eq!(tree.distance(4, 6).unwrap(), 4);
    }

    #[test]
    fn path_to_self_is_a_single_node() {
        let tree = sample();
        let path = tree.path_between(5, 5).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].id, 5);
    }

    #[test]
    fn unknown_node_is_reported() {
        let tree = sample();
        assert_eq!(
            tree.path_between(0, 99).unwrap_err(),
            Error::UnknownNode { id: 99 }
        );
    }

    #[test]
    fn children_follow_parent_links() {
        let tree = sample();
        let kids: Vec<NodeId> = tree.children(1).unwrap().map(|n| n.id).collect();
        assert_eq!(kids, vec![4, 5]);
        assert_eq!(tree.children(3).unwrap().count(), 0);
    }

    #[test]
    fn explicit_layers_must_point_at_the_layer_above() {
        let err = GameState::from_parent_layers(&[vec![0, 0], vec![0, 1]]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn signed_dimensions_reject_negative_depth_and_zero_width() {
        assert!(matches!(
            Dimensions::from_signed(5, -1),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Dimensions::from_signed(0, 3),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert_eq!(
            Dimensions::from_signed(5, 0).unwrap(),
            Dimensions::new(5, 0).unwrap()
        );
    }

    #[test]
    fn oversized_trees_are_refused() {
        assert!(Dimensions::new(u32::MAX, u32::MAX).is_err());
    }
}
