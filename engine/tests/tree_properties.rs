use engine::{GameState, NodeId};
use proptest::prelude::*;

fn tree_and_pair() -> impl Strategy<Value = (GameState, NodeId, NodeId)> {
    (1u32..6, 0u32..8, any::<u64>()).prop_flat_map(|(width, depth, seed)| {
        let tree = GameState::from_seed(width, depth, seed).expect("valid dimensions");
        let count = tree.nodes().len();
        (Just(tree), 0..count, 0..count)
    })
}

proptest! {
    #[test]
    fn shape_matches_dimensions(width in 1u32..8, depth in 0u32..10, seed in any::<u64>()) {
        let tree = GameState::from_seed(width, depth, seed).unwrap();
        prop_assert_eq!(tree.nodes().len(), 1 + (width * depth) as usize);
        prop_assert_eq!(tree.layers().len(), depth as usize + 1);
        for node in tree.nodes() {
            match node.parent {
                None => {
                    prop_assert_eq!(node.depth, 0);
                }
                Some(parent) => {
                    prop_assert_eq!(tree.node(parent).unwrap().depth + 1, node.depth);
                }
            }
            prop_assert_eq!(tree.ancestors(node).count(), node.depth as usize + 1);
        }
    }

    #[test]
    fn paths_are_symmetric((tree, a, b) in tree_and_pair()) {
        let forward = tree.path_between(a, b).unwrap();
        let mut backward = tree.path_between(b, a).unwrap();
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn path_to_self_costs_nothing((tree, a, _b) in tree_and_pair()) {
        let path = tree.path_between(a, a).unwrap();
        prop_assert_eq!(path.len(), 1);
        prop_assert_eq!(path[0].id, a);
        prop_assert_eq!(tree.distance(a, a).unwrap(), 0);
    }

    #[test]
    fn path_steps_are_edges((tree, a, b) in tree_and_pair()) {
        let path = tree.path_between(a, b).unwrap();
        prop_assert_eq!(path.first().map(|n| n.id), Some(a));
        prop_assert_eq!(path.last().map(|n| n.id), Some(b));
        for pair in path.windows(2) {
            let linked = pair[0].parent == Some(pair[1].id) || pair[1].parent == Some(pair[0].id);
            prop_assert!(linked, "{:?} -> {:?} is not an edge", pair[0], pair[1]);
        }
    }

    #[test]
    fn lca_is_the_lowest_common_ancestor((tree, a, b) in tree_and_pair()) {
        let lca = tree.lowest_common_ancestor(a, b).unwrap().id;
        prop_assert!(tree.is_ancestor(lca, a).unwrap());
        prop_assert!(tree.is_ancestor(lca, b).unwrap());
        for child in tree.children(lca).unwrap() {
            let both = tree.is_ancestor(child.id, a).unwrap() && tree.is_ancestor(child.id, b).unwrap();
            prop_assert!(!both, "child {} of {} is also common", child.id, lca);
        }
    }
}
