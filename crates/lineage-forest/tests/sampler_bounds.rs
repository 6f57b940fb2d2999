mod common;

use std::collections::HashSet;

use lineage_core::RngHandle;
use lineage_forest::{build_forest, prune, sample, sample_forest, SamplerConfig};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rendered_graph_respects_budget(
        actions in common::actions(40, 200),
        max_nodes in 0usize..30,
        seed in any::<u64>(),
    ) {
        let registry = common::registry_of(&actions);
        let forest = build_forest(&registry);
        let config = SamplerConfig { max_nodes, seed, ..SamplerConfig::default() };
        let graph = sample_forest(&forest, &registry, &config).unwrap();
        prop_assert!(graph.nodes.len() <= max_nodes);
        for (index, node) in graph.nodes.iter().enumerate() {
            prop_assert_eq!(node.id, index);
        }
        for edge in &graph.edges {
            prop_assert!(edge.from < edge.to);
            prop_assert_eq!(graph.nodes[edge.to].level, graph.nodes[edge.from].level + 1);
        }
    }

    #[test]
    fn pruned_subset_stays_closed_under_parents(
        actions in common::actions(40, 200),
        max_nodes in 0usize..30,
        seed in any::<u64>(),
    ) {
        let forest = build_forest(&common::registry_of(&actions));
        let config = SamplerConfig { max_nodes, sample_rate: Some(1.0), ..SamplerConfig::default() };
        let mut subset = sample(&forest, &config, &mut RngHandle::from_seed(seed));
        prune(&mut subset, max_nodes, &mut RngHandle::from_seed(seed ^ 1));
        prop_assert!(subset.len() <= max_nodes);
        let roots: HashSet<_> = subset.roots().into_iter().collect();
        let mut total = 0;
        for root in &roots {
            prop_assert!(subset.parent(*root).is_none());
            total += subset.size_of(*root).unwrap();
        }
        prop_assert_eq!(total, subset.len());
        for root in roots {
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                for child in subset.children(id) {
                    prop_assert!(subset.contains(*child));
                    prop_assert_eq!(subset.parent(*child), Some(id));
                    stack.push(*child);
                }
            }
        }
    }
}

#[test]
fn fixed_seed_reproduces_the_sample() {
    let actions: Vec<_> = (0..60u8)
        .flat_map(|n| {
            [
                common::Action::Generate(n % 7),
                common::Action::Admit,
                common::Action::Mutate(n % 7, n),
                common::Action::Admit,
                common::Action::Mutate(n, n.wrapping_add(100)),
            ]
        })
        .collect();
    let registry = common::registry_of(&actions);
    let forest = build_forest(&registry);
    let config = SamplerConfig {
        max_nodes: 25,
        seed: 9,
        ..SamplerConfig::default()
    };
    let first = sample_forest(&forest, &registry, &config).unwrap();
    let second = sample_forest(&forest, &registry, &config).unwrap();
    assert_eq!(first, second);
    assert!(!first.nodes.is_empty());
    assert!(first.nodes.len() <= 25);
}

#[test]
fn invalid_rates_are_rejected() {
    let registry = common::registry_of(&[]);
    let forest = build_forest(&registry);
    let config = SamplerConfig {
        prune_rate: Some(1.5),
        ..SamplerConfig::default()
    };
    let err = sample_forest(&forest, &registry, &config).unwrap_err();
    assert_eq!(err.info().code, "rate-out-of-range");
}
