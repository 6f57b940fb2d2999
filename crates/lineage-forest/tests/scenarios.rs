use lineage_forest::build_forest;
use lineage_trace::{parse_str, ParserConfig};

fn forest_of(text: &str) -> (lineage_trace::Registry, lineage_forest::Forest) {
    let registry = parse_str(text, &ParserConfig::default());
    let forest = build_forest(&registry);
    (registry, forest)
}

#[test_log::test]
fn single_mutation_forms_one_tree() {
    let (registry, forest) = forest_of("# Generate\n>>>A\n<<<\n# Mutate\n>>>A\n<<<\n>>>B\n<<<\n");
    let a = registry.lookup("A").unwrap();
    let b = registry.lookup("B").unwrap();
    assert_eq!(forest.roots().len(), 1);
    let root = forest.node(forest.roots()[0]).unwrap();
    assert_eq!(root.program, a);
    assert_eq!(root.children, vec![forest.node_of(b).unwrap()]);
    assert_eq!(root.height, Some(1));
    assert_eq!(root.size, 2);
    let child = forest.node(forest.node_of(b).unwrap()).unwrap();
    assert_eq!(child.parent, Some(root.id));
    assert_eq!(child.level, Some(1));
}

#[test]
fn generated_then_mutated_signature_has_one_node() {
    let (registry, forest) = forest_of(
        "# Generate\n>>>A\n<<<\n# addInputToCorpus Source: 0\n\
         # Mutate\n>>>A\n<<<\n>>>B\n<<<\n\
         # Mutate\n>>>A\n<<<\n>>>C\n<<<\n",
    );
    assert_eq!(forest.len(), 3);
    let root = forest.node(forest.roots()[0]).unwrap();
    assert_eq!(root.program, registry.lookup("A").unwrap());
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.size, 3);
    assert_eq!(root.height, Some(1));
}

#[test]
fn unexecuted_minimize_target_is_reached_as_ancestor() {
    let (registry, forest) = forest_of(
        "# Generate\n>>>A\n<<<\n\
         # Minimize\n>>>A\n<<<\n# Minimize Final\n>>>C\n<<<\n\
         # addInputToCorpus Source: 2\n\
         # Mutate\n>>>C\n<<<\n>>>D\n<<<\n- executeRaw 5\n",
    );
    let c = registry.lookup("C").unwrap();
    assert!(!registry.program(c).unwrap().executed);
    let node = forest.node(forest.node_of(c).unwrap()).unwrap();
    assert_eq!(node.level, Some(1));
    assert_eq!(node.size, 2);
    let root = forest.node(forest.roots()[0]).unwrap();
    assert_eq!(root.height, Some(2));
    assert_eq!(root.size, 3);
}

#[test]
fn unreferenced_minimize_target_is_not_a_node() {
    let (registry, forest) = forest_of(
        "# Minimize\n>>>A\n<<<\n# Minimize Attempt\n>>>B\n<<<\n- executeRaw 2\n\
         # Minimize Final\n>>>C\n<<<\n",
    );
    assert!(forest.node_of(registry.lookup("C").unwrap()).is_none());
    assert!(forest.node_of(registry.lookup("B").unwrap()).is_some());
    assert_eq!(forest.len(), 2);
    assert_eq!(forest.roots().len(), 1);
}

#[test]
fn orphan_chain_top_becomes_a_root() {
    let (registry, forest) = forest_of(
        "# Generate\n>>>G\n<<<\n# Mutate\n>>>X\n<<<\n>>>Y\n<<<\n- executeRaw 1\n",
    );
    let x = registry.lookup("X").unwrap();
    assert_eq!(forest.roots().len(), 1);
    assert_eq!(forest.node(forest.roots()[0]).unwrap().program, x);
    assert_eq!(forest.len(), 3);
}

#[test_log::test]
fn cyclic_registry_terminates() {
    let (registry, forest) = forest_of(
        "# Mutate\n>>>A\n<<<\n>>>B\n<<<\n- executeRaw 1\n\
         # Mutate\n>>>B\n<<<\n>>>A\n<<<\n",
    );
    let a = registry.lookup("A").unwrap();
    let b = registry.lookup("B").unwrap();
    assert_eq!(registry.program(a).unwrap().parent, Some(b));
    assert_eq!(registry.program(b).unwrap().parent, Some(a));
    assert_eq!(forest.len(), 2);
    assert_eq!(forest.roots().len(), 1);
    assert_eq!(forest.node(forest.roots()[0]).unwrap().size, 2);
}

#[test]
fn empty_registry_gives_empty_forest() {
    let (_, forest) = forest_of("");
    assert!(forest.is_empty());
    assert!(forest.roots().is_empty());
}
