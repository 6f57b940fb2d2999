#![allow(dead_code)]

use lineage_trace::{parse_lines, ParserConfig, Registry};
use proptest::prelude::*;

/// One fuzzer action over a small signature space.
#[derive(Debug, Clone)]
pub enum Action {
    Generate(u8),
    Admit,
    Mutate(u8, u8),
    Minimize(u8, u8, u8),
    Cover(u16),
}

pub fn render(actions: &[Action]) -> Vec<String> {
    let mut lines = Vec::new();
    let block = |lines: &mut Vec<String>, n: u8| {
        lines.push(format!(">>>s{n}"));
        lines.push("<<<".into());
    };
    for action in actions {
        match action {
            Action::Generate(n) => {
                lines.push("# Generate".into());
                block(&mut lines, *n);
                lines.push("- executeRaw 1".into());
            }
            Action::Admit => lines.push("# addInputToCorpus Source: 1".into()),
            Action::Mutate(from, to) => {
                lines.push("# Mutate".into());
                block(&mut lines, *from);
                block(&mut lines, *to);
                lines.push("- executeRaw 2".into());
            }
            Action::Minimize(from, attempt, to) => {
                lines.push("# Minimize".into());
                block(&mut lines, *from);
                lines.push("# Minimize Attempt".into());
                block(&mut lines, *attempt);
                lines.push("- executeRaw 1".into());
                lines.push("# Minimize Final".into());
                block(&mut lines, *to);
            }
            Action::Cover(address) => lines.push(format!("= {address:x}")),
        }
    }
    lines
}

pub fn registry_of(actions: &[Action]) -> Registry {
    parse_lines(render(actions), &ParserConfig::default())
}

pub fn actions(max_signature: u8, max_len: usize) -> impl Strategy<Value = Vec<Action>> {
    let n = 0..max_signature;
    let action = prop_oneof![
        n.clone().prop_map(Action::Generate),
        Just(Action::Admit),
        (n.clone(), n.clone()).prop_map(|(a, b)| Action::Mutate(a, b)),
        (n.clone(), n.clone(), n).prop_map(|(a, b, c)| Action::Minimize(a, b, c)),
        any::<u16>().prop_map(Action::Cover),
    ];
    prop::collection::vec(action, 0..max_len)
}
