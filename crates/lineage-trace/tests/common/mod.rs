#![allow(dead_code)]

use proptest::prelude::*;

/// One fuzzer step rendered as trace lines.
#[derive(Debug, Clone)]
pub enum Step {
    Generate(u8),
    Mutate { from: u8, to: u8, admit: bool },
    Minimize { from: u8, attempts: Vec<u8>, to: u8 },
    Coverage(u16),
    Garbage,
}

pub fn block(signature: &str) -> Vec<String> {
    vec![format!(">>>{signature}"), "<<<".to_string()]
}

pub fn sig(n: u8) -> String {
    format!("prog{n}")
}

pub fn render(steps: &[Step]) -> Vec<String> {
    let mut lines = Vec::new();
    for (tick, step) in steps.iter().enumerate() {
        lines.push(format!("<<<{}>>>", 1_000_000_000u64 + tick as u64 * 1_000));
        match step {
            Step::Generate(n) => {
                lines.push("# Generate".into());
                lines.extend(block(&sig(*n)));
                lines.push("- proc 0 executeRaw 2".into());
            }
            Step::Mutate { from, to, admit } => {
                lines.push("# Mutate".into());
                lines.extend(block(&sig(*from)));
                lines.extend(block(&sig(*to)));
                lines.push("- proc 0 executeRaw 4".into());
                if *admit {
                    lines.push("# addInputToCorpus Source: 1".into());
                }
            }
            Step::Minimize { from, attempts, to } => {
                lines.push("# Minimize".into());
                lines.extend(block(&sig(*from)));
                lines.push("# Minimize Attempt".into());
                for attempt in attempts {
                    lines.extend(block(&sig(*attempt)));
                    lines.push("- proc 0 executeRaw 1".into());
                }
                lines.push("# Minimize Final".into());
                lines.extend(block(&sig(*to)));
            }
            Step::Coverage(address) => lines.push(format!("= {:x}", address)),
            Step::Garbage => lines.push("= zz-not-hex".into()),
        }
    }
    lines
}

pub fn step_strategy() -> impl Strategy<Value = Step> {
    let n = 0u8..24;
    prop_oneof![
        n.clone().prop_map(Step::Generate),
        (n.clone(), n.clone(), any::<bool>()).prop_map(|(from, to, admit)| Step::Mutate {
            from,
            to,
            admit
        }),
        (n.clone(), prop::collection::vec(n.clone(), 0..3), n)
            .prop_map(|(from, attempts, to)| Step::Minimize { from, attempts, to }),
        any::<u16>().prop_map(Step::Coverage),
        Just(Step::Garbage),
    ]
}

pub fn log_strategy() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(step_strategy(), 0..60)
}
