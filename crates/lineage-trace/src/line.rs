use crate::phase::Phase;

/// Which coverage database a coverage line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageScope {
    /// `= <addr>`: new relative to everything executed so far.
    Global,
    /// `+ <addr>`: new relative to the corpus baseline.
    Corpus,
}

/// Recognized `#` comment lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comment<'a> {
    /// Phase marker.
    Phase(Phase),
    /// `# Result: <csv>`; `None` when the line is truncated or non-numeric,
    /// otherwise whether triage kept the program.
    TriageResult(Option<bool>),
    /// Corpus admission carrying the raw `Source:` code, if parseable.
    CorpusAdmission(Option<u8>),
    /// Any other comment.
    Other(&'a str),
}

/// One classified trace line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLine<'a> {
    /// Empty after trimming.
    Blank,
    /// `<<<ns>>>` absolute timestamp.
    Timestamp(u64),
    /// Execution marker with the reported call count.
    Execute(Option<usize>),
    /// Coverage event; `None` when the address is not valid hex.
    Coverage(CoverageScope, Option<u64>),
    /// `#` comment.
    Comment(Comment<'a>),
    /// `>` or `>>>SIG`; carries the inline signature if present.
    BlockOpen(Option<&'a str>),
    /// `<` or `<<<`.
    BlockClose,
    /// Anything else; a call line when inside a block.
    Body(&'a str),
    /// A recognized line whose payload could not be parsed.
    Malformed(&'a str),
}

/// Classifies a single raw line. Dispatch is by prefix, in the order the
/// fuzzer's log format makes unambiguous.
pub fn classify(raw: &str) -> TraceLine<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return TraceLine::Blank;
    }
    if line.len() > 6 && line.starts_with("<<<") && line.ends_with(">>>") {
        return match line[3..line.len() - 3].trim().parse::<u64>() {
            Ok(ts) => TraceLine::Timestamp(ts),
            Err(_) => TraceLine::Malformed(line),
        };
    }
    if line.starts_with("- ") && line.contains("executeRaw") {
        let calls = line
            .split_whitespace()
            .last()
            .and_then(|token| token.parse::<usize>().ok());
        return TraceLine::Execute(calls);
    }
    if let Some(rest) = line.strip_prefix("+ ") {
        return TraceLine::Coverage(CoverageScope::Corpus, parse_address(rest));
    }
    if let Some(rest) = line.strip_prefix("= ") {
        return TraceLine::Coverage(CoverageScope::Global, parse_address(rest));
    }
    if line.starts_with('#') {
        return TraceLine::Comment(classify_comment(line));
    }
    if line == ">" {
        return TraceLine::BlockOpen(None);
    }
    if let Some(signature) = line.strip_prefix(">>>") {
        let signature = signature.trim();
        return TraceLine::BlockOpen((!signature.is_empty()).then_some(signature));
    }
    if line == "<" || line == "<<<" {
        return TraceLine::BlockClose;
    }
    TraceLine::Body(line.strip_prefix("> ").unwrap_or(line))
}

fn parse_address(rest: &str) -> Option<u64> {
    let token = rest.split_whitespace().next()?;
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).ok()
}

fn classify_comment(line: &str) -> Comment<'_> {
    if line.contains("Generate") {
        Comment::Phase(Phase::Generate)
    } else if line.ends_with("Minimize") {
        Comment::Phase(Phase::MinimizeFrom)
    } else if line.contains("Minimize Attempt") {
        Comment::Phase(Phase::MinimizeAttempt)
    } else if line.contains("Minimize Final") {
        Comment::Phase(Phase::MinimizeTo)
    } else if let Some((_, fields)) = line.split_once("# Result:") {
        Comment::TriageResult(parse_triage_result(fields))
    } else if line.contains("Mutate") {
        Comment::Phase(Phase::MutateFrom)
    } else if line.contains("addInputToCorpus") {
        let source = line
            .split_once("Source: ")
            .and_then(|(_, code)| code.trim().parse::<u8>().ok());
        Comment::CorpusAdmission(source)
    } else {
        Comment::Other(line)
    }
}

fn parse_triage_result(fields: &str) -> Option<bool> {
    let kept = fields.split(',').nth(2)?.trim().parse::<i64>().ok()?;
    Some(kept > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_and_blocks() {
        assert_eq!(classify("<<<1500>>>"), TraceLine::Timestamp(1500));
        assert_eq!(classify("<<<"), TraceLine::BlockClose);
        assert_eq!(classify("<"), TraceLine::BlockClose);
        assert_eq!(classify(">"), TraceLine::BlockOpen(None));
        assert_eq!(classify(">>>abc"), TraceLine::BlockOpen(Some("abc")));
        assert_eq!(classify(">>>"), TraceLine::BlockOpen(None));
        assert_eq!(classify("<<<12x>>>"), TraceLine::Malformed("<<<12x>>>"));
    }

    #[test]
    fn coverage_addresses() {
        assert_eq!(
            classify("= 0x1000"),
            TraceLine::Coverage(CoverageScope::Global, Some(0x1000))
        );
        assert_eq!(
            classify("+ ffffffff81000000"),
            TraceLine::Coverage(CoverageScope::Corpus, Some(0xffff_ffff_8100_0000))
        );
        assert_eq!(
            classify("= notahex"),
            TraceLine::Coverage(CoverageScope::Global, None)
        );
    }

    #[test]
    fn execution_counts() {
        assert_eq!(classify("- proc 1 executeRaw calls 3"), TraceLine::Execute(Some(3)));
        assert_eq!(classify("- executeRaw n/a"), TraceLine::Execute(None));
        assert_eq!(classify("- something else 3"), TraceLine::Body("- something else 3"));
    }

    #[test]
    fn comment_dispatch() {
        assert_eq!(
            classify("# Generate"),
            TraceLine::Comment(Comment::Phase(Phase::Generate))
        );
        assert_eq!(
            classify("# Minimize"),
            TraceLine::Comment(Comment::Phase(Phase::MinimizeFrom))
        );
        assert_eq!(
            classify("# Minimize Attempt"),
            TraceLine::Comment(Comment::Phase(Phase::MinimizeAttempt))
        );
        assert_eq!(
            classify("# Minimize Final"),
            TraceLine::Comment(Comment::Phase(Phase::MinimizeTo))
        );
        assert_eq!(
            classify("# Mutate"),
            TraceLine::Comment(Comment::Phase(Phase::MutateFrom))
        );
        assert_eq!(
            classify("# Result: 3,1,2"),
            TraceLine::Comment(Comment::TriageResult(Some(true)))
        );
        assert_eq!(
            classify("# Result: 3,1"),
            TraceLine::Comment(Comment::TriageResult(None))
        );
        assert_eq!(
            classify("# addInputToCorpus Source: 1"),
            TraceLine::Comment(Comment::CorpusAdmission(Some(1)))
        );
        assert_eq!(
            classify("# Minimize Success"),
            TraceLine::Comment(Comment::Other("# Minimize Success"))
        );
    }
}
