use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use lineage_core::{LineageError, ProgramId};
use log::{debug, info, warn};

use crate::config::ParserConfig;
use crate::line::{classify, Comment, CoverageScope, TraceLine};
use crate::phase::Phase;
use crate::program::Origin;
use crate::registry::Registry;
use crate::work::{WorkCounters, WorkSample};

/// Program body being accumulated between block delimiters.
#[derive(Debug, Default)]
struct Block {
    signature: Option<String>,
    body: String,
}

impl Block {
    fn into_signature(self) -> String {
        match self.signature {
            Some(signature) => signature,
            None => self.body,
        }
    }
}

#[derive(Debug, Default)]
struct Clock {
    begin: Option<u64>,
    now: u64,
}

impl Clock {
    fn tick(&mut self, ts: u64) {
        self.begin.get_or_insert(ts);
        self.now = ts;
    }

    fn delta(&self) -> u64 {
        self.begin.map_or(0, |begin| self.now.saturating_sub(begin))
    }
}

/// Line-at-a-time state machine building a [`Registry`].
///
/// The parser owns everything it needs between lines: the current phase,
/// the open block, the program most recently closed (`current`, which
/// receives execution and coverage lines) and the source of the running
/// mutation or minimization (`source`).
#[derive(Debug)]
pub struct TraceParser {
    config: ParserConfig,
    registry: Registry,
    phase: Phase,
    block: Option<Block>,
    current: Option<ProgramId>,
    source: Option<ProgramId>,
    clock: Clock,
    coverage_seen: HashSet<u64>,
    corpus_coverage_seen: HashSet<u64>,
    counters: WorkCounters,
}

impl TraceParser {
    /// Creates a parser with an empty registry.
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            phase: Phase::Idle,
            block: None,
            current: None,
            source: None,
            clock: Clock::default(),
            coverage_seen: HashSet::new(),
            corpus_coverage_seen: HashSet::new(),
            counters: WorkCounters::default(),
        }
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Registry built so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Consumes one raw line.
    pub fn feed(&mut self, raw: &str) {
        let line = classify(raw);
        if line == TraceLine::Blank {
            return;
        }
        self.registry.stats_mut().lines += 1;
        match line {
            TraceLine::Blank => {}
            TraceLine::Timestamp(ts) => self.on_timestamp(ts),
            TraceLine::Execute(calls) => self.on_execute(calls),
            TraceLine::Coverage(scope, address) => self.on_coverage(scope, address),
            TraceLine::Comment(comment) => self.on_comment(comment),
            TraceLine::BlockOpen(signature) => self.on_open(signature),
            TraceLine::BlockClose => self.on_close(),
            TraceLine::Body(text) => self.push_body(text),
            TraceLine::Malformed(text) => self.malformed(text),
        }
    }

    /// Ends the pass and returns the registry. A block still open at this
    /// point is dropped.
    pub fn finish(mut self) -> Registry {
        if self.block.take().is_some() {
            self.registry.stats_mut().unterminated_blocks += 1;
            debug!("dropping program block left open at end of trace");
        }
        let last = self.registry.work().last().map(|sample| sample.counters);
        if last.map_or(self.counters.executions > 0, |counters| counters != self.counters) {
            self.snapshot();
        }
        let stats = self.registry.stats();
        info!(
            "parsed {} lines: {} programs, {} generated, {} in corpus, {} anomalies",
            stats.lines,
            self.registry.len(),
            self.registry.generated().len(),
            self.registry.corpus().len(),
            stats.anomalies()
        );
        self.registry
    }

    fn elapsed(&self) -> f64 {
        self.config.seconds(self.clock.delta())
    }

    fn snapshot(&mut self) {
        let sample = WorkSample {
            elapsed: self.elapsed(),
            counters: self.counters,
        };
        self.registry.push_work(sample);
    }

    fn malformed(&mut self, text: &str) {
        self.registry.stats_mut().malformed_lines += 1;
        debug!("skipping malformed line: {text}");
    }

    fn on_timestamp(&mut self, ts: u64) {
        self.clock.tick(ts);
        self.snapshot();
    }

    fn on_execute(&mut self, calls: Option<usize>) {
        self.registry.stats_mut().executions += 1;
        self.counters.record_execution(self.phase.activity());
        let Some(id) = self.current else {
            return;
        };
        if let Some(program) = self.registry.program_mut(id) {
            program.executed = true;
            if let Some(calls) = calls {
                program.size = calls;
            }
        }
        if calls.is_none() {
            self.malformed("execution line without a call count");
        }
    }

    fn on_coverage(&mut self, scope: CoverageScope, address: Option<u64>) {
        let Some(address) = address else {
            self.malformed("coverage address is not hex");
            return;
        };
        if !self.config.accepts_address(address) {
            self.registry.stats_mut().filtered_addresses += 1;
            return;
        }
        let fresh = match scope {
            CoverageScope::Global => self.coverage_seen.insert(address),
            CoverageScope::Corpus => self.corpus_coverage_seen.insert(address),
        };
        if !fresh {
            return;
        }
        if scope == CoverageScope::Global {
            self.counters.record_coverage(self.phase.activity());
        }
        let Some(program) = self.current.and_then(|id| self.registry.program_mut(id)) else {
            return;
        };
        match scope {
            CoverageScope::Global => program.coverage.insert(address),
            CoverageScope::Corpus => program.coverage_corpus.insert(address),
        };
    }

    fn on_comment(&mut self, comment: Comment<'_>) {
        match comment {
            Comment::Phase(phase) => self.phase = phase,
            Comment::TriageResult(Some(kept)) => {
                let stats = self.registry.stats_mut();
                stats.triage_total += 1;
                if !kept {
                    stats.triage_failed += 1;
                }
            }
            Comment::TriageResult(None) => self.malformed("truncated triage result"),
            Comment::CorpusAdmission(code) => self.on_admission(code),
            Comment::Other(_) => {}
        }
    }

    fn on_admission(&mut self, code: Option<u8>) {
        let Some(id) = self.current else {
            self.registry.stats_mut().orphan_admissions += 1;
            warn!("corpus admission without a preceding program");
            return;
        };
        let source = code.and_then(Origin::from_source_code);
        if source.is_none() {
            self.malformed("corpus admission with an unknown source");
        }
        self.registry.admit_to_corpus(id, source);
    }

    fn push_body(&mut self, text: &str) {
        if let Some(block) = self.block.as_mut() {
            block.body.push_str(text);
            block.body.push('\n');
        }
    }

    fn on_open(&mut self, signature: Option<&str>) {
        if self.block.is_some() {
            // Verbose bodies end with a bare "> " continuation line; it adds
            // nothing to the body so that the signature stays the same.
            if signature.is_some() {
                self.malformed("block opened inside a block");
            }
            return;
        }
        self.block = Some(Block {
            signature: signature.map(str::to_owned),
            body: String::new(),
        });
    }

    fn on_close(&mut self) {
        let Some(block) = self.block.take() else {
            self.malformed("block closed without being opened");
            return;
        };
        let signature = block.into_signature();
        if signature.is_empty() {
            self.malformed("empty program block");
            return;
        }
        self.registry.stats_mut().blocks += 1;
        let timestamp = self.elapsed();
        match self.phase {
            Phase::Idle => self.close_unmarked(&signature, timestamp),
            Phase::Generate => self.close_generate(&signature, timestamp),
            Phase::MinimizeFrom => self.close_minimize_from(&signature, timestamp),
            Phase::MinimizeAttempt => self.close_minimize_attempt(&signature, timestamp),
            Phase::MinimizeTo => self.close_minimize_to(&signature, timestamp),
            Phase::MutateFrom => self.close_mutate_from(&signature, timestamp),
            Phase::MutateTo => self.close_mutate_to(&signature, timestamp),
        }
        self.phase = self.phase.after_close();
    }

    fn close_unmarked(&mut self, signature: &str, timestamp: f64) {
        let (id, _) = self.registry.intern(signature, timestamp);
        self.current = Some(id);
    }

    fn close_generate(&mut self, signature: &str, timestamp: f64) {
        let (id, _) = self.registry.intern(signature, timestamp);
        self.registry.mark_generated(id);
        self.current = Some(id);
    }

    fn close_minimize_from(&mut self, signature: &str, timestamp: f64) {
        let id = self.registry.register_triage(signature, timestamp);
        self.source = Some(id);
        self.current = Some(id);
    }

    fn close_minimize_attempt(&mut self, signature: &str, timestamp: f64) {
        let (id, _) = self.registry.intern(signature, timestamp);
        self.current = Some(id);
        match self.source {
            Some(source) => {
                self.registry.link_minimize_attempt(source, id);
            }
            None => self.orphan_minimize_step(id),
        }
    }

    fn close_minimize_to(&mut self, signature: &str, timestamp: f64) {
        let (id, created) = self.registry.intern(signature, timestamp);
        if created {
            if let Some(program) = self.registry.program_mut(id) {
                program.executed = false;
            }
        }
        self.current = Some(id);
        match self.source {
            Some(source) => {
                self.registry.link_minimize_target(source, id);
            }
            None => self.orphan_minimize_step(id),
        }
    }

    fn orphan_minimize_step(&mut self, id: ProgramId) {
        self.registry.stats_mut().orphan_minimize_steps += 1;
        warn!("minimization step {id} without a minimization source");
    }

    fn close_mutate_from(&mut self, signature: &str, timestamp: f64) {
        let (id, member) = self.registry.resolve_mutation_source(signature, timestamp);
        if !member {
            self.registry.stats_mut().orphan_mutations += 1;
            warn!("mutation source {id} is not a corpus member, using a placeholder");
        }
        self.source = Some(id);
        self.current = Some(id);
    }

    fn close_mutate_to(&mut self, signature: &str, timestamp: f64) {
        let (id, _) = self.registry.intern(signature, timestamp);
        self.current = Some(id);
        if let Some(source) = self.source {
            self.registry.link_mutation(source, id);
        }
    }
}

/// Parses an in-memory sequence of lines.
pub fn parse_lines<I, S>(lines: I, config: &ParserConfig) -> Registry
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = TraceParser::new(config.clone());
    for line in lines {
        parser.feed(line.as_ref());
    }
    parser.finish()
}

/// Parses a whole log held in a string.
pub fn parse_str(text: &str, config: &ParserConfig) -> Registry {
    parse_lines(text.lines(), config)
}

/// Parses a log from a buffered reader. Lines that are not valid UTF-8 are
/// decoded lossily.
pub fn parse_reader<R: BufRead>(mut reader: R, config: &ParserConfig) -> Result<Registry, LineageError> {
    let mut parser = TraceParser::new(config.clone());
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|err| LineageError::io("read-trace", err))?;
        if read == 0 {
            break;
        }
        parser.feed(&String::from_utf8_lossy(&buffer));
    }
    Ok(parser.finish())
}

/// Parses the log at `path`.
///
/// A missing file is not an error: it yields `Ok(None)` so callers can tell
/// "no data for this run" apart from a failure.
pub fn load_trace(path: &Path, config: &ParserConfig) -> Result<Option<Registry>, LineageError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!("no trace at {}, treating as empty", path.display());
            return Ok(None);
        }
        Err(err) => {
            return Err(LineageError::io("open-trace", err).with_context("path", path.display()))
        }
    };
    parse_reader(BufReader::new(file), config)
        .map(Some)
        .map_err(|err| err.with_context("path", path.display()))
}
