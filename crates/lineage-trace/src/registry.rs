use std::collections::{BTreeMap, HashMap};

use lineage_core::ProgramId;
use log::debug;

use crate::program::{Origin, Program};
use crate::stats::ParseStats;
use crate::work::WorkSample;

/// Arena of every program observed in one trace plus its lookup indices.
///
/// Programs are created once per signature and referenced by id thereafter.
/// Relation helpers keep `parent` and the parent's `children` /
/// `minimize_attempts` lists in step: an edge is recorded on both sides or
/// on neither.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    programs: Vec<Program>,
    index: HashMap<String, ProgramId>,
    generated: Vec<ProgramId>,
    corpus: BTreeMap<String, ProgramId>,
    triage: BTreeMap<String, ProgramId>,
    stats: ParseStats,
    work: Vec<WorkSample>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        programs: Vec<Program>,
        generated: Vec<ProgramId>,
        corpus: BTreeMap<String, ProgramId>,
        triage: BTreeMap<String, ProgramId>,
        stats: ParseStats,
        work: Vec<WorkSample>,
    ) -> Self {
        let index = programs
            .iter()
            .map(|program| (program.signature.clone(), program.id))
            .collect();
        Self {
            programs,
            index,
            generated,
            corpus,
            triage,
            stats,
            work,
        }
    }

    /// Number of distinct programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Returns whether no program was recorded.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// All programs in first-seen order.
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Returns the program with the given id.
    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.get(id.index())
    }

    pub(crate) fn program_mut(&mut self, id: ProgramId) -> Option<&mut Program> {
        self.programs.get_mut(id.index())
    }

    /// Resolves a signature to its program id.
    pub fn lookup(&self, signature: &str) -> Option<ProgramId> {
        self.index.get(signature).copied()
    }

    /// Generated program ids, one entry per generate block.
    pub fn generated(&self) -> &[ProgramId] {
        &self.generated
    }

    /// Corpus members keyed by signature.
    pub fn corpus(&self) -> &BTreeMap<String, ProgramId> {
        &self.corpus
    }

    /// Minimization sources keyed by signature.
    pub fn triage(&self) -> &BTreeMap<String, ProgramId> {
        &self.triage
    }

    /// Anomaly and volume counters collected while parsing.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ParseStats {
        &mut self.stats
    }

    /// Cumulative work counters sampled at every timestamp.
    pub fn work(&self) -> &[WorkSample] {
        &self.work
    }

    pub(crate) fn push_work(&mut self, sample: WorkSample) {
        self.work.push(sample);
    }

    /// Returns the program for `signature`, creating it if unseen.
    ///
    /// The boolean is true when a new record was created.
    pub fn intern(&mut self, signature: &str, timestamp: f64) -> (ProgramId, bool) {
        if let Some(id) = self.index.get(signature) {
            return (*id, false);
        }
        let id = ProgramId::from_index(self.programs.len());
        self.programs.push(Program::new(id, signature, timestamp));
        self.index.insert(signature.to_owned(), id);
        (id, true)
    }

    /// Interns a program that is referenced without being run.
    pub fn intern_reference(&mut self, signature: &str, timestamp: f64) -> ProgramId {
        let (id, created) = self.intern(signature, timestamp);
        if created {
            self.programs[id.index()].executed = false;
        }
        id
    }

    /// Tags a generated program and appends it to the generated index.
    pub fn mark_generated(&mut self, id: ProgramId) {
        if let Some(program) = self.program_mut(id) {
            program.tag_origin(Origin::Generate);
            self.generated.push(id);
        }
    }

    /// Resolves the source of a minimization, reusing an earlier triage of
    /// the same signature.
    pub fn register_triage(&mut self, signature: &str, timestamp: f64) -> ProgramId {
        if let Some(id) = self.triage.get(signature) {
            return *id;
        }
        let id = self.intern_reference(signature, timestamp);
        self.triage.insert(signature.to_owned(), id);
        id
    }

    /// Resolves a mutation source through the corpus index.
    ///
    /// Returns the id and whether the signature was a corpus member. A
    /// non-member is interned as a placeholder but not added to the index.
    pub fn resolve_mutation_source(&mut self, signature: &str, timestamp: f64) -> (ProgramId, bool) {
        if let Some(id) = self.corpus.get(signature) {
            return (*id, true);
        }
        (self.intern_reference(signature, timestamp), false)
    }

    /// Admits a program to the corpus. The first admission of a signature
    /// keeps its index entry and its source.
    pub fn admit_to_corpus(&mut self, id: ProgramId, source: Option<Origin>) {
        let Some(program) = self.programs.get_mut(id.index()) else {
            return;
        };
        program.admit(source);
        self.corpus
            .entry(program.signature.clone())
            .or_insert(program.id);
    }

    /// Links `child` as a mutation of `parent`.
    pub fn link_mutation(&mut self, parent: ProgramId, child: ProgramId) -> bool {
        if !self.attach(parent, child, Origin::Mutate) {
            return false;
        }
        push_unique(&mut self.programs[parent.index()].children, child);
        true
    }

    /// Links `child` as an intermediate minimization candidate of `parent`.
    pub fn link_minimize_attempt(&mut self, parent: ProgramId, child: ProgramId) -> bool {
        if !self.attach(parent, child, Origin::Minimize) {
            return false;
        }
        push_unique(&mut self.programs[parent.index()].minimize_attempts, child);
        true
    }

    /// Links `child` as the final minimized replacement of `parent`.
    ///
    /// A later minimization of the same source replaces the target; the
    /// superseded one is kept among the attempts.
    pub fn link_minimize_target(&mut self, parent: ProgramId, child: ProgramId) -> bool {
        if !self.attach(parent, child, Origin::Minimize) {
            return false;
        }
        let source = &mut self.programs[parent.index()];
        if let Some(previous) = source.minimize_target.replace(child) {
            if previous != child {
                push_unique(&mut source.minimize_attempts, previous);
            }
        }
        true
    }

    /// Tags the child's origin and sets its parent pointer.
    ///
    /// Fails for self links, unknown ids, and children already derived from
    /// a different program.
    fn attach(&mut self, parent: ProgramId, child: ProgramId, origin: Origin) -> bool {
        if parent == child {
            self.stats.self_links += 1;
            debug!("ignoring self link on {child}");
            return false;
        }
        if parent.index() >= self.programs.len() {
            return false;
        }
        let Some(program) = self.programs.get_mut(child.index()) else {
            return false;
        };
        program.tag_origin(origin);
        match program.parent {
            None => {
                program.parent = Some(parent);
                true
            }
            Some(existing) if existing == parent => true,
            Some(existing) => {
                self.stats.reparent_attempts += 1;
                debug!("{child} already derived from {existing}, keeping it over {parent}");
                false
            }
        }
    }
}

fn push_unique(list: &mut Vec<ProgramId>, id: ProgramId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedups_by_signature() {
        let mut registry = Registry::new();
        let (a, created_a) = registry.intern("A", 0.0);
        let (again, created_again) = registry.intern("A", 5.0);
        assert!(created_a);
        assert!(!created_again);
        assert_eq!(a, again);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.program(a).unwrap().timestamp, 0.0);
    }

    #[test]
    fn parent_is_never_overwritten() {
        let mut registry = Registry::new();
        let (a, _) = registry.intern("A", 0.0);
        let (b, _) = registry.intern("B", 0.0);
        let (c, _) = registry.intern("C", 0.0);
        assert!(registry.link_mutation(a, c));
        assert!(!registry.link_mutation(b, c));
        assert_eq!(registry.program(c).unwrap().parent, Some(a));
        assert!(registry.program(b).unwrap().children.is_empty());
        assert_eq!(registry.stats().reparent_attempts, 1);
    }

    #[test]
    fn superseded_target_becomes_an_attempt() {
        let mut registry = Registry::new();
        let (a, _) = registry.intern("A", 0.0);
        let (b, _) = registry.intern("B", 0.0);
        let (c, _) = registry.intern("C", 0.0);
        assert!(registry.link_minimize_target(a, b));
        assert!(registry.link_minimize_target(a, c));
        let source = registry.program(a).unwrap();
        assert_eq!(source.minimize_target, Some(c));
        assert_eq!(source.minimize_attempts, vec![b]);
    }

    #[test]
    fn self_links_are_counted_not_recorded() {
        let mut registry = Registry::new();
        let (a, _) = registry.intern("A", 0.0);
        assert!(!registry.link_minimize_target(a, a));
        assert_eq!(registry.program(a).unwrap().minimize_target, None);
        assert_eq!(registry.stats().self_links, 1);
    }
}
