//! Frequency-weighted spelling correction over a `ChainedTable` corpus.
//!
//! A query is checked against the corpus verbatim first. Otherwise every
//! corpus entry is scored by edit distance and offered to a bounded
//! leaderboard; the scan may stop early once every held candidate is close
//! enough and enough entries have been seen.
//!
//! All per-query state lives in a `Scan` that is created for the query and
//! consumed by it, so queries never observe each other's counters.

use crate::chained_table::ChainedTable;
use crate::distance::{bounded_edit_distance, edit_distance};
use crate::dynamic_array::{DynamicArray, SearchOutcome};
use core::cmp::Ordering;
use core::hash::BuildHasher;
use core::ops::ControlFlow;
use log::{debug, trace};

/// Corpus value type: how many times a word was seen.
pub type Frequency = u32;

/// A scored corpus word. `word` borrows from the table the board was built
/// against.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Candidate<'t> {
    pub word: &'t str,
    pub distance: usize,
    pub frequency: Frequency,
}

impl Candidate<'_> {
    /// Strictly closer, or equally close and strictly more frequent.
    pub fn outranks(&self, other: &Candidate<'_>) -> bool {
        self.distance < other.distance
            || (self.distance == other.distance && self.frequency > other.frequency)
    }
}

/// Ascending distance, then descending frequency, then word.
pub fn rank_order(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| b.frequency.cmp(&a.frequency))
        .then_with(|| a.word.cmp(b.word))
}

fn by_word(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.word.cmp(b.word)
}

/// Ranker tunables.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RankerConfig {
    /// Leaderboard size.
    pub capacity: usize,
    /// Every held candidate must be at most this far for the scan to stop.
    pub prune_distance: usize,
    /// Entries that must be visited before the scan may stop.
    pub prune_after: usize,
    pub early_stop: bool,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            prune_distance: 3,
            prune_after: 200,
            early_stop: true,
        }
    }
}

impl RankerConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "leaderboard capacity must be > 0");
        self.capacity = capacity;
        self
    }

    pub fn with_prune_distance(mut self, distance: usize) -> Self {
        self.prune_distance = distance;
        self
    }

    pub fn with_prune_after(mut self, visited: usize) -> Self {
        self.prune_after = visited;
        self
    }

    pub fn with_early_stop(mut self, enabled: bool) -> Self {
        self.early_stop = enabled;
        self
    }
}

/// Outcome of [`Ranker::correct`].
#[derive(Debug)]
pub enum Correction<'t> {
    /// The query is a corpus word.
    Correct { frequency: Frequency },
    Suggestions(Leaderboard<'t>),
}

/// Ranked candidates for one query, most likely first.
#[derive(Debug)]
pub struct Leaderboard<'t> {
    board: DynamicArray<Candidate<'t>>,
    visited: usize,
    stopped_early: bool,
}

impl<'t> Leaderboard<'t> {
    pub fn candidates(&self) -> &[Candidate<'t>] {
        self.board.as_slice()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Candidate<'t>> {
        self.board.iter()
    }

    pub fn best(&self) -> Option<&Candidate<'t>> {
        self.board.get(0)
    }

    pub fn words(&self) -> Vec<&'t str> {
        self.board.iter().map(|c| c.word).collect()
    }

    pub fn len(&self) -> usize {
        self.board.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }

    /// Corpus entries scored before the scan ended.
    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }

    pub fn into_inner(self) -> DynamicArray<Candidate<'t>> {
        self.board
    }
}

#[derive(Clone, Debug, Default)]
pub struct Ranker {
    config: RankerConfig,
}

impl Ranker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// `Correct` if `query` is a corpus key, otherwise ranked suggestions.
    pub fn correct<'t, S>(
        &self,
        corpus: &'t ChainedTable<Frequency, S>,
        query: &str,
    ) -> Correction<'t>
    where
        S: BuildHasher,
    {
        match corpus.get(query) {
            Some(&frequency) => Correction::Correct { frequency },
            None => Correction::Suggestions(self.rank(corpus, query)),
        }
    }

    /// Scan the corpus and rank candidates for `query` unconditionally.
    pub fn rank<'t, S>(
        &self,
        corpus: &'t ChainedTable<Frequency, S>,
        query: &str,
    ) -> Leaderboard<'t> {
        let mut scan = Scan::new(&self.config, query);
        // A break only means the scan pruned; the board is complete either way.
        let _ = corpus.try_for_each(|word, &frequency| scan.visit(word, frequency));
        scan.finish()
    }
}

struct Scan<'t, 'q> {
    config: &'q RankerConfig,
    query: &'q str,
    board: DynamicArray<Candidate<'t>>,
    visited: usize,
    stopped: bool,
}

impl<'t, 'q> Scan<'t, 'q> {
    fn new(config: &'q RankerConfig, query: &'q str) -> Self {
        Self {
            config,
            query,
            board: DynamicArray::with_capacity(config.capacity),
            visited: 0,
            stopped: false,
        }
    }

    fn is_full(&self) -> bool {
        self.board.len() >= self.config.capacity
    }

    fn visit(&mut self, word: &'t str, frequency: Frequency) -> ControlFlow<()> {
        self.visited += 1;
        self.offer(word, frequency);
        if self.should_stop() {
            self.stopped = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn offer(&mut self, word: &'t str, frequency: Frequency) {
        if !self.is_full() {
            let candidate = Candidate {
                word,
                distance: edit_distance(self.query, word),
                frequency,
            };
            if let Ok(SearchOutcome::NotFound) = self.board.search(&candidate, by_word, 0, false) {
                self.board.append(candidate);
            }
            return;
        }

        // Nothing farther than the current worst can displace a held candidate.
        let worst = self.board.iter().map(|c| c.distance).max().unwrap_or(0);
        let Some(distance) = bounded_edit_distance(self.query, word, worst) else {
            return;
        };
        let candidate = Candidate {
            word,
            distance,
            frequency,
        };
        if let Some(slot) = self.board.iter().position(|held| candidate.outranks(held)) {
            trace!(
                "{:?} displaces {:?} at slot {slot}",
                candidate.word,
                self.board[slot].word
            );
            self.board[slot] = candidate;
        }
    }

    fn should_stop(&self) -> bool {
        self.config.early_stop
            && self.visited >= self.config.prune_after
            && self.is_full()
            && self
                .board
                .iter()
                .all(|c| c.distance <= self.config.prune_distance)
    }

    fn finish(mut self) -> Leaderboard<'t> {
        self.board.sort(rank_order);
        debug!(
            "ranked {:?}: visited {} entries, early stop: {}, {} candidates",
            self.query,
            self.visited,
            self.stopped,
            self.board.len()
        );
        Leaderboard {
            board: self.board,
            visited: self.visited,
            stopped_early: self.stopped,
        }
    }
}
