//! Frontier and dedup tracker
//!
//! This module handles:
//! - Exactly-once acceptance of canonical URLs (the visited set)
//! - Depth and page-count ceilings at acceptance time
//! - Draw ordering: seeds first, then sorted (sequential) or FIFO (concurrent)

use crate::crawler::decider::Attempt;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use url::Url;

/// Priority class of a frontier entry (lower is drawn first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Seed URL or probed landing page
    Seed = 0,
    /// URL discovered by following links
    Discovered = 1,
}

/// How entries of the same priority class are drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOrder {
    /// Lexicographic URL order, for reproducible sequential crawls
    Sorted,
    /// Insertion order (breadth-first), for the concurrent pool
    Fifo,
}

/// A URL awaiting processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Canonical URL, also the dedup key
    pub url: Url,

    /// Link-following distance from a seed
    pub depth: u32,

    /// Priority class
    pub priority: Priority,

    /// Which fetch attempt the decider should start with
    pub attempt: Attempt,
}

impl FrontierEntry {
    /// Creates a seed entry at depth 0
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            priority: Priority::Seed,
            attempt: Attempt::Initial,
        }
    }

    /// Creates an entry for a link discovered on a page at `parent_depth`
    pub fn discovered(url: Url, parent_depth: u32) -> Self {
        Self {
            url,
            depth: parent_depth + 1,
            priority: Priority::Discovered,
            attempt: Attempt::Initial,
        }
    }

    /// Marks the entry to be fetched through the rendering backend directly
    pub fn with_forced_render(mut self) -> Self {
        self.attempt = Attempt::ForcedRender;
        self
    }
}

/// Heap slot: ordering key plus the entry itself
#[derive(Debug)]
struct Queued {
    priority: Priority,
    seq: u64,
    entry: FrontierEntry,
}

// Lower (priority, seq, url) pops first from the max-heap
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
            .then_with(|| other.entry.url.as_str().cmp(self.entry.url.as_str()))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

/// The pending work queue and the visited set of one crawl invocation
///
/// A URL enters the visited set the moment it is accepted, not when it
/// completes, so no URL can be accepted twice even while its fetch is still
/// in flight.
#[derive(Debug)]
pub struct Frontier {
    queue: BinaryHeap<Queued>,
    visited: HashSet<String>,
    order: DrawOrder,
    max_depth: u32,
    max_pages: usize,
    next_seq: u64,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `order` - Draw order within a priority class
    /// * `max_depth` - Entries deeper than this are rejected
    /// * `max_pages` - Offers are rejected once this many pages have completed
    pub fn new(order: DrawOrder, max_depth: u32, max_pages: usize) -> Self {
        Self {
            queue: BinaryHeap::new(),
            visited: HashSet::new(),
            order,
            max_depth,
            max_pages,
            next_seq: 0,
        }
    }

    /// Offers an entry for acceptance
    ///
    /// # Arguments
    ///
    /// * `entry` - The candidate entry (URL already canonical and in scope)
    /// * `pages_completed` - Successful pages so far in this run
    ///
    /// # Returns
    ///
    /// `true` if the entry was accepted and queued; `false` if it was already
    /// seen, too deep, or the page ceiling has been reached
    pub fn offer(&mut self, entry: FrontierEntry, pages_completed: usize) -> bool {
        if entry.depth > self.max_depth {
            tracing::trace!("Depth {} exceeds max for {}", entry.depth, entry.url);
            return false;
        }

        if self.ceiling_reached(pages_completed) {
            return false;
        }

        if !self.visited.insert(entry.url.as_str().to_string()) {
            return false;
        }

        let seq = match self.order {
            DrawOrder::Sorted => 0,
            DrawOrder::Fifo => {
                self.next_seq += 1;
                self.next_seq
            }
        };

        self.queue.push(Queued {
            priority: entry.priority,
            seq,
            entry,
        });
        true
    }

    /// Draws the next entry, if any
    pub fn next(&mut self) -> Option<FrontierEntry> {
        self.queue.pop().map(|queued| queued.entry)
    }

    /// Returns true once `pages_completed` has reached the page ceiling
    pub fn ceiling_reached(&self, pages_completed: usize) -> bool {
        pages_completed >= self.max_pages
    }

    /// Returns true if the canonical URL has been accepted before
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Returns the number of URLs waiting to be drawn
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether nothing is waiting to be drawn
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of distinct URLs accepted so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
