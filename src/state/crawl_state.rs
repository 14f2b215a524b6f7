use crate::crawler::{Frontier, FrontierEntry};
use crate::state::PageStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag shared between a crawl and its host
///
/// Cancelling never interrupts a fetch already in flight; it only stops new
/// work from being drawn from the frontier.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one crawl invocation tracks about its own progress
///
/// Created fresh by every call to `crawl` and owned by the coordinator loop
/// alone; workers never touch it.
#[derive(Debug)]
pub struct CrawlState {
    frontier: Frontier,
    cancel: CancelFlag,
    pages_completed: usize,
    skipped: usize,
    errors: usize,
    last_progress: Instant,
}

impl CrawlState {
    pub fn new(frontier: Frontier, cancel: CancelFlag) -> Self {
        Self {
            frontier,
            cancel,
            pages_completed: 0,
            skipped: 0,
            errors: 0,
            last_progress: Instant::now(),
        }
    }

    /// Offers an entry to the frontier against the current page count
    pub fn offer(&mut self, entry: FrontierEntry) -> bool {
        self.frontier.offer(entry, self.pages_completed)
    }

    /// Draws the next frontier entry
    pub fn next(&mut self) -> Option<FrontierEntry> {
        self.frontier.next()
    }

    /// Counts one finished page; a success also resets the idle clock
    pub fn record(&mut self, status: PageStatus) {
        match status {
            PageStatus::Success => {
                self.pages_completed += 1;
                self.last_progress = Instant::now();
            }
            PageStatus::Skipped => self.skipped += 1,
            PageStatus::Error => self.errors += 1,
        }
    }

    /// Returns true once the successful page count has hit the ceiling
    pub fn ceiling_reached(&self) -> bool {
        self.frontier.ceiling_reached(self.pages_completed)
    }

    /// Time elapsed since the page count last increased
    pub fn idle_for(&self) -> Duration {
        self.last_progress.elapsed()
    }

    /// Restarts the idle clock without counting a page
    ///
    /// Called once seeding is done so landing-page probes do not eat into
    /// the first page's window.
    pub fn reset_idle_clock(&mut self) {
        self.last_progress = Instant::now();
    }

    /// Removes `paused` from the idle time, e.g. the polite delay
    pub fn exclude_from_idle(&mut self, paused: Duration) {
        let shifted = self
            .last_progress
            .checked_add(paused)
            .unwrap_or_else(Instant::now);
        self.last_progress = shifted.min(Instant::now());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn pages_completed(&self) -> usize {
        self.pages_completed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn errors(&self) -> usize {
        self.errors
    }
}
