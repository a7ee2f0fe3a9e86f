// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier and the host scope.
//
// Frontier: a breadth-first queue of page URLs plus the set of pages we've
// already taken off it. A URL is marked visited the moment it's popped,
// whether or not the fetch works, so no page is ever fetched twice and a
// page linking to itself can't loop forever.
//
// HostScope: which hosts we're allowed to crawl. Built from the start URLs,
// never changed during the crawl.
//
// Rust concepts:
// - VecDeque: push_back() + pop_front() = FIFO = breadth-first
// - HashSet::insert() returns false if the value was already there, which
//   gives us check-and-mark in one call
// =============================================================================

use std::collections::{HashSet, VecDeque};

use crate::extract::url::host_of;

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new<I: IntoIterator<Item = String>>(start_urls: I) -> Self {
        Self {
            queue: start_urls.into_iter().collect(),
            visited: HashSet::new(),
        }
    }

    /// Queues a URL unless it has already been visited.
    ///
    /// The same URL may sit in the queue twice (found on two pages before
    /// either was crawled); pop_unvisited() drops the second copy.
    pub fn push(&mut self, url: String) -> bool {
        if self.visited.contains(&url) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Next page that hasn't been visited yet, now marked as visited.
    pub fn pop_unvisited(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

#[derive(Debug, Clone)]
pub struct HostScope {
    allowed: HashSet<String>,
    cross_domain: bool,
}

impl HostScope {
    pub fn new(allowed: HashSet<String>, cross_domain: bool) -> Self {
        Self {
            allowed,
            cross_domain,
        }
    }

    pub fn allows(&self, url: &str) -> bool {
        if self.cross_domain {
            return true;
        }
        host_of(url).map_or(false, |host| self.allowed.contains(&host))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why mark pages visited on pop instead of on push?
//    - A page can be discovered from many places before we reach it
//    - Marking on pop means the first copy in the queue wins and later
//      copies are simply thrown away
//
// 2. What is map_or?
//    - Option::map_or(default, f) returns default for None, f(value) for Some
//    - host_of() returns None for unparseable URLs, which we never allow
//
// 3. Why is the scope a separate struct?
//    - The frontier doesn't care about hosts; the crawl loop asks the scope
//      before fetching a page and before queueing a link
// -----------------------------------------------------------------------------
