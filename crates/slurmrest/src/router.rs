//! The HTTP-method-aware path router (spec §4.G): `register` assigns a
//! stable positive tag to a pattern; `find` resolves a split request path
//! against the registered patterns, capturing `{placeholder}` segments.

use std::collections::HashMap;
use std::sync::RwLock;

use slurmrest_core::{Dict, Value};

/// The HTTP methods the router distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

/// `tag == 0` means "no route matched"; real tags start at 1.
pub const UNREGISTERED_TAG: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

fn split_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Segment::Placeholder(name.to_string())
            } else {
                Segment::Literal(s.to_string())
            }
        })
        .collect()
}

/// Splits a request path into segments the same way a registered pattern
/// is split, so `find` can compare them position by position.
#[must_use]
pub fn split_request_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

struct Route {
    tag: u32,
    segments: Vec<Segment>,
}

/// A method-keyed table of registered route patterns.
///
/// Registration and lookup are both guarded by one `RwLock`: registration
/// happens at startup (single writer, per spec §5's concurrency model —
/// the route table is fixed once the server starts serving), while `find`
/// runs once per request from any number of concurrent worker tasks.
#[derive(Default)]
pub struct Router {
    routes: RwLock<HashMap<Method, Vec<Route>>>,
    by_pattern: RwLock<HashMap<(Method, String), u32>>,
    next_tag: RwLock<u32>,
}

impl Router {
    /// An empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pattern` under `method`, returning its tag. Re-registering
    /// the same `(method, pattern)` pair returns the same tag rather than
    /// creating a duplicate entry.
    pub fn register(&self, method: Method, pattern: &str) -> u32 {
        let key = (method, pattern.to_string());
        if let Some(&tag) = self.by_pattern.read().expect("router lock poisoned").get(&key) {
            return tag;
        }
        let mut by_pattern = self.by_pattern.write().expect("router lock poisoned");
        if let Some(&tag) = by_pattern.get(&key) {
            return tag;
        }
        let tag = {
            let mut next = self.next_tag.write().expect("router lock poisoned");
            *next += 1;
            *next
        };
        by_pattern.insert(key, tag);
        self.routes
            .write()
            .expect("router lock poisoned")
            .entry(method)
            .or_default()
            .push(Route {
                tag,
                segments: split_pattern(pattern),
            });
        tag
    }

    /// Resolve `path_segments` (from [`split_request_path`]) against the
    /// routes registered for `method`. On a match, returns the route's tag
    /// and `out_params`: a [`Dict`] with one entry per `{placeholder}`
    /// segment, keyed by placeholder name, holding the raw captured
    /// segment as a string. On no match, returns [`UNREGISTERED_TAG`] and
    /// an empty dict.
    ///
    /// Literal segments always win over a placeholder at the same
    /// position — the longest exact match, per spec §4.G.
    #[must_use]
    pub fn find(&self, method: Method, path_segments: &[&str]) -> (u32, Dict) {
        let routes = self.routes.read().expect("router lock poisoned");
        let Some(candidates) = routes.get(&method) else {
            return (UNREGISTERED_TAG, Dict::new());
        };

        let mut best: Option<(u32, Dict, usize)> = None;
        for route in candidates {
            if route.segments.len() != path_segments.len() {
                continue;
            }
            let mut captures = Dict::new();
            let mut literal_hits = 0usize;
            let mut matched = true;
            for (seg, actual) in route.segments.iter().zip(path_segments.iter()) {
                match seg {
                    Segment::Literal(lit) => {
                        if lit != actual {
                            matched = false;
                            break;
                        }
                        literal_hits += 1;
                    }
                    Segment::Placeholder(name) => {
                        captures.insert(name.as_str(), Value::String((*actual).to_string()));
                    }
                }
            }
            if !matched {
                continue;
            }
            let is_better = match &best {
                None => true,
                Some((_, _, best_hits)) => literal_hits > *best_hits,
            };
            if is_better {
                best = Some((route.tag, captures, literal_hits));
            }
        }

        best.map_or((UNREGISTERED_TAG, Dict::new()), |(tag, captures, _)| {
            (tag, captures)
        })
    }

    /// Whether `path_segments` matches a pattern registered under some
    /// method other than `method`. Callers use this once [`find`] misses,
    /// to tell a method mismatch apart from a path that is not registered
    /// at all (spec §4.G).
    #[must_use]
    pub fn matches_other_method(&self, method: Method, path_segments: &[&str]) -> bool {
        let routes = self.routes.read().expect("router lock poisoned");
        routes.iter().filter(|(m, _)| **m != method).any(|(_, candidates)| {
            candidates.iter().any(|route| {
                route.segments.len() == path_segments.len()
                    && route.segments.iter().zip(path_segments.iter()).all(|(seg, actual)| match seg {
                        Segment::Literal(lit) => lit == actual,
                        Segment::Placeholder(_) => true,
                    })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reregistering_same_pattern_returns_same_tag() {
        let router = Router::new();
        let a = router.register(Method::Get, "/jobs/{job_id}");
        let b = router.register(Method::Get, "/jobs/{job_id}");
        assert_eq!(a, b);
        assert_ne!(a, UNREGISTERED_TAG);
    }

    #[test]
    fn distinct_methods_get_distinct_tags_for_same_pattern() {
        let router = Router::new();
        let get_tag = router.register(Method::Get, "/jobs/{job_id}");
        let delete_tag = router.register(Method::Delete, "/jobs/{job_id}");
        assert_ne!(get_tag, delete_tag);
    }

    #[test]
    fn find_captures_placeholder_values_by_name() {
        let router = Router::new();
        let tag = router.register(Method::Get, "/clusters/{cluster}/jobs/{job_id}");
        let (found, captures) = router.find(Method::Get, &split_request_path("/clusters/mycluster/jobs/42"));
        assert_eq!(found, tag);
        assert_eq!(captures.get("cluster").unwrap().as_str().unwrap(), "mycluster");
        assert_eq!(captures.get("job_id").unwrap().as_str().unwrap(), "42");
    }

    #[test]
    fn literal_match_wins_over_placeholder_at_same_position() {
        let router = Router::new();
        let literal_tag = router.register(Method::Get, "/jobs/state");
        let placeholder_tag = router.register(Method::Get, "/jobs/{job_id}");
        let (found, captures) = router.find(Method::Get, &split_request_path("/jobs/state"));
        assert_eq!(found, literal_tag);
        assert_ne!(found, placeholder_tag);
        assert_eq!(captures.len(), 0);
    }

    #[test]
    fn unmatched_path_returns_unregistered_tag() {
        let router = Router::new();
        router.register(Method::Get, "/jobs/{job_id}");
        let (found, captures) = router.find(Method::Post, &split_request_path("/jobs/1"));
        assert_eq!(found, UNREGISTERED_TAG);
        assert_eq!(captures.len(), 0);
    }

    #[test]
    fn matches_other_method_distinguishes_mismatch_from_not_found() {
        let router = Router::new();
        router.register(Method::Get, "/jobs/{job_id}");
        assert!(router.matches_other_method(Method::Patch, &split_request_path("/jobs/1")));
        assert!(!router.matches_other_method(Method::Patch, &split_request_path("/nonexistent")));
    }

    #[test]
    fn segment_count_mismatch_does_not_match() {
        let router = Router::new();
        router.register(Method::Get, "/jobs/{job_id}");
        let (found, _) = router.find(Method::Get, &split_request_path("/jobs/1/extra"));
        assert_eq!(found, UNREGISTERED_TAG);
    }
}
