//! Highest-confidence consensus per agent

use crate::request::response::Response;
use std::collections::BTreeMap;

/// Responses keyed by agent display name
pub type ResponseMap = BTreeMap<String, Response>;

/// Pick the response with the strictly highest confidence; ties keep the first seen.
///
/// Error and NaN responses count as zero confidence, out-of-range values are
/// clamped first. Returns `None` for an empty slice.
pub fn best_response<'a, I>(candidates: I) -> Option<&'a Response>
where
    I: IntoIterator<Item = &'a Response>,
{
    let mut best: Option<(&Response, f32)> = None;
    for candidate in candidates {
        let score = candidate.effective_confidence();
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(response, _)| response)
}

/// Reduce any number of response maps into one best response per agent.
///
/// Pairs are grouped by agent name in input order; each group keeps the
/// response with the strictly highest confidence (first seen wins ties, errors
/// count as zero). Winners come back normalized into `[0.0, 1.0]`. A group
/// without candidates yields [`Response::no_consensus`].
///
/// # Example
///
/// ```
/// use conclave_domain::consensus::{aggregate, ResponseMap};
/// use conclave_domain::Response;
///
/// let round = |name: &str, confidence: f32| {
///     ResponseMap::from([(name.to_string(), Response::success(name, confidence))])
/// };
///
/// let consensus = aggregate(&[round("A", 0.3), round("A", 0.9), round("B", 0.5)]);
/// assert_eq!(consensus["A"].confidence, 0.9);
/// assert_eq!(consensus["B"].confidence, 0.5);
/// ```
pub fn aggregate(rounds: &[ResponseMap]) -> ResponseMap {
    let mut groups: BTreeMap<&str, Vec<&Response>> = BTreeMap::new();
    for round in rounds {
        for (name, response) in round {
            groups.entry(name.as_str()).or_default().push(response);
        }
    }

    groups
        .into_iter()
        .map(|(name, candidates)| {
            let best = best_response(candidates)
                .cloned()
                .map_or_else(Response::no_consensus, Response::normalized);
            (name.to_string(), best)
        })
        .collect()
}
