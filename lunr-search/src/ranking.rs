//! Phrase-then-word ranking over a ready [`SiteIndex`].
//!
//! # Pipeline
//!
//! 1. Normalise the query into distinct terms; no terms means no results
//! 2. Phrase tier: documents whose folded fields contain the folded query
//! 3. Word tier: every other document in the union of the term postings
//! 4. Stable sort by tier, then distinct matched terms (descending); ties
//!    keep natural index order
//! 5. Keep the best hit per page (location without fragment, or the
//!    document reference when there is no location)
//! 6. Truncate to the requested maximum

use std::collections::{BTreeMap, HashSet};

use crate::index::SiteIndex;
use crate::tokenizer;
use crate::types::{FieldMask, MatchTier, SearchHit};

#[derive(Debug)]
struct Candidate {
    position: usize,
    tier: MatchTier,
    matched_terms: usize,
    fields: FieldMask,
}

/// Rank the documents of `index` against `query`, returning at most
/// `max_results` hits.
pub fn rank(index: &SiteIndex, query: &str, max_results: usize) -> Vec<SearchHit> {
    let terms = tokenizer::query_terms(query);
    if terms.is_empty() || max_results == 0 {
        return Vec::new();
    }

    let term_hits = collect_term_hits(index, &terms);
    let phrase = tokenizer::fold(query);

    let mut candidates = phrase_candidates(index, &phrase, &term_hits);
    let phrase_positions: HashSet<usize> = candidates.iter().map(|c| c.position).collect();
    candidates.extend(
        word_candidates(&term_hits)
            .into_iter()
            .filter(|c| !phrase_positions.contains(&c.position)),
    );

    // `sort_by` is stable and candidates arrive in position order.
    candidates.sort_by(|a, b| {
        b.tier
            .cmp(&a.tier)
            .then_with(|| b.matched_terms.cmp(&a.matched_terms))
    });

    let mut seen_pages = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let doc = &index.documents()[candidate.position];
            let page_key = match doc.page_location() {
                "" => doc.reference(),
                location => location,
            };
            if !seen_pages.insert(page_key.to_owned()) {
                return None;
            }
            Some(SearchHit {
                title: doc.title().to_owned(),
                url: index.site().resolve_location(doc.location()),
                location: doc.location().to_owned(),
                breadcrumb: doc.breadcrumb().to_vec(),
                tier: candidate.tier,
                score: candidate.tier.base_score() + candidate.matched_terms as u32,
                matched_terms: candidate.matched_terms,
                matched_fields: candidate.fields.fields(),
            })
        })
        .take(max_results)
        .collect()
}

/// Per document: how many distinct query terms it holds, and where.
fn collect_term_hits(index: &SiteIndex, terms: &[String]) -> BTreeMap<usize, (usize, FieldMask)> {
    let mut hits: BTreeMap<usize, (usize, FieldMask)> = BTreeMap::new();
    for term in terms {
        let Some(postings) = index.postings(term) else {
            continue;
        };
        for (&position, &fields) in postings {
            let entry = hits.entry(position).or_default();
            entry.0 += 1;
            entry.1.union(fields);
        }
    }
    hits
}

fn phrase_candidates(
    index: &SiteIndex,
    phrase: &str,
    term_hits: &BTreeMap<usize, (usize, FieldMask)>,
) -> Vec<Candidate> {
    (0..index.len())
        .filter_map(|position| {
            let mut fields = FieldMask::default();
            for (field, text) in index.folded_fields(position) {
                if text.contains(phrase) {
                    fields.insert(*field);
                }
            }
            if fields.is_empty() {
                return None;
            }
            let matched_terms = term_hits.get(&position).map_or(0, |(count, _)| *count);
            Some(Candidate {
                position,
                tier: MatchTier::Phrase,
                matched_terms,
                fields,
            })
        })
        .collect()
}

fn word_candidates(term_hits: &BTreeMap<usize, (usize, FieldMask)>) -> Vec<Candidate> {
    term_hits
        .iter()
        .map(|(&position, &(matched_terms, fields))| Candidate {
            position,
            tier: MatchTier::Word,
            matched_terms,
            fields,
        })
        .collect()
}
