use std::marker::PhantomData;
use std::sync::atomic::Ordering;

use tracing::{debug, warn};

use crate::core::classification::Classification;
use crate::core::tree::TreeError;
use crate::core::types::{Algorithm, ClassificationId};
use crate::index::AccessionLookup;
use crate::mapping::registry::RegistrySnapshot;
use crate::resolve::reduce::Candidates;
use crate::resolve::text::{bracketed, looks_like_path, path_names};
use crate::resolve::tokens::{
    first_word, is_accession_char, is_id_char, tagged_tokens, trim_accession, word_spans_into,
};
use crate::utils::validation::{strip_accession_version, MAX_PARSE_WARNINGS};

/// Longest synonym phrase, in words
pub const MAX_SYNONYM_WORDS: usize = 5;

/// Longest free-text segment, in words
pub const MAX_SEGMENT_WORDS: usize = 8;

/// Shortest free-text segment, in characters
pub const MIN_SEGMENT_LEN: usize = 5;

/// Longest free-text segment, in characters
pub const MAX_SEGMENT_LEN: usize = 120;

/// Assigns a classification id to a read header.
///
/// A resolver owns a private snapshot of its registry and reusable
/// scratch state. It is deliberately neither `Send` nor `Sync`: each worker
/// thread creates its own with [`MapRegistry::create_resolver`].
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<taxon_resolver::resolve::HeaderResolver>();
/// ```
///
/// [`MapRegistry::create_resolver`]: crate::mapping::MapRegistry::create_resolver
#[derive(Debug)]
pub struct HeaderResolver {
    snapshot: RegistrySnapshot,
    candidates: Candidates,
    words: Vec<(usize, usize)>,
    _not_send: PhantomData<*const ()>,
}

impl HeaderResolver {
    pub(crate) fn new(snapshot: RegistrySnapshot) -> Self {
        let candidates = Candidates::new(snapshot.options.algorithm, snapshot.disabled.clone());
        Self {
            snapshot,
            candidates,
            words: Vec::new(),
            _not_send: PhantomData,
        }
    }

    #[must_use]
    pub fn classification(&self) -> &Classification {
        &self.snapshot.classification
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.candidates.algorithm()
    }

    /// Resolve one header to an id, or `0` if nothing is found.
    ///
    /// # Errors
    ///
    /// Returns a `TreeError` only when the tree and a mapping source
    /// disagree (an id from the mapping is missing from the tree).
    pub fn resolve(&mut self, header: &str) -> Result<ClassificationId, TreeError> {
        self.candidates.clear();
        if let Some(id) = self.collect(header)? {
            return Ok(id);
        }
        self.candidates.reduce(&self.snapshot.classification.tree)
    }

    /// Resolve several headers of one read (e.g. all hits of a read) to a
    /// single id. Candidates of all headers are reduced together.
    ///
    /// # Errors
    ///
    /// See [`HeaderResolver::resolve`].
    pub fn resolve_all<I, S>(&mut self, headers: I) -> Result<ClassificationId, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.candidates.clear();
        for header in headers {
            if let Some(id) = self.collect(header.as_ref())? {
                return Ok(id);
            }
        }
        self.candidates.reduce(&self.snapshot.classification.tree)
    }

    /// Reduce ids that were resolved elsewhere with this resolver's
    /// algorithm and disabled ids. Non-positive ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownId` under `Lca` if an id is not in the tree.
    pub fn reduce_ids<I>(&mut self, ids: I) -> Result<ClassificationId, TreeError>
    where
        I: IntoIterator<Item = ClassificationId>,
    {
        self.candidates.clear();
        for id in ids.into_iter().filter(|&id| id > 0) {
            self.candidates.offer(id);
        }
        self.candidates.reduce(&self.snapshot.classification.tree)
    }

    /// Run the lookup steps on one header, accumulating candidates.
    /// Returns `Some` when `FirstHit` settles the result early.
    fn collect(&mut self, header: &str) -> Result<Option<ClassificationId>, TreeError> {
        let Self {
            snapshot,
            candidates,
            words,
            ..
        } = self;
        let snapshot: &RegistrySnapshot = snapshot;
        let options = &snapshot.options;

        if options.use_id_parsing {
            tagged_ids(snapshot, candidates, header);
            if let Some(id) = candidates.first_hit() {
                return Ok(Some(id));
            }
        }

        if let Some(synonyms) = &snapshot.synonyms {
            word_spans_into(header, words);
            for (i, &(start, _)) in words.iter().enumerate() {
                let longest = words.len().min(i + MAX_SYNONYM_WORDS);
                let hit = (i..longest)
                    .rev()
                    .find_map(|last| synonyms.get(&header[start..words[last].1]));
                if let Some(id) = hit {
                    candidates.offer(id);
                    if let Some(id) = candidates.first_hit() {
                        return Ok(Some(id));
                    }
                }
            }
        }

        if !snapshot.accession_maps.is_empty() {
            accessions(snapshot, candidates, header);
            if let Some(id) = candidates.first_hit() {
                return Ok(Some(id));
            }
        }

        if snapshot.classification.is_taxonomy() && options.use_text_parsing && candidates.is_empty() {
            text_fallback(snapshot, candidates, words, header)?;
            if let Some(id) = candidates.first_hit() {
                return Ok(Some(id));
            }
        }

        Ok(None)
    }
}

fn tagged_ids(snapshot: &RegistrySnapshot, candidates: &mut Candidates, header: &str) {
    let tree = &snapshot.classification.tree;
    for tag in &snapshot.options.id_tags {
        for token in tagged_tokens(header, tag, is_id_char) {
            match token.parse::<ClassificationId>() {
                Ok(id) if id > 0 && tree.contains(id) => {
                    candidates.offer(id);
                    if candidates.first_hit().is_some() {
                        return;
                    }
                }
                Ok(id) => debug!("Ignoring id {id} after '{tag}': not in the tree"),
                Err(_) => warn_unparseable(snapshot, tag, token),
            }
        }
    }
}

fn warn_unparseable(snapshot: &RegistrySnapshot, tag: &str, token: &str) {
    let seen = snapshot.parse_warnings.fetch_add(1, Ordering::Relaxed);
    if seen < MAX_PARSE_WARNINGS {
        warn!("Could not parse id after '{tag}': '{token}'");
        if seen + 1 == MAX_PARSE_WARNINGS {
            warn!("Further unparseable id warnings suppressed");
        }
    }
}

fn lookup_accession(snapshot: &RegistrySnapshot, token: &str) -> Option<ClassificationId> {
    snapshot.accession_maps.iter().find_map(|index| {
        index
            .get(token)
            .or_else(|| strip_accession_version(token).and_then(|base| index.get(base)))
    })
}

fn accessions(snapshot: &RegistrySnapshot, candidates: &mut Candidates, header: &str) {
    let mut tagged_hit = false;
    for tag in &snapshot.options.accession_tags {
        for token in tagged_tokens(header, tag, is_accession_char) {
            let token = trim_accession(token);
            if token.is_empty() {
                continue;
            }
            if let Some(id) = lookup_accession(snapshot, token) {
                tagged_hit = true;
                candidates.offer(id);
                if candidates.first_hit().is_some() {
                    return;
                }
            }
        }
    }

    if snapshot.options.first_word_is_accession && !tagged_hit {
        if let Some(id) = first_word(header).and_then(|word| lookup_accession(snapshot, word)) {
            candidates.offer(id);
        }
    }
}

fn text_fallback(
    snapshot: &RegistrySnapshot,
    candidates: &mut Candidates,
    words: &mut Vec<(usize, usize)>,
    header: &str,
) -> Result<(), TreeError> {
    let classification = &snapshot.classification;
    let dictionary = &classification.dictionary;
    let header = header.trim();
    let header = header.strip_prefix('>').map_or(header, str::trim_start);

    if looks_like_path(header) {
        let mut deepest = None;
        for name in path_names(header) {
            let Some(id) = dictionary.get(name) else {
                continue;
            };
            if candidates.is_disabled(id) {
                candidates.offer(id);
                continue;
            }
            deepest = match deepest {
                Some(current) if !classification.tree.is_descendant(current, id)? => Some(current),
                _ => Some(id),
            };
        }
        if let Some(id) = deepest {
            candidates.offer(id);
        }
        if !candidates.is_empty() {
            return Ok(());
        }
    }

    for group in bracketed(header) {
        let group_words: Vec<&str> = group.split_whitespace().collect();
        let hit = (1..=group_words.len()).rev().find_map(|n| {
            let phrase = group_words[..n].join(" ");
            snapshot
                .synonyms
                .as_ref()
                .and_then(|synonyms| synonyms.get(&phrase))
                .or_else(|| dictionary.get(&phrase))
        });
        if let Some(id) = hit {
            candidates.offer(id);
            if candidates.first_hit().is_some() {
                return Ok(());
            }
        }
    }
    if !candidates.is_empty() {
        return Ok(());
    }

    word_spans_into(header, words);
    let mut i = 0;
    while i < words.len() {
        let start = words[i].0;
        let longest = words.len().min(i + MAX_SEGMENT_WORDS);
        let hit = (i..longest).rev().find_map(|last| {
            let segment = &header[start..words[last].1];
            if (MIN_SEGMENT_LEN..=MAX_SEGMENT_LEN).contains(&segment.chars().count()) {
                dictionary.get(segment).map(|id| (id, last))
            } else {
                None
            }
        });
        match hit {
            Some((id, last)) => {
                candidates.offer(id);
                if candidates.first_hit().is_some() {
                    return Ok(());
                }
                i = last + 1;
            }
            None => i += 1,
        }
    }
    Ok(())
}
