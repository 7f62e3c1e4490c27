use {
    std::collections::BTreeMap,
    indexmap::IndexMap,
    emotion_trends_core::{
        config::{TrendSource, TrendsConfig},
        entity::{DayKey, TokenizedRecord},
    },
};

/// Counts terms across all lists, remembering the order in which each term was first seen.
pub fn count_terms<'a, I, T>(term_lists: I) -> IndexMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a T>,
    T: AsRef<[String]> + ?Sized + 'a,
{
    let mut counts = IndexMap::new();
    for terms in term_lists {
        for term in terms.as_ref() {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

/// Most frequent terms with at least `min_occurrences` hits, highest count first.
/// Equal counts keep first-seen order.
pub fn top_terms_for_day<'a, I, T>(term_lists: I, k: usize, min_occurrences: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a T>,
    T: AsRef<[String]> + ?Sized + 'a,
{
    let mut terms: Vec<(&str, usize)> = count_terms(term_lists)
        .into_iter()
        .filter(|(_, count)| *count >= min_occurrences)
        .collect();

    terms.sort_by(|a, b| b.1.cmp(&a.1));
    terms.truncate(k);

    terms.into_iter().map(|(term, count)| (term.to_owned(), count)).collect()
}

pub fn top_terms(day_terms: &BTreeMap<DayKey, Vec<Vec<String>>>, k: usize, min_occurrences: usize) -> BTreeMap<DayKey, Vec<(String, usize)>> {
    day_terms.iter()
        .map(|(day, term_lists)| (*day, top_terms_for_day(term_lists, k, min_occurrences)))
        .collect()
}

pub struct TrendCounter {
    source: TrendSource,
    k: usize,
    min_occurrences: usize,
}

impl TrendCounter {
    pub fn new(source: TrendSource, k: usize, min_occurrences: usize) -> Self {
        Self {
            source,
            k,
            min_occurrences,
        }
    }

    pub fn from_config(config: &TrendsConfig) -> Self {
        Self::new(config.source(), config.top_k(), config.min_occurrences())
    }

    pub fn source(&self) -> TrendSource {
        self.source
    }

    pub fn top_terms_for_records(&self, records: &[TokenizedRecord]) -> Vec<(String, usize)> {
        let term_lists = records.iter().map(|record| match self.source {
            TrendSource::Hashtags => &record.cleaned.hashtags,
            TrendSource::Words => &record.content_preprocessed,
        });

        top_terms_for_day(term_lists, self.k, self.min_occurrences)
    }
}
