use {
    std::{collections::HashMap, fs, io, path::{Path, PathBuf}},
    tracing::info,
    thiserror::Error,
};

const BUILTIN_LEXICON: &str = include_str!("../resources/lexicon.tsv");
const BUILTIN_EXCEPTIONS: &str = include_str!("../resources/exceptions.tsv");

const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""), ("ses", "s"), ("ves", "f"), ("xes", "x"), ("zes", "z"),
    ("ches", "ch"), ("shes", "sh"), ("men", "man"), ("ies", "y"),
];
const VERB_RULES: &[(&str, &str)] = &[
    ("s", ""), ("ies", "y"), ("es", "e"), ("es", ""),
    ("ed", "e"), ("ed", ""), ("ing", "e"), ("ing", ""),
];
const ADJECTIVE_RULES: &[(&str, &str)] = &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed lexicon line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl PartOfSpeech {
    /// Vote order: on equal sense counts the earlier part of speech wins.
    pub const ALL: [PartOfSpeech; 4] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "n" => Some(PartOfSpeech::Noun),
            "v" => Some(PartOfSpeech::Verb),
            "a" | "s" => Some(PartOfSpeech::Adjective),
            "r" => Some(PartOfSpeech::Adverb),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    /// Suffix of the WordNet `index.*` and `*.exc` files for this part of speech.
    pub fn wordnet_name(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adj",
            PartOfSpeech::Adverb => "adv",
        }
    }

    fn rules(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PartOfSpeech::Noun => NOUN_RULES,
            PartOfSpeech::Verb => VERB_RULES,
            PartOfSpeech::Adjective => ADJECTIVE_RULES,
            PartOfSpeech::Adverb => &[],
        }
    }
}

pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, token: &str) -> String;
}

/// Sense inventory: how many senses each base form has per part of speech, plus irregular forms.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    senses: HashMap<String, [usize; 4]>,
    exceptions: [HashMap<String, Vec<String>>; 4],
}

impl Lexicon {
    /// Small embedded inventory of common words, used when no WordNet dictionary is installed.
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::parse(BUILTIN_LEXICON, BUILTIN_EXCEPTIONS)
    }

    /// Reads a WordNet `dict` directory: sense counts from `index.{noun,verb,adj,adv}` and
    /// irregular forms from `{noun,verb,adj,adv}.exc`.
    pub fn from_wordnet(dir: &Path) -> Result<Self, LexiconError> {
        let mut result = Self::default();

        for pos in PartOfSpeech::ALL {
            let index = read(&dir.join(format!("index.{}", pos.wordnet_name())))?;
            result.add_wordnet_index(&index, pos)?;

            let exceptions = read(&dir.join(format!("{}.exc", pos.wordnet_name())))?;
            result.add_wordnet_exceptions(&exceptions, pos)?;
        }

        info!("loaded wordnet lexicon with {} lemmas from {}", result.senses.len(), dir.display());
        Ok(result)
    }

    pub fn from_files(lexicon: &Path, exceptions: Option<&Path>) -> Result<Self, LexiconError> {
        let lexicon_text = read(lexicon)?;
        let exceptions_text = match exceptions {
            Some(path) => read(path)?,
            None => BUILTIN_EXCEPTIONS.to_owned(),
        };

        let result = Self::parse(&lexicon_text, &exceptions_text)?;
        info!("loaded lexicon with {} lemmas from {}", result.senses.len(), lexicon.display());
        Ok(result)
    }

    /// Lexicon lines are `lemma<TAB>noun<TAB>verb<TAB>adjective<TAB>adverb`,
    /// exception lines are `pos<TAB>inflected<TAB>base [base...]`. `#` starts a comment line.
    pub fn parse(lexicon: &str, exceptions: &str) -> Result<Self, LexiconError> {
        let mut result = Self::default();

        for (line_index, line) in data_lines(lexicon) {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 5 {
                return Err(malformed(line_index, format!("expected 5 fields, got {}", fields.len())));
            }

            let mut counts = [0; 4];
            for (count, field) in counts.iter_mut().zip(&fields[1..]) {
                *count = field.trim().parse()
                    .map_err(|_| malformed(line_index, format!("invalid sense count {:?}", field)))?;
            }
            result.senses.insert(fields[0].trim().to_lowercase(), counts);
        }

        for (line_index, line) in data_lines(exceptions) {
            let fields: Vec<&str> = line.splitn(3, '\t').collect();
            if fields.len() != 3 {
                return Err(malformed(line_index, "expected pos, inflected form and base forms".to_owned()));
            }

            let pos = PartOfSpeech::from_tag(fields[0].trim())
                .ok_or_else(|| malformed(line_index, format!("unknown part of speech {:?}", fields[0])))?;
            let bases = fields[2].split_whitespace().map(str::to_owned);
            result.exceptions[pos.index()]
                .entry(fields[1].trim().to_lowercase())
                .or_default()
                .extend(bases);
        }

        Ok(result)
    }

    /// Index lines are `lemma pos synset_cnt p_cnt [ptr_symbol...] sense_cnt tagsense_cnt synset_offset...`.
    /// The license header at the top of each file is indented and skipped.
    fn add_wordnet_index(&mut self, text: &str, pos: PartOfSpeech) -> Result<(), LexiconError> {
        for (line_index, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with(' ') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(malformed(line_index + 1, "expected lemma, part of speech and synset count".to_owned()));
            }
            if PartOfSpeech::from_tag(fields[1]) != Some(pos) {
                return Err(malformed(line_index + 1, format!("part of speech {:?} in index.{}", fields[1], pos.wordnet_name())));
            }

            let count = fields[2].parse()
                .map_err(|_| malformed(line_index + 1, format!("invalid synset count {:?}", fields[2])))?;
            self.senses.entry(fields[0].to_lowercase()).or_insert([0; 4])[pos.index()] = count;
        }

        Ok(())
    }

    /// Exception lines are `inflected base [base...]`.
    fn add_wordnet_exceptions(&mut self, text: &str, pos: PartOfSpeech) -> Result<(), LexiconError> {
        for (line_index, line) in text.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let inflected = match fields.next() {
                Some(inflected) => inflected,
                None => continue,
            };

            let bases: Vec<String> = fields.map(str::to_owned).collect();
            if bases.is_empty() {
                return Err(malformed(line_index + 1, format!("no base form for {:?}", inflected)));
            }

            self.exceptions[pos.index()]
                .entry(inflected.to_lowercase())
                .or_default()
                .extend(bases);
        }

        Ok(())
    }

    pub fn sense_count(&self, lemma: &str, pos: PartOfSpeech) -> usize {
        self.senses.get(lemma).map(|counts| counts[pos.index()]).unwrap_or(0)
    }

    pub fn contains(&self, lemma: &str, pos: PartOfSpeech) -> bool {
        self.sense_count(lemma, pos) > 0
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    /// Base forms of `form` known for `pos`: the exception list first, then detachment rules
    /// applied repeatedly until some candidate is in the lexicon.
    pub fn morphy(&self, form: &str, pos: PartOfSpeech) -> Vec<String> {
        if let Some(bases) = self.exceptions[pos.index()].get(form) {
            let mut forms = vec![form.to_owned()];
            forms.extend(bases.iter().cloned());
            return self.known_forms(&forms, pos);
        }

        let mut forms = apply_rules(&[form.to_owned()], pos);

        let mut candidates = vec![form.to_owned()];
        candidates.extend(forms.iter().cloned());
        let results = self.known_forms(&candidates, pos);
        if !results.is_empty() {
            return results;
        }

        while !forms.is_empty() {
            forms = apply_rules(&forms, pos);
            let results = self.known_forms(&forms, pos);
            if !results.is_empty() {
                return results;
            }
        }

        Vec::new()
    }

    fn known_forms(&self, forms: &[String], pos: PartOfSpeech) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        for form in forms {
            if self.contains(form, pos) && !result.contains(form) {
                result.push(form.clone());
            }
        }
        result
    }
}

fn apply_rules(forms: &[String], pos: PartOfSpeech) -> Vec<String> {
    forms.iter()
        .flat_map(|form| pos.rules().iter()
            .filter(move |(old, _)| form.ends_with(old))
            .map(move |(old, new)| format!("{}{}", &form[..form.len() - old.len()], new)))
        .collect()
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
}

fn read(path: &Path) -> Result<String, LexiconError> {
    fs::read_to_string(path).map_err(|source| LexiconError::Io { path: path.to_owned(), source })
}

fn malformed(line: usize, reason: String) -> LexiconError {
    LexiconError::Malformed { line, reason }
}

/// Dictionary lemmatizer that picks the part of speech with the most senses before reducing the word.
pub struct WordNetLemmatizer {
    lexicon: Lexicon,
}

impl WordNetLemmatizer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn part_of_speech(&self, word: &str) -> PartOfSpeech {
        let mut best = PartOfSpeech::Noun;
        let mut best_count = 0;

        for pos in PartOfSpeech::ALL {
            let count: usize = self.lexicon.morphy(word, pos)
                .iter()
                .map(|base| self.lexicon.sense_count(base, pos))
                .sum();

            if count > best_count {
                best = pos;
                best_count = count;
            }
        }

        best
    }

    pub fn lemmatize_as(&self, word: &str, pos: PartOfSpeech) -> String {
        self.lexicon.morphy(word, pos)
            .into_iter()
            .min_by_key(|base| base.len())
            .unwrap_or_else(|| word.to_owned())
    }
}

impl Lemmatizer for WordNetLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        self.lemmatize_as(token, self.part_of_speech(token))
    }
}

#[cfg(feature = "nltk")]
pub use nltk::NltkLemmatizer;

#[cfg(feature = "nltk")]
mod nltk {
    use {
        tracing::warn,
        pyo3::{prelude::*, types::IntoPyDict},
        super::Lemmatizer,
    };

    const SETUP: &str = r#"
from collections import Counter
from nltk.corpus import wordnet
from nltk.stem import WordNetLemmatizer
lemmatizer = WordNetLemmatizer()

def lemmatize_with_pos(word):
    synsets = wordnet.synsets(word)
    counts = Counter()
    for pos in ("n", "v", "a", "r"):
        counts[pos] = len([s for s in synsets if s.pos() == pos])
    return lemmatizer.lemmatize(word, counts.most_common(1)[0][0])
"#;

    /// Delegates to NLTK's WordNet lemmatizer through the embedded interpreter.
    pub struct NltkLemmatizer;

    impl NltkLemmatizer {
        pub fn new() -> anyhow::Result<Self> {
            Python::with_gil(|py| py.run(SETUP, None, None))?;
            Ok(Self)
        }
    }

    impl Lemmatizer for NltkLemmatizer {
        fn lemmatize(&self, token: &str) -> String {
            Python::with_gil(|py| {
                py.eval(
                    "lemmatize_with_pos(word)",
                    None,
                    Some([("word", token)].into_py_dict(py)),
                ).and_then(|v| v.extract())
            }).unwrap_or_else(|err| {
                warn!("nltk failed to lemmatize {:?}: {}", token, err);
                token.to_owned()
            })
        }
    }
}
