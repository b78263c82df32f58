//! The Porter stemmer exactly as lunr.js runs it.
//!
//! Published indexes carry terms stemmed by lunr's own port of Martin
//! Porter's original algorithm, not Snowball/Porter2. Queries must be reduced
//! by the same rules or words like `generate` (`gener`) never meet their
//! postings.
//!
//! lunr expresses each measure test as a regular expression over the
//! classes below. Those tests are evaluated here by a small backtracking
//! matcher so the corner cases (a leading `y`, `y` counting as a vowel only
//! at the head of a vowel run) come out the same.

/// Pattern pieces used by lunr's measure expressions.
#[derive(Debug, Clone, Copy)]
enum Part {
    /// `[^aeiou][^aeiouy]*`
    Consonants,
    /// `[aeiouy][aeiou]*`
    Vowels,
    /// `([^aeiou][^aeiouy]*)?`
    OptConsonants,
    /// `([aeiouy][aeiou]*)?`
    OptVowels,
    /// `[aeiouy]`
    Vowel,
    /// `[^aeiouwxy]`
    NotWxy,
    /// `$`
    End,
}

use Part::{Consonants, End, NotWxy, OptConsonants, OptVowels, Vowel, Vowels};

/// `^([C])?VC`: measure greater than zero.
const MGR0: &[Part] = &[OptConsonants, Vowels, Consonants];
/// `^([C])?VC(V)?$`: measure exactly one.
const MEQ1: &[Part] = &[OptConsonants, Vowels, Consonants, OptVowels, End];
/// `^([C])?VCVC`: measure greater than one.
const MGR1: &[Part] = &[OptConsonants, Vowels, Consonants, Vowels, Consonants];
/// `^([C])?v`: the stem holds a vowel.
const HAS_VOWEL: &[Part] = &[OptConsonants, Vowel];
/// `^Cv[^aeiouwxy]$`: a short consonant-vowel-consonant word.
const SHORT_CVC: &[Part] = &[Consonants, Vowel, NotWxy, End];

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("logi", "log"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

fn in_set(c: char, set: &str) -> bool {
    set.contains(c)
}

fn matches_from(parts: &[Part], w: &[char], pos: usize) -> bool {
    let Some((&part, rest)) = parts.split_first() else {
        return true;
    };
    let at = |i: usize| w.get(i).copied();
    let run = |start: usize, keep: fn(char) -> bool| {
        w[start..].iter().take_while(|&&c| keep(c)).count()
    };

    match part {
        Consonants => match at(pos) {
            Some(c) if !in_set(c, "aeiou") => {
                let tail = run(pos + 1, |c| !in_set(c, "aeiouy"));
                (0..=tail).rev().any(|k| matches_from(rest, w, pos + 1 + k))
            }
            _ => false,
        },
        Vowels => match at(pos) {
            Some(c) if in_set(c, "aeiouy") => {
                let tail = run(pos + 1, |c| in_set(c, "aeiou"));
                (0..=tail).rev().any(|k| matches_from(rest, w, pos + 1 + k))
            }
            _ => false,
        },
        OptConsonants => {
            let mut with: Vec<Part> = Vec::with_capacity(parts.len());
            with.push(Consonants);
            with.extend_from_slice(rest);
            matches_from(&with, w, pos) || matches_from(rest, w, pos)
        }
        OptVowels => {
            let mut with: Vec<Part> = Vec::with_capacity(parts.len());
            with.push(Vowels);
            with.extend_from_slice(rest);
            matches_from(&with, w, pos) || matches_from(rest, w, pos)
        }
        Vowel => {
            matches!(at(pos), Some(c) if in_set(c, "aeiouy")) && matches_from(rest, w, pos + 1)
        }
        NotWxy => {
            matches!(at(pos), Some(c) if !in_set(c, "aeiouwxy")) && matches_from(rest, w, pos + 1)
        }
        End => pos == w.len() && matches_from(rest, w, pos),
    }
}

fn test(parts: &[Part], w: &[char]) -> bool {
    matches_from(parts, w, 0)
}

fn ends_with(w: &[char], suffix: &str) -> bool {
    let n = suffix.chars().count();
    w.len() >= n && w[w.len() - n..].iter().copied().eq(suffix.chars())
}

/// The longest listed suffix that leaves a non-empty stem, as lunr's lazy
/// `^(.+?)(a|b|...)$` picks it.
fn longest_suffix<'a, T: Copy>(
    w: &[char],
    list: &'a [T],
    key: impl Fn(T) -> &'a str,
) -> Option<T> {
    list.iter()
        .copied()
        .filter(|&entry| {
            let suffix = key(entry);
            w.len() > suffix.chars().count() && ends_with(w, suffix)
        })
        .max_by_key(|&entry| key(entry).len())
}

fn cut(w: &[char], suffix_len: usize) -> Vec<char> {
    w[..w.len() - suffix_len].to_vec()
}

/// Stem one lowercased token.
pub fn stem(token: &str) -> String {
    let mut w: Vec<char> = token.chars().collect();
    if w.len() < 3 {
        return token.to_owned();
    }
    let leading_y = w[0] == 'y';
    if leading_y {
        w[0] = 'Y';
    }

    // Step 1a
    if (w.len() > 4 && ends_with(&w, "sses")) || (w.len() > 3 && ends_with(&w, "ies")) {
        w.truncate(w.len() - 2);
    } else if ends_with(&w, "s") && !ends_with(&w, "ss") && w.len() > 2 {
        w.pop();
    }

    // Step 1b
    if w.len() > 3 && ends_with(&w, "eed") {
        if test(MGR0, &w[..w.len() - 3]) {
            w.pop();
        }
    } else {
        let suffix_len = if w.len() > 2 && ends_with(&w, "ed") {
            Some(2)
        } else if w.len() > 3 && ends_with(&w, "ing") {
            Some(3)
        } else {
            None
        };
        if let Some(len) = suffix_len {
            let stem = cut(&w, len);
            if test(HAS_VOWEL, &stem) {
                w = stem;
                let n = w.len();
                if ends_with(&w, "at") || ends_with(&w, "bl") || ends_with(&w, "iz") {
                    w.push('e');
                } else if n >= 2 && w[n - 1] == w[n - 2] && !in_set(w[n - 1], "aeiouylsz") {
                    w.pop();
                } else if test(SHORT_CVC, &w) {
                    w.push('e');
                }
            }
        }
    }

    // Step 1c
    let n = w.len();
    if n >= 3 && w[n - 1] == 'y' && !in_set(w[n - 2], "aeiou") {
        w[n - 1] = 'i';
    }

    // Step 2
    if let Some((suffix, replacement)) = longest_suffix(&w, STEP2, |(s, _)| s) {
        let stem = cut(&w, suffix.len());
        if test(MGR0, &stem) {
            w = stem;
            w.extend(replacement.chars());
        }
    }

    // Step 3
    if let Some((suffix, replacement)) = longest_suffix(&w, STEP3, |(s, _)| s) {
        let stem = cut(&w, suffix.len());
        if test(MGR0, &stem) {
            w = stem;
            w.extend(replacement.chars());
        }
    }

    // Step 4
    if let Some(suffix) = longest_suffix(&w, STEP4, |s| s) {
        let stem = cut(&w, suffix.len());
        if test(MGR1, &stem) {
            w = stem;
        }
    } else if w.len() > 4 && (ends_with(&w, "sion") || ends_with(&w, "tion")) {
        let stem = cut(&w, 3);
        if test(MGR1, &stem) {
            w = stem;
        }
    }

    // Step 5
    if w.len() > 1 && ends_with(&w, "e") {
        let stem = cut(&w, 1);
        if test(MGR1, &stem) || (test(MEQ1, &stem) && !test(SHORT_CVC, &stem)) {
            w = stem;
        }
    }
    if ends_with(&w, "ll") && test(MGR1, &w) {
        w.pop();
    }

    if leading_y {
        w[0] = 'y';
    }
    w.into_iter().collect()
}
