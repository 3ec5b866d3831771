//! Original Metaphone
//!
//! Implemented as an ordered list of rewrite rules, each applied across the
//! whole word before the next one runs. The input is lowercased and
//! stripped of everything outside `a-z`; rewrites emit uppercase letters,
//! which later rules never match.
//!
//! Example: `"grossberger"` -> `"KRSBRJR"`.

/// Letters whose doubling collapses to a single letter (not `g`)
const DOUBLABLE: &[char] = &[
    'b', 'c', 'd', 'f', 'h', 'j', 'k', 'l', 'm', 'n', 'p', 'q', 'r', 's', 't', 'v', 'w', 'x',
    'y', 'z',
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Scan-and-replace helper. `rule` inspects the word at a position and
/// returns how many characters it consumes and what replaces them.
/// Matches never overlap; scanning resumes after the consumed run.
fn rewrite<F>(word: &[char], rule: F) -> Vec<char>
where
    F: Fn(&[char], usize) -> Option<(usize, String)>,
{
    let mut out = Vec::with_capacity(word.len());
    let mut i = 0;
    while i < word.len() {
        match rule(word, i) {
            Some((consumed, replacement)) => {
                out.extend(replacement.chars());
                i += consumed;
            }
            None => {
                out.push(word[i]);
                i += 1;
            }
        }
    }
    out
}

fn at(word: &[char], i: usize) -> Option<char> {
    word.get(i).copied()
}

fn is(word: &[char], i: usize, c: char) -> bool {
    at(word, i) == Some(c)
}

fn one_of(word: &[char], i: usize, set: &str) -> bool {
    at(word, i).map_or(false, |c| set.contains(c))
}

fn starts_with(word: &[char], prefix: &str) -> bool {
    word.len() >= prefix.chars().count() && prefix.chars().zip(word).all(|(p, c)| p == *c)
}

fn replace_prefix(word: &mut Vec<char>, len: usize, with: char) {
    *word = std::iter::once(with)
        .chain(word[len..].iter().copied())
        .collect();
}

fn replace(consumed: usize, with: &str) -> Option<(usize, String)> {
    Some((consumed, with.to_string()))
}

/// Encode a word
///
/// Returns an empty string when the word has no ASCII letters.
pub fn metaphone(word: &str) -> String {
    let letters: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();

    // Collapse doubled consonants
    let mut w: Vec<char> = Vec::with_capacity(letters.len());
    for c in letters {
        if w.last() == Some(&c) && DOUBLABLE.contains(&c) {
            continue;
        }
        w.push(c);
    }

    // Word-initial rules
    if starts_with(&w, "ae") {
        replace_prefix(&mut w, 2, 'E');
    }
    if one_of(&w, 0, "gkp") && is(&w, 1, 'n') {
        replace_prefix(&mut w, 2, 'N');
    }
    if starts_with(&w, "wr") {
        replace_prefix(&mut w, 2, 'R');
    }
    if is(&w, 0, 'x') {
        replace_prefix(&mut w, 1, 'S');
    }
    if starts_with(&w, "wh") {
        replace_prefix(&mut w, 2, 'W');
    }

    // Word-final "mb"
    if w.len() >= 2 && w[w.len() - 2..] == ['m', 'b'] {
        w.truncate(w.len() - 2);
        w.push('M');
    }

    let w = rewrite(&w, |w, i| {
        (i > 0 && is(w, i, 's') && is(w, i + 1, 'c') && is(w, i + 2, 'h')).then(|| (3, "SK".into()))
    });
    let w = rewrite(&w, |w, i| {
        (is(w, i, 't') && is(w, i + 1, 'h')).then(|| (2, "0".into()))
    });
    let w = rewrite(&w, |w, i| {
        if is(w, i, 't') && is(w, i + 1, 'c') && is(w, i + 2, 'h') {
            replace(3, "X")
        } else if (is(w, i, 'c') || is(w, i, 's')) && is(w, i + 1, 'h') {
            replace(2, "X")
        } else {
            None
        }
    });
    let w = rewrite(&w, |w, i| {
        (is(w, i, 'c') && is(w, i + 1, 'i') && is(w, i + 2, 'a')).then(|| (1, "X".into()))
    });
    let w = rewrite(&w, |w, i| {
        (one_of(w, i, "st") && is(w, i + 1, 'i') && one_of(w, i + 2, "ao"))
            .then(|| (1, "X".into()))
    });
    let w = rewrite(&w, |w, i| {
        if is(w, i, 's') && is(w, i + 1, 'c') && one_of(w, i + 2, "iey") {
            replace(2, "S")
        } else if is(w, i, 'c') && one_of(w, i + 1, "iey") {
            replace(1, "S")
        } else {
            None
        }
    });
    let w = rewrite(&w, |w, i| {
        if is(w, i, 'c') {
            replace(if is(w, i + 1, 'k') { 2 } else { 1 }, "K")
        } else if is(w, i, 'q') {
            replace(1, "K")
        } else {
            None
        }
    });
    let w = rewrite(&w, |w, i| {
        (is(w, i, 'd') && is(w, i + 1, 'g') && one_of(w, i + 2, "iey")).then(|| (2, "J".into()))
    });
    let w = rewrite(&w, |w, i| is(w, i, 'd').then(|| (1, "T".into())));
    let w = rewrite(&w, |w, i| {
        (is(w, i, 'g') && is(w, i + 1, 'h') && at(w, i + 2).map_or(false, |c| !is_vowel(c)))
            .then(|| (1, String::new()))
    });
    let w = rewrite(&w, |w, i| {
        if is(w, i, 'g') && is(w, i + 1, 'n') {
            let consumed = if is(w, i + 2, 'e') && is(w, i + 3, 'd') {
                4
            } else {
                2
            };
            replace(consumed, "N")
        } else {
            None
        }
    });
    let w = rewrite(&w, |w, i| {
        let c = at(w, i)?;
        if c != 'g' && is(w, i + 1, 'g') && one_of(w, i + 2, "iey") {
            Some((2, format!("{}J", c)))
        } else if i == 0 && c == 'g' && one_of(w, 1, "iey") {
            replace(1, "J")
        } else {
            None
        }
    });
    let w = rewrite(&w, |w, i| {
        if !is(w, i, 'g') {
            return None;
        }
        let run = w[i..].iter().take_while(|c| **c == 'g').count();
        replace(run, "K")
    });
    let w = rewrite(&w, |w, i| {
        (is(w, i, 'p') && is(w, i + 1, 'h')).then(|| (2, "F".into()))
    });
    let w = rewrite(&w, |w, i| {
        let c = at(w, i)?;
        let next_is_vowel = at(w, i + 2).map_or(false, is_vowel);
        (is_vowel(c) && is(w, i + 1, 'h') && !next_is_vowel).then(|| (2, c.to_string()))
    });
    let w = rewrite(&w, |w, i| {
        let next_is_vowel = at(w, i + 1).map_or(false, is_vowel);
        (one_of(w, i, "wy") && !next_is_vowel).then(|| (1, String::new()))
    });
    let w = rewrite(&w, |w, i| match at(w, i)? {
        'z' => replace(1, "S"),
        'v' => replace(1, "F"),
        _ => None,
    });
    let w = rewrite(&w, |w, i| {
        if i == 0 || !at(w, i).map_or(false, is_vowel) {
            return None;
        }
        let run = w[i..].iter().take_while(|c| is_vowel(**c)).count();
        replace(run, "")
    });

    w.into_iter().map(|c| c.to_ascii_uppercase()).collect()
}
