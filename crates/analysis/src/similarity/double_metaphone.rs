//! Double Metaphone
//!
//! Produces a primary code and an alternate code for the word. The two
//! only differ when the spelling admits more than one pronunciation
//! (`"Schmidt"` -> `XMT` / `SMT`). Codes are not truncated here.
//!
//! Only ASCII letters are considered; anything else is dropped before
//! encoding.

/// Encode a word into (primary, alternate)
///
/// Both codes are empty when the word has no ASCII letters.
pub fn double_metaphone(word: &str) -> (String, String) {
    let chars: Vec<char> = word
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if chars.is_empty() {
        return (String::new(), String::new());
    }
    let mut encoder = Encoder::new(&chars);
    encoder.run();
    (encoder.primary, encoder.alternate)
}

struct Encoder<'a> {
    word: &'a [char],
    last: isize,
    slavo_germanic: bool,
    primary: String,
    alternate: String,
}

impl<'a> Encoder<'a> {
    fn new(word: &'a [char]) -> Self {
        let text: String = word.iter().collect();
        Encoder {
            word,
            last: word.len() as isize - 1,
            slavo_germanic: text.contains('W')
                || text.contains('K')
                || text.contains("CZ")
                || text.contains("WITZ"),
            primary: String::new(),
            alternate: String::new(),
        }
    }

    /// Character at `i`; a space past the end, NUL before the start
    fn at(&self, i: isize) -> char {
        if i < 0 {
            '\0'
        } else {
            self.word.get(i as usize).copied().unwrap_or(' ')
        }
    }

    fn string_at(&self, start: isize, candidates: &[&str]) -> bool {
        if start < 0 {
            return false;
        }
        candidates.iter().any(|candidate| {
            candidate
                .chars()
                .enumerate()
                .all(|(k, c)| self.at(start + k as isize) == c)
        })
    }

    fn is_vowel(&self, i: isize) -> bool {
        matches!(self.at(i), 'A' | 'E' | 'I' | 'O' | 'U' | 'Y')
    }

    fn germanic(&self) -> bool {
        self.string_at(0, &["VAN ", "VON "]) || self.string_at(0, &["SCH"])
    }

    fn add(&mut self, code: &str) {
        self.primary.push_str(code);
        self.alternate.push_str(code);
    }

    fn add2(&mut self, primary: &str, alternate: &str) {
        self.primary.push_str(primary);
        self.alternate.push_str(alternate);
    }

    /// Advance past `c`, skipping one immediate repeat
    fn skip_double(&self, current: isize, c: char) -> isize {
        if self.at(current + 1) == c {
            current + 2
        } else {
            current + 1
        }
    }

    fn run(&mut self) {
        let len = self.word.len() as isize;
        let mut current: isize = 0;

        if self.string_at(0, &["GN", "KN", "PN", "WR", "PS"]) {
            current += 1;
        }
        // Initial X sounds like S ("Xavier")
        if self.at(0) == 'X' {
            self.add("S");
            current += 1;
        }

        while current < len {
            current = match self.at(current) {
                'A' | 'E' | 'I' | 'O' | 'U' | 'Y' => {
                    if current == 0 {
                        self.add("A");
                    }
                    current + 1
                }
                'B' => {
                    self.add("P");
                    self.skip_double(current, 'B')
                }
                'C' => self.c(current),
                'D' => self.d(current),
                'F' => {
                    self.add("F");
                    self.skip_double(current, 'F')
                }
                'G' => self.g(current),
                'H' => {
                    if (current == 0 || self.is_vowel(current - 1)) && self.is_vowel(current + 1) {
                        self.add("H");
                        current + 2
                    } else {
                        current + 1
                    }
                }
                'J' => self.j(current),
                'K' => {
                    self.add("K");
                    self.skip_double(current, 'K')
                }
                'L' => self.l(current),
                'M' => {
                    let silent_b = self.string_at(current - 1, &["UMB"])
                        && (current + 1 == self.last || self.string_at(current + 2, &["ER"]));
                    self.add("M");
                    if silent_b || self.at(current + 1) == 'M' {
                        current + 2
                    } else {
                        current + 1
                    }
                }
                'N' => {
                    self.add("N");
                    self.skip_double(current, 'N')
                }
                'P' => {
                    if self.at(current + 1) == 'H' {
                        self.add("F");
                        current + 2
                    } else {
                        self.add("P");
                        if self.string_at(current + 1, &["P", "B"]) {
                            current + 2
                        } else {
                            current + 1
                        }
                    }
                }
                'Q' => {
                    self.add("K");
                    self.skip_double(current, 'Q')
                }
                'R' => {
                    // French final "-ier", but not "-meier"
                    if current == self.last
                        && !self.slavo_germanic
                        && self.string_at(current - 2, &["IE"])
                        && !self.string_at(current - 4, &["ME", "MA"])
                    {
                        self.add2("", "R");
                    } else {
                        self.add("R");
                    }
                    self.skip_double(current, 'R')
                }
                'S' => self.s(current),
                'T' => self.t(current),
                'V' => {
                    self.add("F");
                    self.skip_double(current, 'V')
                }
                'W' => self.w(current),
                'X' => {
                    // French final "-eaux", "-oux"
                    let silent = current == self.last
                        && (self.string_at(current - 3, &["IAU", "EAU"])
                            || self.string_at(current - 2, &["AU", "OU"]));
                    if !silent {
                        self.add("KS");
                    }
                    if self.string_at(current + 1, &["C", "X"]) {
                        current + 2
                    } else {
                        current + 1
                    }
                }
                'Z' => self.z(current),
                _ => current + 1,
            };
        }
    }

    fn c(&mut self, current: isize) -> isize {
        // Germanic "-ach-" ("bacher", "macher")
        if current > 1
            && !self.is_vowel(current - 2)
            && self.string_at(current - 1, &["ACH"])
            && self.at(current + 2) != 'I'
            && (self.at(current + 2) != 'E' || self.string_at(current - 2, &["BACHER", "MACHER"]))
        {
            self.add("K");
            return current + 2;
        }
        if current == 0 && self.string_at(current, &["CAESAR"]) {
            self.add("S");
            return current + 2;
        }
        if self.string_at(current, &["CHIA"]) {
            self.add("K");
            return current + 2;
        }
        if self.string_at(current, &["CH"]) {
            return self.ch(current);
        }
        if self.string_at(current, &["CZ"]) && !self.string_at(current - 2, &["WICZ"]) {
            self.add2("S", "X");
            return current + 2;
        }
        if self.string_at(current + 1, &["CIA"]) {
            self.add("X");
            return current + 3;
        }
        // Double C, but not "McClellan"
        if self.string_at(current, &["CC"]) && !(current == 1 && self.at(0) == 'M') {
            if self.string_at(current + 2, &["I", "E", "H"]) && !self.string_at(current + 2, &["HU"])
            {
                if (current == 1 && self.at(current - 1) == 'A')
                    || self.string_at(current - 1, &["UCCEE", "UCCES"])
                {
                    self.add("KS");
                } else {
                    self.add("X");
                }
                return current + 3;
            }
            self.add("K");
            return current + 2;
        }
        if self.string_at(current, &["CK", "CG", "CQ"]) {
            self.add("K");
            return current + 2;
        }
        if self.string_at(current, &["CI", "CE", "CY"]) {
            if self.string_at(current, &["CIO", "CIE", "CIA"]) {
                self.add2("S", "X");
            } else {
                self.add("S");
            }
            return current + 2;
        }
        self.add("K");
        if self.string_at(current + 1, &["C", "K", "Q"]) && !self.string_at(current + 1, &["CE", "CI"])
        {
            current + 2
        } else {
            current + 1
        }
    }

    fn ch(&mut self, current: isize) -> isize {
        // "Michael"
        if current > 0 && self.string_at(current, &["CHAE"]) {
            self.add2("K", "X");
            return current + 2;
        }
        // Greek roots ("chemistry", "chorus")
        if current == 0
            && (self.string_at(current + 1, &["HARAC", "HARIS"])
                || self.string_at(current + 1, &["HOR", "HYM", "HIA", "HEM"]))
            && !self.string_at(0, &["CHORE"])
        {
            self.add("K");
            return current + 2;
        }
        let hard = self.germanic()
            || self.string_at(current - 2, &["ORCHES", "ARCHIT", "ORCHID"])
            || self.string_at(current + 2, &["T", "S"])
            || ((self.string_at(current - 1, &["A", "O", "U", "E"]) || current == 0)
                && self.string_at(
                    current + 2,
                    &["L", "R", "N", "M", "B", "H", "F", "V", "W", " "],
                ));
        if hard {
            self.add("K");
        } else if current > 0 {
            if self.string_at(0, &["MC"]) {
                self.add("K");
            } else {
                self.add2("X", "K");
            }
        } else {
            self.add("X");
        }
        current + 2
    }

    fn d(&mut self, current: isize) -> isize {
        if self.string_at(current, &["DG"]) {
            if self.string_at(current + 2, &["I", "E", "Y"]) {
                // "edge"
                self.add("J");
                return current + 3;
            }
            // "edgar"
            self.add("TK");
            return current + 2;
        }
        self.add("T");
        if self.string_at(current, &["DT", "DD"]) {
            current + 2
        } else {
            current + 1
        }
    }

    fn g(&mut self, current: isize) -> isize {
        if self.at(current + 1) == 'H' {
            return self.gh(current);
        }
        if self.at(current + 1) == 'N' {
            if current == 1 && self.is_vowel(0) && !self.slavo_germanic {
                self.add2("KN", "N");
            } else if !self.string_at(current + 2, &["EY"])
                && self.at(current + 1) != 'Y'
                && !self.slavo_germanic
            {
                self.add2("N", "KN");
            } else {
                self.add("KN");
            }
            return current + 2;
        }
        // "tagliaro"
        if self.string_at(current + 1, &["LI"]) && !self.slavo_germanic {
            self.add2("KL", "L");
            return current + 2;
        }
        if current == 0
            && (self.at(current + 1) == 'Y'
                || self.string_at(
                    current + 1,
                    &["ES", "EP", "EB", "EL", "EY", "IB", "IL", "IN", "IE", "EI", "ER"],
                ))
        {
            self.add2("K", "J");
            return current + 2;
        }
        // "-ger-", "-gy-"
        if (self.string_at(current + 1, &["ER"]) || self.at(current + 1) == 'Y')
            && !self.string_at(0, &["DANGER", "RANGER", "MANGER"])
            && !self.string_at(current - 1, &["E", "I"])
            && !self.string_at(current - 1, &["RGY", "OGY"])
        {
            self.add2("K", "J");
            return current + 2;
        }
        // Italian "biaggi"
        if self.string_at(current + 1, &["E", "I", "Y"])
            || self.string_at(current - 1, &["AGGI", "OGGI"])
        {
            if self.germanic() || self.string_at(current + 1, &["ET"]) {
                self.add("K");
            } else if self.string_at(current + 1, &["IER "]) {
                self.add("J");
            } else {
                self.add2("J", "K");
            }
            return current + 2;
        }
        self.add("K");
        self.skip_double(current, 'G')
    }

    fn gh(&mut self, current: isize) -> isize {
        if current > 0 && !self.is_vowel(current - 1) {
            self.add("K");
            return current + 2;
        }
        // "ghislane"
        if current == 0 {
            if self.at(current + 2) == 'I' {
                self.add("J");
            } else {
                self.add("K");
            }
            return current + 2;
        }
        // Silent after B, H or D ("hugh", "bough", "broughton")
        if (current > 1 && self.string_at(current - 2, &["B", "H", "D"]))
            || (current > 2 && self.string_at(current - 3, &["B", "H", "D"]))
            || (current > 3 && self.string_at(current - 4, &["B", "H"]))
        {
            return current + 2;
        }
        // "laugh", "cough", "tough"
        if current > 2
            && self.at(current - 1) == 'U'
            && self.string_at(current - 3, &["C", "G", "L", "R", "T"])
        {
            self.add("F");
        } else if current > 0 && self.at(current - 1) != 'I' {
            self.add("K");
        }
        current + 2
    }

    fn j(&mut self, current: isize) -> isize {
        // Spanish "jose", "san jacinto"
        if self.string_at(current, &["JOSE"]) || self.string_at(0, &["SAN "]) {
            if (current == 0 && self.at(current + 4) == ' ') || self.string_at(0, &["SAN "]) {
                self.add("H");
            } else {
                self.add2("J", "H");
            }
            return current + 1;
        }
        if current == 0 {
            self.add2("J", "A");
        } else if self.is_vowel(current - 1)
            && !self.slavo_germanic
            && (self.at(current + 1) == 'A' || self.at(current + 1) == 'O')
        {
            self.add2("J", "H");
        } else if current == self.last {
            self.add2("J", "");
        } else if !self.string_at(current + 1, &["L", "T", "K", "S", "N", "M", "B", "Z"])
            && !self.string_at(current - 1, &["S", "K", "L"])
        {
            self.add("J");
        }
        self.skip_double(current, 'J')
    }

    fn l(&mut self, current: isize) -> isize {
        if self.at(current + 1) != 'L' {
            self.add("L");
            return current + 1;
        }
        // Spanish "cabrillo", "gallegos"
        let spanish = (current == self.last - 2
            && self.string_at(current - 1, &["ILLO", "ILLA", "ALLE"]))
            || ((self.string_at(self.last - 1, &["AS", "OS"])
                || self.string_at(self.last, &["A", "O"]))
                && self.string_at(current - 1, &["ALLE"]));
        if spanish {
            self.add2("L", "");
        } else {
            self.add("L");
        }
        current + 2
    }

    fn s(&mut self, current: isize) -> isize {
        // "island", "carlisle"
        if self.string_at(current - 1, &["ISL", "YSL"]) {
            return current + 1;
        }
        if current == 0 && self.string_at(current, &["SUGAR"]) {
            self.add2("X", "S");
            return current + 1;
        }
        if self.string_at(current, &["SH"]) {
            if self.string_at(current + 1, &["HEIM", "HOEK", "HOLM", "HOLZ"]) {
                self.add("S");
            } else {
                self.add("X");
            }
            return current + 2;
        }
        if self.string_at(current, &["SIO", "SIA"]) || self.string_at(current, &["SIAN"]) {
            if self.slavo_germanic {
                self.add("S");
            } else {
                self.add2("S", "X");
            }
            return current + 3;
        }
        // "smith" vs "schmidt", "snider" vs "schneider", slavic "-sz-"
        if (current == 0 && self.string_at(current + 1, &["M", "N", "L", "W"]))
            || self.string_at(current + 1, &["Z"])
        {
            self.add2("S", "X");
            return self.skip_double(current, 'Z');
        }
        if self.string_at(current, &["SC"]) {
            if self.at(current + 2) == 'H' {
                // Dutch "school", "schooner", "schermerhorn"
                if self.string_at(current + 3, &["OO", "ER", "EN", "UY", "ED", "EM"]) {
                    if self.string_at(current + 3, &["ER", "EN"]) {
                        self.add2("X", "SK");
                    } else {
                        self.add("SK");
                    }
                } else if current == 0 && !self.is_vowel(3) && self.at(3) != 'W' {
                    self.add2("X", "S");
                } else {
                    self.add("X");
                }
                return current + 3;
            }
            if self.string_at(current + 2, &["I", "E", "Y"]) {
                self.add("S");
            } else {
                self.add("SK");
            }
            return current + 3;
        }
        // French "resnais", "artois"
        if current == self.last && self.string_at(current - 2, &["AI", "OI"]) {
            self.add2("", "S");
        } else {
            self.add("S");
        }
        if self.string_at(current + 1, &["S", "Z"]) {
            current + 2
        } else {
            current + 1
        }
    }

    fn t(&mut self, current: isize) -> isize {
        if self.string_at(current, &["TION"]) || self.string_at(current, &["TIA", "TCH"]) {
            self.add("X");
            return current + 3;
        }
        if self.string_at(current, &["TH"]) || self.string_at(current, &["TTH"]) {
            // "thomas", "thames", germanic
            if self.string_at(current + 2, &["OM", "AM"]) || self.germanic() {
                self.add("T");
            } else {
                self.add2("0", "T");
            }
            return current + 2;
        }
        self.add("T");
        if self.string_at(current + 1, &["T", "D"]) {
            current + 2
        } else {
            current + 1
        }
    }

    fn w(&mut self, current: isize) -> isize {
        if self.string_at(current, &["WR"]) {
            self.add("R");
            return current + 2;
        }
        if current == 0 && (self.is_vowel(current + 1) || self.string_at(current, &["WH"])) {
            // "Wasserman" matches "Vasserman"
            if self.is_vowel(current + 1) {
                self.add2("A", "F");
            } else {
                self.add("A");
            }
        }
        // "Arnow" matches "Arnoff"
        if (current == self.last && self.is_vowel(current - 1))
            || self.string_at(current - 1, &["EWSKI", "EWSKY", "OWSKI", "OWSKY"])
            || self.string_at(0, &["SCH"])
        {
            self.add2("", "F");
            return current + 1;
        }
        // Polish "filipowicz"
        if self.string_at(current, &["WICZ", "WITZ"]) {
            self.add2("TS", "FX");
            return current + 4;
        }
        current + 1
    }

    fn z(&mut self, current: isize) -> isize {
        // Pinyin "zhao"
        if self.at(current + 1) == 'H' {
            self.add("J");
            return current + 2;
        }
        if self.string_at(current + 1, &["ZO", "ZI", "ZA"])
            || (self.slavo_germanic && current > 0 && self.at(current - 1) != 'T')
        {
            self.add2("S", "TS");
        } else {
            self.add("S");
        }
        self.skip_double(current, 'Z')
    }
}
