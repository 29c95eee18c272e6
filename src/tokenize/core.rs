/// Whitespace lookup table for branchless word boundary detection.
/// C locale `isspace()`: space, tab, newline, CR, form feed, vertical tab.
const fn make_ws_table() -> [bool; 256] {
    let mut t = [false; 256];
    t[0x09] = true; // \t  horizontal tab
    t[0x0A] = true; // \n  newline
    t[0x0B] = true; // \v  vertical tab
    t[0x0C] = true; // \f  form feed
    t[0x0D] = true; // \r  carriage return
    t[0x20] = true; //     space
    t
}

const WS_TABLE: [bool; 256] = make_ws_table();

/// True if `b` separates raw tokens.
#[inline(always)]
pub fn is_space(b: u8) -> bool {
    WS_TABLE[b as usize]
}

/// Normalize a raw token into a word: drop every byte that is not an ASCII
/// letter and lowercase the rest. Returns `None` if no letter survives.
///
/// `clean(b"Hello!") == Some("hello")`, `clean(b"...") == None`.
pub fn clean(raw: &[u8]) -> Option<String> {
    let mut word = String::with_capacity(raw.len());
    if clean_into(raw, &mut word) {
        Some(word)
    } else {
        None
    }
}

/// Allocation-free variant of [`clean`] for hot loops: clears `out`, writes
/// the normalized word into it and returns whether it is non-empty.
#[inline]
pub fn clean_into(raw: &[u8], out: &mut String) -> bool {
    out.clear();
    for &b in raw {
        if b.is_ascii_alphabetic() {
            out.push(b.to_ascii_lowercase() as char);
        }
    }
    !out.is_empty()
}

/// Iterator over the maximal non-whitespace runs of a byte slice.
pub struct RawTokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for RawTokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let data = self.data;
        let mut i = self.pos;
        while i < data.len() && is_space(data[i]) {
            i += 1;
        }
        if i == data.len() {
            self.pos = i;
            return None;
        }
        let start = i;
        while i < data.len() && !is_space(data[i]) {
            i += 1;
        }
        self.pos = i;
        Some(&data[start..i])
    }
}

/// Split `data` on whitespace runs, left to right. Leading, trailing and
/// repeated whitespace produce no empty tokens.
#[inline]
pub fn raw_tokens(data: &[u8]) -> RawTokens<'_> {
    RawTokens { data, pos: 0 }
}

/// Visit every word of `data` in order. Returns the number of words visited.
pub fn for_each_word(data: &[u8], mut on_word: impl FnMut(&str)) -> u64 {
    let mut word = String::with_capacity(32);
    let mut emitted = 0u64;
    for raw in raw_tokens(data) {
        if clean_into(raw, &mut word) {
            on_word(&word);
            emitted += 1;
        }
    }
    emitted
}

/// Index of the last whitespace byte in `data`, if any.
#[inline]
pub fn last_space(data: &[u8]) -> Option<usize> {
    data.iter().rposition(|&b| is_space(b))
}

/// Index of the first whitespace byte in `data`, if any.
#[inline]
pub fn first_space(data: &[u8]) -> Option<usize> {
    data.iter().position(|&b| is_space(b))
}
