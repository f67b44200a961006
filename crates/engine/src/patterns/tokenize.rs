//! Implicit-span tokenization
//!
//! Older schemas left token spans optional: a paragraph's text might carry
//! explicit spans for some tokens and nothing for the rest. Steps that make
//! tokenization mandatory reconstruct the missing structure: produce the
//! minimal additional spans so that every maximal run of word-forming
//! characters and every maximal run of punctuation is covered by exactly one
//! span, without ever overlapping a span that already exists.
//!
//! Single forward pass, O(length of text), restartable per paragraph.

use std::collections::BTreeMap;

/// Classification of an emitted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Maximal run of word-forming characters.
    Word,
    /// Maximal run of punctuation characters.
    Punctuation,
}

/// One emitted token span. Offsets are byte offsets into the paragraph
/// text, always on `char` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    /// Byte offset of the first character.
    pub begin: usize,
    /// Byte offset just past the last character.
    pub end: usize,
    /// Word or punctuation.
    pub kind: SpanKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InWhitespace,
    InWord,
    InPunctuation,
}

fn classify(c: char) -> State {
    if c.is_whitespace() {
        State::InWhitespace
    } else if c.is_alphanumeric() {
        State::InWord
    } else {
        State::InPunctuation
    }
}

/// Produce the implicit spans for one paragraph.
///
/// `explicit` maps span start (byte offset) to span length (bytes) for the
/// spans that already exist; an explicit span always wins, so scanning skips
/// past it and nothing emitted ever overlaps it. Emitted spans appear in
/// text order.
pub fn fill_implicit_spans(text: &str, explicit: &BTreeMap<usize, usize>) -> Vec<TokenSpan> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut state = State::InWhitespace;
    // Start offset of the run being collected, None while suppressed or in
    // whitespace.
    let mut run_begin: Option<usize> = None;
    let mut i = 0usize;

    while i < chars.len() {
        let (offset, c) = chars[i];

        if let Some(len) = explicit.get(&offset) {
            // An existing span wins: close any open run at its edge and skip
            // past it.
            emit(&mut out, &mut run_begin, state, offset);
            state = State::InWhitespace;
            let resume = offset + len.max(&1);
            while i < chars.len() && chars[i].0 < resume {
                i += 1;
            }
            continue;
        }

        let next = classify(c);
        if next != state {
            emit(&mut out, &mut run_begin, state, offset);
            if next != State::InWhitespace {
                run_begin = Some(offset);
            }
            state = next;
        }
        i += 1;
    }
    emit(&mut out, &mut run_begin, state, text.len());
    out
}

fn emit(out: &mut Vec<TokenSpan>, run_begin: &mut Option<usize>, state: State, end: usize) {
    if let Some(begin) = run_begin.take() {
        if end > begin {
            let kind = match state {
                State::InWord => SpanKind::Word,
                State::InPunctuation => SpanKind::Punctuation,
                State::InWhitespace => return,
            };
            out.push(TokenSpan { begin, end, kind });
        }
    }
}
