//! External scanner adapter and the heredoc scanner.

use std::{cell::Cell, rc::Rc};

use sitter_runtime::{
    ExternalScanner,
    Lexer,
    ScannerSession,
    ScannerSnapshot,
    SourceLexer,
    Token,
    external::{
        SERIALIZATION_BUFFER_SIZE,
        HeredocScanner,
        heredoc::{HEREDOC_BODY, HEREDOC_START, MAX_DELIMITER_LEN},
    },
    sample,
};

const START: &[bool] = &[true, false];
const BODY: &[bool] = &[false, true];
const BOTH: &[bool] = &[true, true];

fn scan_at(scanner: &mut dyn ExternalScanner, src: &str, at: usize, valid: &[bool]) -> Option<Token> {
    let mut lexer = SourceLexer::new(src);
    lexer.reset(at);
    scanner.scan(&mut lexer, valid).then(|| lexer.finish_token())
}

fn session_scan(session: &mut ScannerSession, src: &str, at: usize, valid: &[bool]) -> Option<Token> {
    let mut lexer = SourceLexer::new(src);
    lexer.reset(at);
    session.scan(&mut lexer, valid).then(|| lexer.finish_token())
}

fn tok(symbol: u16, start: usize, end: usize) -> Option<Token> {
    Some(Token {
        symbol,
        start,
        len: end - start,
    })
}

#[test]
fn start_then_body() {
    let src = "<<EOF\nhello\nEOF";
    let mut s = HeredocScanner::new();
    assert_eq!(scan_at(&mut s, src, 0, START), tok(HEREDOC_START, 0, 5));
    assert_eq!(s.pending().map(|d| d.to_string()).collect::<Vec<_>>(), ["EOF"]);

    assert_eq!(scan_at(&mut s, src, 5, BODY), tok(HEREDOC_BODY, 5, src.len()));
    assert_eq!(s.pending().count(), 0);
}

#[test]
fn leading_blanks_are_skipped() {
    let mut s = HeredocScanner::new();
    assert_eq!(scan_at(&mut s, "  \t<<X", 0, START), tok(HEREDOC_START, 3, 6));
}

#[test]
fn body_ends_at_an_exact_delimiter_line() {
    let src = "<<EOF\n EOF\nEOFX\nEOF\nrest";
    let mut s = HeredocScanner::new();
    scan_at(&mut s, src, 0, START).expect("start");
    let body = scan_at(&mut s, src, 5, BODY).expect("body");
    assert_eq!(body.text(src), "\n EOF\nEOFX\nEOF");
}

#[test]
fn non_ascii_delimiter_content_is_compared_by_codepoint() {
    // delimiters are ASCII identifiers, body lines are arbitrary text
    let src = "<<END\nçà 中\nEN\nEND";
    let mut s = HeredocScanner::new();
    scan_at(&mut s, src, 0, START).expect("start");
    let body = scan_at(&mut s, src, 5, BODY).expect("body");
    assert_eq!(body.end(), src.len());
}

#[test]
fn rejected_inputs() {
    let mut s = HeredocScanner::new();
    assert_eq!(scan_at(&mut s, "<EOF", 0, START), None);
    assert_eq!(scan_at(&mut s, "<<1X", 0, START), None);
    assert_eq!(scan_at(&mut s, "<<", 0, START), None);
    assert_eq!(s.pending().count(), 0);

    // no pending heredoc: a body cannot start
    assert_eq!(scan_at(&mut s, "\nEOF", 0, BODY), None);

    scan_at(&mut s, "<<EOF", 0, START).expect("start");
    // body must start at the end of the start line
    assert_eq!(scan_at(&mut s, "x\nEOF", 0, BODY), None);
    // unterminated
    assert_eq!(scan_at(&mut s, "\nabc\nEO", 0, BODY), None);
    assert_eq!(s.pending().count(), 1);
}

#[test]
fn overlong_delimiter_is_rejected() {
    let mut s = HeredocScanner::new();
    let ok = format!("<<{}", "D".repeat(MAX_DELIMITER_LEN));
    let too_long = format!("<<{}", "D".repeat(MAX_DELIMITER_LEN + 1));
    assert!(scan_at(&mut s, &too_long, 0, START).is_none());
    assert!(scan_at(&mut s, &ok, 0, START).is_some());
}

#[test]
fn body_wins_when_both_are_valid() {
    let src = "<<A\nA";
    let mut s = HeredocScanner::new();
    scan_at(&mut s, src, 0, BOTH).expect("start");
    assert_eq!(scan_at(&mut s, src, 3, BOTH), tok(HEREDOC_BODY, 3, 5));
}

#[test]
fn snapshot_restores_pending_heredocs() {
    let src = "<<A <<LONG_DELIMITER_NAME\nx\nA\ny\nLONG_DELIMITER_NAME";
    let mut first = ScannerSession::create(HeredocScanner::boxed);
    assert_eq!(session_scan(&mut first, src, 0, START), tok(HEREDOC_START, 0, 3));
    let second_start = session_scan(&mut first, src, 3, START).expect("second start");
    assert_eq!(second_start.text(src), "<<LONG_DELIMITER_NAME");

    let snapshot = first.serialize().expect("snapshot fits");
    assert!(!snapshot.is_empty());

    // a fresh session resumed from the snapshot sees the same two bodies
    let mut resumed = ScannerSession::create(HeredocScanner::boxed);
    resumed.deserialize(&snapshot);
    let a = session_scan(&mut resumed, src, second_start.end(), BODY).expect("body A");
    assert_eq!(a.text(src), "\nx\nA");
    let b = session_scan(&mut resumed, src, a.end(), BODY).expect("body B");
    assert_eq!(b.end(), src.len());
    assert_eq!(resumed.serialize().expect("snapshot").as_bytes(), &[0]);

    // the original is unaffected by the copy
    assert_eq!(first.serialize().expect("snapshot"), snapshot);
    first.destroy();
}

#[test]
fn empty_snapshot_resets_to_initial_state() {
    let mut session = ScannerSession::create(HeredocScanner::boxed);
    session_scan(&mut session, "<<A", 0, START).expect("start");
    session.deserialize(&ScannerSnapshot::default());
    assert_eq!(session_scan(&mut session, "\nA", 0, BODY), None);
}

fn scan_bodies(scanner: &mut HeredocScanner, src: &str) -> Vec<Token> {
    let mut bodies = Vec::new();
    let mut at = 0;
    while let Some(t) = scan_at(scanner, src, at, BODY) {
        at = t.end();
        bodies.push(t);
    }
    bodies
}

#[test]
fn snapshot_stays_within_the_buffer() {
    let delim = "D".repeat(250);
    let src = format!("<<{delim}1 <<{delim}2 <<{delim}3 <<{delim}4 <<{delim}5");
    let mut s = HeredocScanner::new();
    let mut at = 0;
    while let Some(t) = scan_at(&mut s, &src, at, START) {
        at = t.end();
    }
    // a fifth delimiter would not fit a snapshot, so it is not opened
    assert_eq!(s.pending().count(), 4);
    assert_eq!(at, src.rfind(" <<").unwrap());
    assert_eq!(s.snapshot_len(), 1 + 4 * 252);

    let mut buf = [0u8; SERIALIZATION_BUFFER_SIZE];
    let len = s.serialize(&mut buf);
    assert_eq!(len, s.snapshot_len());

    let mut restored = HeredocScanner::new();
    restored.deserialize(&buf[..len]);
    assert_eq!(restored, s);

    let body = format!("\nx\n{delim}1\ny\n{delim}2\n{delim}3\n{delim}4");
    let expected = scan_bodies(&mut s, &body);
    assert_eq!(expected.len(), 4);
    assert_eq!(scan_bodies(&mut restored, &body), expected);
}

#[test]
fn pending_count_fits_one_byte() {
    let src = "<<A ".repeat(300);
    let mut s = HeredocScanner::new();
    let mut at = 0;
    while let Some(t) = scan_at(&mut s, &src, at, START) {
        at = t.end();
    }
    assert_eq!(s.pending().count(), 255);

    let mut buf = [0u8; SERIALIZATION_BUFFER_SIZE];
    let len = s.serialize(&mut buf);
    assert_eq!(buf[0], 255);
    let mut restored = HeredocScanner::new();
    restored.deserialize(&buf[..len]);
    assert_eq!(restored, s);
}

struct Misbehaving;

impl ExternalScanner for Misbehaving {
    fn scan(&mut self, _: &mut dyn Lexer, _: &[bool]) -> bool {
        false
    }

    fn serialize(&self, _: &mut [u8; SERIALIZATION_BUFFER_SIZE]) -> usize {
        SERIALIZATION_BUFFER_SIZE + 1
    }

    fn deserialize(&mut self, _: &[u8]) {}
}

#[test]
fn oversized_state_is_an_error() {
    let mut session = ScannerSession::from_scanner(Box::new(Misbehaving));
    assert!(session.serialize().is_err());
    assert!(ScannerSnapshot::from_bytes(&[0; SERIALIZATION_BUFFER_SIZE + 1]).is_err());
    assert!(ScannerSnapshot::from_bytes(&[0; SERIALIZATION_BUFFER_SIZE]).is_ok());
}

struct Counting(Rc<Cell<u32>>);

impl ExternalScanner for Counting {
    fn scan(&mut self, _: &mut dyn Lexer, _: &[bool]) -> bool {
        self.0.set(self.0.get() + 1);
        false
    }

    fn serialize(&self, _: &mut [u8; SERIALIZATION_BUFFER_SIZE]) -> usize {
        0
    }

    fn deserialize(&mut self, _: &[u8]) {}
}

#[test]
fn scanner_is_not_called_without_valid_tokens() {
    let calls = Rc::new(Cell::new(0));
    let mut session = ScannerSession::from_scanner(Box::new(Counting(calls.clone())));
    let mut lexer = SourceLexer::new("x");
    assert!(!session.scan(&mut lexer, &[false, false]));
    assert!(!session.scan(&mut lexer, &[]));
    assert_eq!(calls.get(), 0);
    assert!(!session.scan(&mut lexer, &[false, true]));
    assert_eq!(calls.get(), 1);
}

#[test]
fn sample_language_wires_the_scanner() {
    let language = sample::language().expect("sample language");
    assert!(language.external_scanner().is_some());
    assert_eq!(language.enabled_external_tokens(0), &[] as &[bool]);
    assert_eq!(language.enabled_external_tokens(1), START);
    assert_eq!(language.enabled_external_tokens(2), BODY);
    assert_eq!(language.enabled_external_tokens(3), &[] as &[bool]);
    assert_eq!(language.lex_mode(7).external_lex_state, 2);
    assert_eq!(
        language.external_symbol(HEREDOC_BODY),
        Some(sample::SampleSymbol::HeredocBody.id())
    );
}
