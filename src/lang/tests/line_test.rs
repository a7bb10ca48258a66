use super::*;

#[test]
fn test_lf() {
    let l = Line::new("run\n").unwrap();
    assert_eq!(l.tokens().len(), 1);
    assert!(l.tokens()[0].is("RUN"));
}

#[test]
fn test_crlf() {
    let l = Line::new("list\r\n").unwrap();
    assert!(l.tokens()[0].is("LIST"));
}

#[test]
fn test_line_number_and_label() {
    let l = Line::new("100 again: print x").unwrap();
    assert_eq!(l.number(), Some(100));
    assert_eq!(l.label(), Some("AGAIN"));
    assert_eq!(l.text(), "print x");
    assert!(l.tokens()[0].is("PRINT"));
    assert_eq!(l.tokens()[1].column, 6..7);
}

#[test]
fn test_label_only() {
    let l = Line::new("done:").unwrap();
    assert_eq!(l.label(), Some("DONE"));
    assert!(l.is_empty());
}

#[test]
fn test_display() {
    let l = Line::new("20   x: END").unwrap();
    assert_eq!(l.to_string(), "20 X: END");
}

#[test]
fn test_rem_ends_tokens() {
    let l = Line::new("rem this is ignored ) \"").unwrap();
    assert_eq!(l.tokens().len(), 1);
}

#[test]
fn test_unterminated_string_has_line_number() {
    let e = Line::new("30 print \"oops").unwrap_err();
    assert_eq!(e.code(), ErrorCode::SyntaxError);
    assert_eq!(e.line_number(), Some(30));
    assert_eq!(e.column(), 6..11);
}
