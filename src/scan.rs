//! Scan Module for the style compiler
//!
//! Splits stylesheet text into top-level segments: statements terminated by
//! `;`, blocks (`header { body }`) and block comments. Block bodies are kept
//! verbatim, nested braces and comments included, so the parser can re-scan
//! them with the block's own scope active.

use crate::validate::{CompilerError, SourceLocation};
use std::mem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text before a depth-0 `;`, trimmed.
    Statement {
        text: String,
        location: SourceLocation,
    },
    /// A depth-0 block with a non-blank body.
    Block {
        header: String,
        body: String,
        location: SourceLocation,
        body_origin: SourceLocation,
    },
    /// Text between `/*` and `*/` at depth 0, outside any statement.
    Comment {
        text: String,
        location: SourceLocation,
    },
}

/// Character-level state machine over one stylesheet fragment.
///
/// Yields segments online, so callers can classify each one before the rest
/// of the input has been read.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    loc: SourceLocation,

    depth: usize,
    in_string: Option<char>,
    in_line_comment: bool,
    in_block_comment: bool,

    header: String,
    header_start: Option<SourceLocation>,
    body: String,
    body_origin: SourceLocation,
    open_at: SourceLocation,
    comment: String,
    comment_start: SourceLocation,

    finished: bool,
    failed: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self::with_origin(source, SourceLocation::start())
    }

    /// Scan `source` as if it started at `origin` in the enclosing text.
    pub fn with_origin(source: &str, origin: SourceLocation) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            loc: origin,
            depth: 0,
            in_string: None,
            in_line_comment: false,
            in_block_comment: false,
            header: String::new(),
            header_start: None,
            body: String::new(),
            body_origin: origin,
            open_at: origin,
            comment: String::new(),
            comment_start: origin,
            finished: false,
            failed: false,
        }
    }

    fn bump(&mut self) {
        if let Some(&ch) = self.chars.get(self.pos) {
            self.loc = self.loc.advance(ch);
            self.pos += 1;
        }
    }

    fn push(&mut self, ch: char, at: SourceLocation) {
        if self.depth > 0 {
            self.body.push(ch);
        } else {
            if self.header_start.is_none() && !ch.is_whitespace() {
                self.header_start = Some(at);
            }
            self.header.push(ch);
        }
    }

    fn take_header(&mut self, fallback: SourceLocation) -> (String, SourceLocation) {
        let text = mem::take(&mut self.header).trim().to_string();
        let location = self.header_start.take().unwrap_or(fallback);
        (text, location)
    }

    fn next_segment(&mut self) -> Result<Option<Segment>, CompilerError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            let next = self.chars.get(self.pos + 1).copied();
            let prev = if self.pos > 0 {
                Some(self.chars[self.pos - 1])
            } else {
                None
            };
            let here = self.loc;
            self.bump();

            if let Some(quote) = self.in_string {
                self.push(ch, here);
                if ch == '\\' {
                    if let Some(escaped) = next {
                        let at = self.loc;
                        self.bump();
                        self.push(escaped, at);
                    }
                } else if ch == quote || ch == '\n' {
                    self.in_string = None;
                }
                continue;
            }

            if self.in_line_comment {
                if ch == '\n' {
                    self.in_line_comment = false;
                    self.push(ch, here);
                } else if self.depth > 0 {
                    self.body.push(ch);
                }
                continue;
            }

            if self.in_block_comment {
                if ch == '*' && next == Some('/') {
                    self.bump();
                    self.in_block_comment = false;
                    // Comments inside a statement or header are dropped
                    let text = mem::take(&mut self.comment);
                    if self.depth > 0 {
                        self.body.push_str("*/");
                    } else if self.header_start.is_none() {
                        return Ok(Some(Segment::Comment {
                            text,
                            location: self.comment_start,
                        }));
                    }
                } else if self.depth > 0 {
                    self.body.push(ch);
                } else {
                    self.comment.push(ch);
                }
                continue;
            }

            match ch {
                '/' if next == Some('*') => {
                    self.bump();
                    self.in_block_comment = true;
                    self.comment_start = here;
                    if self.depth > 0 {
                        self.body.push_str("/*");
                    }
                }
                // `url(http://...)` is not a comment
                '/' if next == Some('/') && prev != Some(':') => {
                    self.bump();
                    self.in_line_comment = true;
                    if self.depth > 0 {
                        self.body.push_str("//");
                    }
                }
                '"' | '\'' => {
                    self.in_string = Some(ch);
                    self.push(ch, here);
                }
                '{' => {
                    self.depth += 1;
                    if self.depth == 1 {
                        self.open_at = here;
                        self.body_origin = self.loc;
                    } else {
                        self.body.push(ch);
                    }
                }
                '}' => {
                    if self.depth == 0 {
                        return Err(CompilerError::unbalanced_block(
                            here,
                            Some("unexpected `}`".to_string()),
                        ));
                    }
                    self.depth -= 1;
                    if self.depth > 0 {
                        self.body.push(ch);
                        continue;
                    }

                    let (header, location) = self.take_header(self.open_at);
                    let body = mem::take(&mut self.body);
                    // Empty blocks never produce output
                    if body.trim().is_empty() {
                        continue;
                    }
                    return Ok(Some(Segment::Block {
                        header,
                        body,
                        location,
                        body_origin: self.body_origin,
                    }));
                }
                ';' if self.depth == 0 => {
                    let (text, location) = self.take_header(here);
                    if text.is_empty() {
                        continue;
                    }
                    return Ok(Some(Segment::Statement { text, location }));
                }
                _ => self.push(ch, here),
            }
        }

        if self.finished {
            return Ok(None);
        }
        self.finished = true;

        if self.depth > 0 {
            let header = self.header.trim();
            let context = if header.is_empty() {
                "unclosed `{`".to_string()
            } else {
                format!("unclosed block `{}`", header)
            };
            return Err(CompilerError::unbalanced_block(self.open_at, Some(context)));
        }

        // Last declaration without a terminating `;`
        let (text, location) = self.take_header(self.loc);
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Segment::Statement { text, location }))
        }
    }
}

impl Iterator for Scanner {
    type Item = Result<Segment, CompilerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_segment() {
            Ok(Some(segment)) => Some(Ok(segment)),
            Ok(None) => None,
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

/// Scan a whole fragment eagerly.
pub fn scan(source: &str) -> Result<Vec<Segment>, CompilerError> {
    Scanner::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ErrorKind;

    fn texts(segments: &[Segment]) -> Vec<String> {
        segments
            .iter()
            .map(|s| match s {
                Segment::Statement { text, .. } => format!("stmt:{}", text),
                Segment::Block { header, body, .. } => format!("block:{}|{}", header, body),
                Segment::Comment { text, .. } => format!("comment:{}", text),
            })
            .collect()
    }

    #[test]
    fn test_statements_split_on_semicolon() {
        let segments = scan("a:b; c : d ;").unwrap();
        assert_eq!(texts(&segments), vec!["stmt:a:b", "stmt:c : d"]);
    }

    #[test]
    fn test_nested_body_kept_verbatim() {
        let segments = scan(".a{color:red;.b{x:y;}}").unwrap();
        assert_eq!(texts(&segments), vec!["block:.a|color:red;.b{x:y;}"]);
    }

    #[test]
    fn test_empty_block_dropped() {
        assert!(scan(".a{   }").unwrap().is_empty());
        assert_eq!(texts(&scan(".a{ }.b{x:y;}").unwrap()), vec!["block:.b|x:y;"]);
    }

    #[test]
    fn test_block_comment_at_top_level() {
        let segments = scan("/* hi */.a{x:y;}").unwrap();
        assert_eq!(texts(&segments), vec!["comment: hi ", "block:.a|x:y;"]);
    }

    #[test]
    fn test_comment_stars_are_kept_inside_delimiters() {
        let segments = scan("/** doc **/").unwrap();
        assert_eq!(texts(&segments), vec!["comment:* doc *"]);
    }

    #[test]
    fn test_comment_inside_statement_is_dropped() {
        let segments = scan("color:/*x*/red;/* after */").unwrap();
        assert_eq!(texts(&segments), vec!["stmt:color:red", "comment: after "]);
        let segments = scan(".a /* x */ {y:z;}").unwrap();
        assert_eq!(texts(&segments), vec!["block:.a|y:z;"]);
    }

    #[test]
    fn test_line_comment_discarded() {
        let segments = scan("// note; {\n.a{x:y;}").unwrap();
        assert_eq!(texts(&segments), vec!["block:.a|x:y;"]);
    }

    #[test]
    fn test_comments_inside_body_are_verbatim() {
        let segments = scan(".a{/* } */x:y; // }\n}").unwrap();
        assert_eq!(texts(&segments), vec!["block:.a|/* } */x:y; // }\n"]);
    }

    #[test]
    fn test_url_is_not_a_line_comment() {
        let segments = scan("background:url(http://x/y.png);").unwrap();
        assert_eq!(texts(&segments), vec!["stmt:background:url(http://x/y.png)"]);
    }

    #[test]
    fn test_quoted_text_is_opaque() {
        let segments = scan(r#"content:"a;b{";.a{content:'}';}"#).unwrap();
        assert_eq!(
            texts(&segments),
            vec![r#"stmt:content:"a;b{""#, "block:.a|content:'}';"]
        );
    }

    #[test]
    fn test_trailing_statement_without_semicolon() {
        let segments = scan("color:red").unwrap();
        assert_eq!(texts(&segments), vec!["stmt:color:red"]);
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let err = scan(".a{color:red;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnbalancedBlock);
        assert_eq!((err.line, err.column), (1, 3));
        assert_eq!(err.context.as_deref(), Some("unclosed block `.a`"));
    }

    #[test]
    fn test_stray_closing_brace_is_an_error() {
        let err = scan(".a{x:y;}}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnbalancedBlock);
        assert_eq!((err.line, err.column), (1, 9));
    }

    #[test]
    fn test_segment_locations() {
        let segments = scan("\n  .a{\n    x:y;}").unwrap();
        match &segments[0] {
            Segment::Block {
                location,
                body_origin,
                ..
            } => {
                assert_eq!(*location, SourceLocation { line: 2, column: 3 });
                assert_eq!(*body_origin, SourceLocation { line: 2, column: 6 });
            }
            other => panic!("expected block, got {:?}", other),
        }

        let inner: Vec<Segment> =
            Scanner::with_origin("\n    x:y;", SourceLocation { line: 2, column: 6 })
                .collect::<Result<_, _>>()
                .unwrap();
        assert_eq!(
            inner,
            vec![Segment::Statement {
                text: "x:y".to_string(),
                location: SourceLocation { line: 3, column: 5 },
            }]
        );
    }

    #[test]
    fn test_scanner_stops_after_error() {
        let mut scanner = Scanner::new("}a:b;");
        assert!(matches!(scanner.next(), Some(Err(_))));
        assert!(scanner.next().is_none());
    }
}
