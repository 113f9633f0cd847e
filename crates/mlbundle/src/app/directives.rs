//! Directive recognition in OCaml toplevel sources.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::domain::model::{Directive, DirectiveKind};

// Sources are scanned as raw bytes so non-UTF-8 files (Latin-1 comments)
// pass through untouched. The path is lazy and single-line so a match stops
// at the first `";;`.
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)#(use|load) "([^\n]+?)";;"#).expect("directive pattern is valid")
});

/// Find every `#use`/`#load` directive in `source`, in source order.
pub fn scan(source: &[u8]) -> Vec<Directive> {
    let mut directives = Vec::new();
    let mut line = 1;
    let mut counted_to = 0;

    for captures in DIRECTIVE.captures_iter(source) {
        let (Some(whole), Some(keyword), Some(path)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        let Some(kind) = std::str::from_utf8(keyword.as_bytes())
            .ok()
            .and_then(DirectiveKind::from_keyword)
        else {
            continue;
        };

        line += source[counted_to..whole.start()]
            .iter()
            .filter(|&&byte| byte == b'\n')
            .count();
        counted_to = whole.start();

        let path = String::from_utf8_lossy(path.as_bytes()).into_owned();
        tracing::trace!(?kind, %path, line, "directive");
        directives.push(Directive {
            kind,
            path,
            span: whole.range(),
            line,
        });
    }

    directives
}
