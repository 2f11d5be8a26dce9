//! Structured rich text for achievement bullets.
//!
//! Stored and exchanged as a string of a small markup subset, but held in memory as an
//! inline AST. Anything outside the subset is stripped on parse, and output always goes
//! through [`RichText::to_markup`], which escapes every text node and attribute.

use serde::{Deserialize, Serialize};

/// Schemes a link may point to. Everything else loses its link wrapper.
const SAFE_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

/// Tags whose content is dropped entirely.
const OPAQUE_TAGS: &[&str] = &["script", "style", "iframe", "object", "template"];

/// Block tags whose end (or a `<br>`) becomes a line break.
const BLOCK_TAGS: &[&str] = &["p", "div", "li", "h1", "h2", "h3", "ol", "ul"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Underline(Vec<Inline>),
    Strike(Vec<Inline>),
    Link { href: String, children: Vec<Inline> },
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RichText(Vec<Inline>);

impl RichText {
    /// Plain text, no formatting.
    pub fn plain(text: &str) -> Self {
        let mut nodes = Vec::new();
        push_text(&mut nodes, text);
        RichText(nodes)
    }

    pub fn inlines(&self) -> &[Inline] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses markup, keeping only the supported subset.
    pub fn parse(markup: &str) -> Self {
        Parser::new(markup).run()
    }

    /// Serializes to escaped markup. Parsing the output yields an equal value.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_inlines(&mut out, &self.0);
        out
    }

    /// The text content with formatting removed; line breaks become spaces.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(&mut out, &self.0);
        out
    }
}

impl From<String> for RichText {
    fn from(markup: String) -> Self {
        RichText::parse(&markup)
    }
}

impl From<RichText> for String {
    fn from(text: RichText) -> Self {
        text.to_markup()
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_inlines(out: &mut String, nodes: &[Inline]) {
    for node in nodes {
        match node {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Bold(children) => wrap(out, "b", children),
            Inline::Italic(children) => wrap(out, "i", children),
            Inline::Underline(children) => wrap(out, "u", children),
            Inline::Strike(children) => wrap(out, "s", children),
            Inline::Link { href, children } => {
                out.push_str("<a href=\"");
                out.push_str(&escape_html(href));
                out.push_str("\">");
                write_inlines(out, children);
                out.push_str("</a>");
            }
            Inline::LineBreak => out.push_str("<br>"),
        }
    }
}

fn wrap(out: &mut String, tag: &str, children: &[Inline]) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_inlines(out, children);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn collect_text(out: &mut String, nodes: &[Inline]) {
    for node in nodes {
        match node {
            Inline::Text(text) => out.push_str(text),
            Inline::LineBreak => out.push(' '),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Underline(children)
            | Inline::Strike(children)
            | Inline::Link { children, .. } => collect_text(out, children),
        }
    }
}

fn push_text(nodes: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Inline::Text(text.to_string()));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Link(Option<String>),
}

impl Mark {
    fn from_tag(name: &str, attrs: &str) -> Option<Self> {
        match name {
            "b" | "strong" => Some(Mark::Bold),
            "i" | "em" => Some(Mark::Italic),
            "u" => Some(Mark::Underline),
            "s" | "strike" | "del" => Some(Mark::Strike),
            "a" => Some(Mark::Link(safe_href(attrs))),
            _ => None,
        }
    }

    fn closes(&self, name: &str) -> bool {
        matches!(
            (self, name),
            (Mark::Bold, "b" | "strong")
                | (Mark::Italic, "i" | "em")
                | (Mark::Underline, "u")
                | (Mark::Strike, "s" | "strike" | "del")
                | (Mark::Link(_), "a")
        )
    }
}

struct Frame {
    mark: Mark,
    children: Vec<Inline>,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    root: Vec<Inline>,
    stack: Vec<Frame>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Vec<Inline> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn run(mut self) -> RichText {
        let input = self.input;
        while self.pos < input.len() {
            let rest = &input[self.pos..];
            match rest.find('<') {
                Some(0) => self.tag(),
                Some(n) => {
                    let text = decode_entities(&rest[..n]);
                    push_text(self.current(), &text);
                    self.pos += n;
                }
                None => {
                    let text = decode_entities(rest);
                    push_text(self.current(), &text);
                    self.pos = input.len();
                }
            }
        }
        while !self.stack.is_empty() {
            self.close_top();
        }
        trim_breaks(&mut self.root);
        RichText(self.root)
    }

    fn tag(&mut self) {
        let input = self.input;
        let rest = &input[self.pos..];

        if rest.starts_with("<!--") {
            self.pos += rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            return;
        }

        let starts_tag = rest[1..]
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '/')
            .unwrap_or(false);
        let end = match rest.find('>') {
            Some(end) if starts_tag => end,
            _ => {
                push_text(self.current(), "<");
                self.pos += 1;
                return;
            }
        };

        let inner = rest[1..end].trim();
        self.pos += end + 1;

        let closing = inner.starts_with('/');
        let inner = inner.trim_start_matches('/').trim_end_matches('/');
        let name_len = inner
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(inner.len());
        let name = inner[..name_len].to_ascii_lowercase();
        let attrs = &inner[name_len..];

        if closing {
            self.close(&name);
        } else if OPAQUE_TAGS.contains(&name.as_str()) {
            self.skip_opaque(&name);
        } else if name == "br" {
            self.current().push(Inline::LineBreak);
        } else if let Some(mark) = Mark::from_tag(&name, attrs) {
            self.stack.push(Frame {
                mark,
                children: Vec::new(),
            });
        }
    }

    fn skip_opaque(&mut self, name: &str) {
        let closing = format!("</{name}");
        let rest = self.input[self.pos..].to_ascii_lowercase();
        self.pos += match rest.find(&closing) {
            Some(i) => rest[i..].find('>').map(|j| i + j + 1).unwrap_or(rest.len()),
            None => rest.len(),
        };
    }

    fn close(&mut self, name: &str) {
        if BLOCK_TAGS.contains(&name) {
            self.current().push(Inline::LineBreak);
            return;
        }
        let Some(depth) = self.stack.iter().rposition(|f| f.mark.closes(name)) else {
            return;
        };
        while self.stack.len() > depth {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let mut children = frame.children;
        trim_breaks(&mut children);
        let parent = self.current();
        if children.is_empty() {
            return;
        }
        let node = match frame.mark {
            Mark::Bold => Inline::Bold(children),
            Mark::Italic => Inline::Italic(children),
            Mark::Underline => Inline::Underline(children),
            Mark::Strike => Inline::Strike(children),
            Mark::Link(Some(href)) => Inline::Link { href, children },
            Mark::Link(None) => {
                for child in children {
                    match child {
                        Inline::Text(text) => push_text(parent, &text),
                        other => parent.push(other),
                    }
                }
                return;
            }
        };
        parent.push(node);
    }
}

/// Drops leading/trailing and collapses repeated line breaks.
fn trim_breaks(nodes: &mut Vec<Inline>) {
    nodes.dedup_by(|a, b| *a == Inline::LineBreak && *b == Inline::LineBreak);
    while nodes.first() == Some(&Inline::LineBreak) {
        nodes.remove(0);
    }
    while nodes.last() == Some(&Inline::LineBreak) {
        nodes.pop();
    }
}

fn safe_href(attrs: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let start = lower.find("href")?;
    let after = attrs[start + 4..].trim_start();
    let after = after.strip_prefix('=')?.trim_start();
    let raw = match after.chars().next()? {
        quote @ ('"' | '\'') => {
            let body = &after[1..];
            &body[..body.find(quote)?]
        }
        _ => after.split_whitespace().next()?,
    };
    let href = decode_entities(raw).trim().to_string();
    let lower = href.to_ascii_lowercase();
    SAFE_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
        .then_some(href)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_plain_text_passes_through() {
        let rt = RichText::parse("Reduced latency by 40%");
        assert_eq!(rt.inlines(), &[text("Reduced latency by 40%")]);
    }

    #[test]
    fn test_supported_marks_are_kept() {
        let rt = RichText::parse("Led <strong>5</strong> devs, <em>shipped</em> <u>v2</u>");
        assert_eq!(
            rt.inlines(),
            &[
                text("Led "),
                Inline::Bold(vec![text("5")]),
                text(" devs, "),
                Inline::Italic(vec![text("shipped")]),
                text(" "),
                Inline::Underline(vec![text("v2")]),
            ]
        );
    }

    #[test]
    fn test_script_content_is_discarded() {
        let rt = RichText::parse("safe<script>alert('x')</script> text");
        assert_eq!(rt.inlines(), &[text("safe text")]);
    }

    #[test]
    fn test_javascript_link_loses_wrapper() {
        let rt = RichText::parse(r#"<a href="javascript:alert(1)">click</a> me"#);
        assert_eq!(rt.inlines(), &[text("click me")]);
    }

    #[test]
    fn test_https_link_is_kept() {
        let rt = RichText::parse(r#"see <a href='https://example.com/a?b=1&amp;c=2'>demo</a>"#);
        assert_eq!(
            rt.inlines(),
            &[
                text("see "),
                Inline::Link {
                    href: "https://example.com/a?b=1&c=2".to_string(),
                    children: vec![text("demo")],
                },
            ]
        );
    }

    #[test]
    fn test_unknown_tags_are_stripped_but_text_kept() {
        let rt = RichText::parse(r#"<span class="x" onclick="evil()">hello</span>"#);
        assert_eq!(rt.inlines(), &[text("hello")]);
    }

    #[test]
    fn test_paragraphs_become_line_breaks() {
        let rt = RichText::parse("<p>first</p><p>second</p>");
        assert_eq!(
            rt.inlines(),
            &[text("first"), Inline::LineBreak, text("second")]
        );
    }

    #[test]
    fn test_entities_are_decoded_and_reescaped() {
        let rt = RichText::parse("R&amp;D &lt;team&gt; &#169; &unknown; &");
        assert_eq!(rt.to_plain_text(), "R&D <team> © &unknown; &");
        assert_eq!(rt.to_markup(), "R&amp;D &lt;team&gt; © &amp;unknown; &amp;");
    }

    #[test]
    fn test_unclosed_tags_are_closed_at_end() {
        let rt = RichText::parse("<b>bold <i>both");
        assert_eq!(
            rt.inlines(),
            &[Inline::Bold(vec![
                text("bold "),
                Inline::Italic(vec![text("both")])
            ])]
        );
    }

    #[test]
    fn test_stray_less_than_is_text() {
        let rt = RichText::parse("a < b and 3<4");
        assert_eq!(rt.to_plain_text(), "a < b and 3<4");
    }

    #[test]
    fn test_markup_reparses_to_same_ast() {
        let rt = RichText::parse(
            r#"<p>Built <b>API</b> serving <a href="https://x.io">1M</a> users</p><p>O'Reilly &quot;quoted&quot;</p>"#,
        );
        assert_eq!(RichText::parse(&rt.to_markup()), rt);
    }

    #[test]
    fn test_serde_uses_markup_string() {
        let rt = RichText::parse("<b>x</b> & y");
        let json = serde_json::to_string(&rt).unwrap();
        assert_eq!(json, r#""<b>x</b> &amp; y""#);
        let back: RichText = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rt);
    }

    #[test]
    fn test_empty_marks_are_dropped() {
        let rt = RichText::parse("<b></b>text<i> </i>");
        assert_eq!(rt.inlines(), &[text("text"), Inline::Italic(vec![text(" ")])]);
    }
}
