//! Comment bodies arrive as untrusted HTML. They are cleaned with an
//! allow-list first, and only the cleaned markup is flattened into styled
//! terminal text.

use ammonia::Builder;

/// Cleans comment HTML: formatting and links survive (including `target` on
/// anchors); scripts, styles, event handlers and unsafe URL schemes do not.
pub fn sanitize(html: &str) -> String {
    Builder::default()
        .add_tag_attributes("a", &["target"])
        .clean(html)
        .to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub code: bool,
    /// Index into `RenderedContent::links`.
    pub link: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: TextStyle,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedContent {
    pub lines: Vec<Vec<Segment>>,
    pub links: Vec<String>,
}

impl RenderedContent {
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Sanitizes and flattens in one go.
pub fn render(html: &str) -> RenderedContent {
    flatten(&sanitize(html))
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "blockquote", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "table",
    "tr", "hr", "dl", "dd", "dt", "figure", "figcaption",
];

struct Frame {
    tag: String,
    saved: TextStyle,
}

struct Flattener {
    out: RenderedContent,
    line: Vec<Segment>,
    style: TextStyle,
    stack: Vec<Frame>,
    pending_space: bool,
    pre_depth: usize,
}

impl Flattener {
    fn new() -> Self {
        Self {
            out: RenderedContent::default(),
            line: Vec::new(),
            style: TextStyle::default(),
            stack: Vec::new(),
            pending_space: false,
            pre_depth: 0,
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.line.last_mut()
            && last.style == self.style
        {
            last.text.push_str(text);
            return;
        }
        self.line.push(Segment {
            text: text.to_string(),
            style: self.style,
        });
    }

    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        if self.pre_depth > 0 {
            let mut parts = decoded.split('\n').peekable();
            while let Some(part) = parts.next() {
                self.push_text(part);
                if parts.peek().is_some() {
                    self.hard_break();
                }
            }
            return;
        }
        for (i, word) in decoded.split(char::is_whitespace).enumerate() {
            if i > 0 {
                self.pending_space = true;
            }
            if word.is_empty() {
                continue;
            }
            // The separating space joins the previous run so it never
            // picks up a link underline.
            if self.pending_space
                && let Some(last) = self.line.last_mut()
            {
                last.text.push(' ');
            }
            self.pending_space = false;
            self.push_text(word);
        }
    }

    fn hard_break(&mut self) {
        let line = std::mem::take(&mut self.line);
        self.out.lines.push(line);
        self.pending_space = false;
    }

    /// Ends the current line if anything is on it.
    fn soft_break(&mut self) {
        if !self.line.is_empty() {
            self.hard_break();
        }
    }

    fn blank_line(&mut self) {
        self.soft_break();
        if self.out.lines.last().is_some_and(|l| !l.is_empty()) {
            self.out.lines.push(Vec::new());
        }
    }

    fn open(&mut self, name: &str, attrs: &str) {
        match name {
            "br" => {
                self.hard_break();
                return;
            }
            "li" => {
                self.soft_break();
                self.push_text("• ");
            }
            "hr" => {
                self.soft_break();
                self.push_text("────");
                self.hard_break();
                return;
            }
            "img" => {
                let alt = attr_value(attrs, "alt").unwrap_or_default();
                self.push_text(&format!("[image: {alt}]"));
                return;
            }
            tag if BLOCK_TAGS.contains(&tag) => self.soft_break(),
            _ => {}
        }

        let saved = self.style;
        match name {
            "b" | "strong" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.style.bold = true,
            "i" | "em" | "cite" => self.style.italic = true,
            "u" | "ins" => self.style.underline = true,
            "code" | "kbd" | "samp" => self.style.code = true,
            "pre" => {
                self.style.code = true;
                self.pre_depth += 1;
            }
            "a" => {
                if let Some(href) = attr_value(attrs, "href") {
                    self.out.links.push(href);
                    self.style.link = Some(self.out.links.len() - 1);
                    self.style.underline = true;
                }
            }
            _ => {}
        }
        self.stack.push(Frame {
            tag: name.to_string(),
            saved,
        });
    }

    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().rposition(|f| f.tag == name) else {
            return;
        };
        let link = self.style.link;
        let frame = self.stack.drain(pos..).next();
        if let Some(frame) = frame {
            self.style = frame.saved;
        }
        if name == "a"
            && let Some(idx) = link
        {
            self.push_text(&format!(" [{}]", idx + 1));
        }
        if name == "pre" {
            self.pre_depth = self.pre_depth.saturating_sub(1);
        }
        match name {
            "p" | "blockquote" | "pre" | "ul" | "ol" | "table" => self.blank_line(),
            tag if BLOCK_TAGS.contains(&tag) || tag == "li" => self.soft_break(),
            _ => {}
        }
    }

    fn finish(mut self) -> RenderedContent {
        self.soft_break();
        while self.out.lines.last().is_some_and(|l| l.is_empty()) {
            self.out.lines.pop();
        }
        self.out
    }
}

/// Flattens markup produced by `sanitize`. The input is assumed well formed
/// (quoted attributes, escaped text), which the sanitizer guarantees.
pub fn flatten(clean_html: &str) -> RenderedContent {
    let mut flattener = Flattener::new();
    let mut rest = clean_html;

    while let Some(lt) = rest.find('<') {
        flattener.text(&rest[..lt]);
        let Some(gt) = rest[lt..].find('>') else {
            flattener.text(&rest[lt..]);
            rest = "";
            break;
        };
        let tag = &rest[lt + 1..lt + gt];
        rest = &rest[lt + gt + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            flattener.close(&name.trim().to_ascii_lowercase());
        } else {
            let tag = tag.trim_end_matches('/');
            let (name, attrs) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
            flattener.open(&name.to_ascii_lowercase(), attrs);
        }
    }
    flattener.text(rest);
    flattener.finish()
}

fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let mut search = attrs;
    loop {
        let start = search.find(&needle)?;
        let preceded_ok = start == 0
            || search[..start]
                .chars()
                .last()
                .is_some_and(char::is_whitespace);
        let value_start = start + needle.len();
        if preceded_ok {
            let end = search[value_start..].find('"')?;
            return Some(decode_entities(&search[value_start..value_start + end]));
        }
        search = &search[value_start..];
    }
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
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_drops_script_keeps_anchor_target() {
        let html = r#"<p>See <a href="https://example.org/fig" target="_blank">figure</a></p><script>alert("x")</script>"#;
        let clean = sanitize(html);
        assert!(!clean.contains("<script"));
        assert!(!clean.contains("alert"));
        assert!(clean.contains("<a "));
        assert!(clean.contains(r#"href="https://example.org/fig""#));
        assert!(clean.contains(r#"target="_blank""#));
    }

    #[test]
    fn test_sanitize_strips_event_handlers_and_js_urls() {
        let html = r#"<b onclick="steal()">bold</b><a href="javascript:steal()">x</a><img src="a.png" onerror="steal()">"#;
        let clean = sanitize(html);
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("onerror"));
        assert!(!clean.contains("javascript:"));
        assert!(clean.contains("<b>bold</b>"));
    }

    #[test]
    fn test_sanitize_drops_style_contents() {
        let clean = sanitize("<style>body{display:none}</style><p>ok</p>");
        assert!(!clean.contains("display"));
        assert!(clean.contains("ok"));
    }

    #[test]
    fn test_flatten_paragraphs_and_breaks() {
        let content = flatten("<p>First   line<br>second</p><p>Third</p>");
        assert_eq!(content.plain_text(), "First line\nsecond\n\nThird");
    }

    #[test]
    fn test_flatten_styles() {
        let content = flatten("<p>a <strong>b</strong> <em>c</em></p>");
        let line = &content.lines[0];
        let bold = line.iter().find(|s| s.text.trim() == "b").unwrap();
        assert!(bold.style.bold);
        let italic = line.iter().find(|s| s.text.trim() == "c").unwrap();
        assert!(italic.style.italic);
        assert!(!italic.style.bold);
    }

    #[test]
    fn test_flatten_links_are_numbered() {
        let content = render(r#"Read <a href="https://a.example/?x=1&amp;y=2" target="_blank">this</a> and <a href="https://b.example">that</a>."#);
        assert_eq!(
            content.links,
            vec!["https://a.example/?x=1&y=2", "https://b.example"]
        );
        assert_eq!(content.plain_text(), "Read this [1] and that [2].");
        let linked = content.lines[0].iter().find(|s| s.text == "this").unwrap();
        assert_eq!(linked.style.link, Some(0));
        assert!(linked.style.underline);
    }

    #[test]
    fn test_flatten_list_items() {
        let content = flatten("<ul><li>one</li><li>two</li></ul>");
        assert_eq!(content.plain_text(), "• one\n• two");
    }

    #[test]
    fn test_flatten_decodes_entities() {
        let content = flatten("p &lt; 0.05 &amp;&amp; n&#61;12 &#x2192; ok");
        assert_eq!(content.plain_text(), "p < 0.05 && n=12 → ok");
    }

    #[test]
    fn test_flatten_pre_keeps_newlines() {
        let content = flatten("<pre>a  b\nc</pre>");
        assert_eq!(content.plain_text(), "a  b\nc");
        assert!(content.lines[0][0].style.code);
    }

    #[test]
    fn test_flatten_empty_input() {
        assert!(flatten("").lines.is_empty());
    }

    #[test]
    fn test_attr_value_requires_attribute_boundary() {
        assert_eq!(
            attr_value(r#"data-href="x" href="y""#, "href").as_deref(),
            Some("y")
        );
        assert_eq!(attr_value(r#"title="t""#, "href"), None);
    }
}
