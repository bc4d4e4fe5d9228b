//! Minimal HTML tree for status page extraction.
//!
//! The status CGI emits fixed-shape, class-annotated HTML. This module
//! recovers just enough structure from it to support the queries the
//! [`crate::data::parser`] needs: class/attribute lookup, descendant search,
//! and direct-children-only traversal (nested tables inside cells must not
//! leak into a row's cell list). It is deliberately not a general HTML
//! parser: unknown constructs are skipped, mismatched tags are tolerated,
//! and nothing here ever fails.

/// A parsed node: an element or a run of text.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its tag, attributes, and child nodes.
///
/// Tag and attribute names are lowercased at parse time; attribute values
/// keep their original case.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Elements that never have content and never appear on the open stack.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Block-ish elements that imply a line break in extracted text.
const LINE_BREAK_TAGS: &[&str] = &["br", "div", "li", "p", "table", "tr"];

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The lowercased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up an attribute value by (case-insensitive) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The raw `class` attribute, or the empty string.
    pub fn class_attr(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    /// Whether the `class` attribute contains `name` as a whole token.
    pub fn has_class(&self, name: &str) -> bool {
        self.class_attr().split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(name))
    }

    /// Direct child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First descendant (excluding self) matching the predicate, pre-order.
    pub fn find<F: Fn(&Element) -> bool>(&self, pred: F) -> Option<&Element> {
        fn walk<'a>(el: &'a Element, pred: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
            for child in el.child_elements() {
                if pred(child) {
                    return Some(child);
                }
                if let Some(found) = walk(child, pred) {
                    return Some(found);
                }
            }
            None
        }
        walk(self, &pred)
    }

    /// All descendants (excluding self) matching the predicate, pre-order.
    pub fn find_all<F: Fn(&Element) -> bool>(&self, pred: F) -> Vec<&Element> {
        fn walk<'a>(el: &'a Element, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
            for child in el.child_elements() {
                if pred(child) {
                    out.push(child);
                }
                walk(child, pred, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &pred, &mut out);
        out
    }

    /// First descendant carrying `class` as a class token.
    pub fn find_class(&self, class: &str) -> Option<&Element> {
        self.find(|e| e.has_class(class))
    }

    /// All descendants carrying `class` as a class token.
    pub fn find_all_class(&self, class: &str) -> Vec<&Element> {
        self.find_all(|e| e.has_class(class))
    }

    /// First descendant with the given tag name.
    pub fn find_tag(&self, tag: &str) -> Option<&Element> {
        self.find(|e| e.tag() == tag)
    }

    /// All descendants with the given tag name.
    pub fn find_all_tag(&self, tag: &str) -> Vec<&Element> {
        self.find_all(|e| e.tag() == tag)
    }

    /// Concatenated descendant text with all whitespace collapsed to single
    /// spaces and the ends trimmed.
    pub fn text(&self) -> String {
        normalize_ws(&self.raw_text())
    }

    /// Concatenated descendant text preserving line structure: `<br>` and
    /// block-level elements contribute newlines. Used where a label pattern
    /// must not run past the end of its line.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for node in &el.children {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                if LINE_BREAK_TAGS.contains(&e.tag()) {
                    out.push('\n');
                }
                collect_text(e, out);
                if LINE_BREAK_TAGS.contains(&e.tag()) && e.tag() != "br" {
                    out.push('\n');
                }
            }
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim the ends.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Decode the handful of entities the status CGI actually emits, plus
/// numeric references. Unknown entities pass through literally.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        // An entity ends in ';' within a short window, or it is a bare '&'.
        let semi = rest.bytes().take(12).position(|b| b == b';');
        let Some(semi) = semi else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let name = &rest[1..semi];
        let decoded = match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => {
                if let Some(num) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                    u32::from_str_radix(num, 16).ok().and_then(char::from_u32)
                } else if let Some(num) = name.strip_prefix('#') {
                    num.parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    None
                }
            }
        };
        match decoded {
            Some(ch) => {
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

/// Parse a raw document into a synthetic root element.
///
/// Never fails: comments, doctypes, processing instructions and
/// script/style bodies are skipped, stray close tags are ignored, and
/// unclosed elements are closed implicitly at end of input. Table rows and
/// cells auto-close their predecessors the way browsers do, so sloppy
/// `<tr>`/`<td>` nesting still yields the expected structure.
pub fn parse(raw: &str) -> Element {
    let mut stack: Vec<Element> = vec![Element::new("#root")];
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let end = raw[i..].find('<').map(|p| i + p).unwrap_or(bytes.len());
            let text = decode_entities(&raw[i..end]);
            if !text.is_empty() {
                top(&mut stack).children.push(Node::Text(text));
            }
            i = end;
            continue;
        }

        let rest = &raw[i..];
        if rest.starts_with("<!--") {
            i = rest.find("-->").map(|p| i + p + 3).unwrap_or(bytes.len());
        } else if rest.starts_with("</") {
            let (name, next) = read_name(raw, i + 2);
            i = skip_past_gt(raw, next);
            if !name.is_empty() {
                close_tag(&mut stack, &name);
            }
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            i = skip_past_gt(raw, i + 2);
        } else if bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            i = open_tag(raw, i + 1, &mut stack);
        } else {
            // Literal '<' in text.
            top(&mut stack).children.push(Node::Text("<".to_string()));
            i += 1;
        }
    }

    // Close everything still open onto the root.
    while stack.len() > 1 {
        attach_top(&mut stack);
    }
    stack.pop().unwrap_or_else(|| Element::new("#root"))
}

fn top<'a>(stack: &'a mut [Element]) -> &'a mut Element {
    stack.last_mut().expect("parse stack keeps its root")
}

/// Pop the top of the stack and attach it to its parent's children.
fn attach_top(stack: &mut Vec<Element>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(el) = stack.pop() {
        top(stack).children.push(Node::Element(el));
    }
}

/// Close the nearest open element with the given tag, if any.
fn close_tag(stack: &mut Vec<Element>, name: &str) {
    let Some(pos) = stack.iter().rposition(|e| e.tag == name) else {
        return;
    };
    if pos == 0 {
        return;
    }
    while stack.len() > pos {
        attach_top(stack);
    }
}

/// Close any open `targets` element sitting above the nearest `barriers`
/// element. Implements implicit table-row/cell closing.
fn close_implied(stack: &mut Vec<Element>, targets: &[&str], barriers: &[&str]) {
    let mut pos = None;
    for (idx, el) in stack.iter().enumerate().skip(1).rev() {
        if barriers.contains(&el.tag.as_str()) {
            break;
        }
        if targets.contains(&el.tag.as_str()) {
            pos = Some(idx);
            break;
        }
    }
    if let Some(pos) = pos {
        while stack.len() > pos {
            attach_top(stack);
        }
    }
}

/// Parse an open tag starting at `at` (just past '<'). Returns the index
/// following the tag (and following the element's body for script/style).
fn open_tag(raw: &str, at: usize, stack: &mut Vec<Element>) -> usize {
    let (name, mut i) = read_name(raw, at);
    let mut el = Element::new(&name);
    let bytes = raw.as_bytes();
    let mut self_closing = false;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => break,
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') => {
                self_closing = true;
                i += 1;
            }
            _ => {
                let (attr, next) = read_attr(raw, i);
                if next == i {
                    // No progress; bail out of a malformed tag.
                    i = skip_past_gt(raw, i);
                    break;
                }
                i = next;
                if let Some(attr) = attr {
                    el.attrs.push(attr);
                }
            }
        }
    }

    match el.tag.as_str() {
        "tr" => close_implied(stack, &["tr"], &["table", "thead", "tbody", "tfoot"]),
        "td" | "th" => close_implied(stack, &["td", "th"], &["tr", "table"]),
        _ => {}
    }

    let tag = el.tag.clone();
    if self_closing || VOID_TAGS.contains(&tag.as_str()) {
        top(stack).children.push(Node::Element(el));
        return i;
    }

    if tag == "script" || tag == "style" {
        // Swallow the body; these never contain status data.
        top(stack).children.push(Node::Element(el));
        let close = format!("</{}", tag);
        let lower = raw[i..].to_ascii_lowercase();
        return match lower.find(&close) {
            Some(p) => skip_past_gt(raw, i + p),
            None => raw.len(),
        };
    }

    stack.push(el);
    i
}

/// Read a tag or attribute name. Returns (lowercased name, next index).
fn read_name(raw: &str, at: usize) -> (String, usize) {
    let bytes = raw.as_bytes();
    let mut i = at;
    while i < bytes.len()
        && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b'_')
    {
        i += 1;
    }
    (raw[at..i].to_ascii_lowercase(), i)
}

/// Read one attribute (`name`, `name=value`, `name="value"`, `name='value'`).
/// Returns (attribute, next index); the attribute is None for stray bytes.
fn read_attr(raw: &str, at: usize) -> (Option<(String, String)>, usize) {
    let bytes = raw.as_bytes();
    let (name, mut i) = read_name(raw, at);
    if name.is_empty() {
        // Unexpected byte inside the tag; step over it.
        return (None, at + 1);
    }
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        return (Some((name, String::new())), i);
    }
    i += 1;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    match bytes.get(i) {
        Some(&q) if q == b'"' || q == b'\'' => {
            let start = i + 1;
            let end = raw[start..].find(q as char).map(|p| start + p).unwrap_or(raw.len());
            let value = decode_entities(&raw[start..end]);
            (Some((name, value)), (end + 1).min(raw.len()))
        }
        _ => {
            // Unquoted values run to whitespace or the end of the tag;
            // '/' stays part of the value (hrefs carry paths).
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                i += 1;
            }
            (Some((name, decode_entities(&raw[start..i]))), i)
        }
    }
}

/// Index just past the next '>', or end of input.
fn skip_past_gt(raw: &str, at: usize) -> usize {
    raw[at.min(raw.len())..].find('>').map(|p| at + p + 1).unwrap_or(raw.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let root = parse(r#"<div class="infoBox"><a href="x.cgi?host=web1" title="Web 1">web1</a></div>"#);
        let div = root.find_class("infoBox").unwrap();
        assert_eq!(div.tag(), "div");
        let a = div.find_tag("a").unwrap();
        assert_eq!(a.attr("href"), Some("x.cgi?host=web1"));
        assert_eq!(a.attr("title"), Some("Web 1"));
        assert_eq!(a.text(), "web1");
    }

    #[test]
    fn direct_children_exclude_nested_table_cells() {
        let root = parse(
            "<table class='status'><tr>\
             <td>outer1</td>\
             <td><table><tr><td>inner</td></tr></table></td>\
             <td>outer3</td>\
             </tr></table>",
        );
        let table = root.find(|e| e.tag() == "table" && e.has_class("status")).unwrap();
        let row = table.child_elements().next().unwrap();
        assert_eq!(row.tag(), "tr");
        let cells: Vec<_> = row.child_elements().filter(|e| e.tag() == "td").collect();
        assert_eq!(cells.len(), 3);
        // The descendant walk still sees the nested cell.
        assert_eq!(row.find_all_tag("td").len(), 4);
    }

    #[test]
    fn auto_closes_unterminated_rows_and_cells() {
        let root = parse("<table><tr><td>a<td>b<tr><td>c</table>");
        let table = root.find_tag("table").unwrap();
        let rows: Vec<_> = table.child_elements().filter(|e| e.tag() == "tr").collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].child_elements().count(), 2);
        assert_eq!(rows[1].child_elements().count(), 1);
        assert_eq!(rows[1].text(), "c");
    }

    #[test]
    fn decodes_entities_in_text_and_skips_comments() {
        let root = parse("<td><!-- note -->Fish &amp; Chips&nbsp;&#49;&lt;3 &bogus;</td>");
        let text = root.find_tag("td").unwrap().text();
        assert_eq!(text, "Fish & Chips 1<3 &bogus;");
    }

    #[test]
    fn has_class_matches_whole_tokens_case_insensitively() {
        let root = parse(r#"<td class="statusOK nowrap">OK</td>"#);
        let td = root.find_tag("td").unwrap();
        assert!(td.has_class("statusok"));
        assert!(td.has_class("nowrap"));
        assert!(!td.has_class("status"));
    }

    #[test]
    fn raw_text_preserves_line_breaks_for_br() {
        let root = parse("<div>Last Updated: Wed Aug 6<br>Updated every 90 seconds</div>");
        let div = root.find_tag("div").unwrap();
        let raw = div.raw_text();
        assert!(raw.contains("Last Updated: Wed Aug 6\n"));
        assert_eq!(div.text(), "Last Updated: Wed Aug 6 Updated every 90 seconds");
    }

    #[test]
    fn tolerates_garbage_without_panicking() {
        for junk in ["", "<", "<<<>>>", "</nope>", "<a href=", "<table><td", "&#xZZ;"] {
            let _ = parse(junk);
        }
    }

    #[test]
    fn unquoted_attributes_parse() {
        let root = parse("<table class=status border=1><tr><td>x</td></tr></table>");
        let table = root.find_tag("table").unwrap();
        assert!(table.has_class("status"));
        assert_eq!(table.attr("border"), Some("1"));
    }
}
