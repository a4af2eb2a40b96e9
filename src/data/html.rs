//! Minimal HTML table extraction for the assay pages.
//!
//! The assay site serves a small, regular table; we only need:
//! - every `<table>` with its `class`
//! - every `<tr>` with its `id`, and its `<th>`/`<td>` cell texts in order
//! - the page's visible text (to detect "no data" messages)
//!
//! Tag names are matched case-insensitively; nested tables are not supported.
//! Comments and `<script>`/`<style>` bodies are blanked out before scanning.

/// A table cell and whether it was a header (`th`) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlCell {
    pub header: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlRow {
    pub id: Option<String>,
    pub cells: Vec<HtmlCell>,
}

impl HtmlRow {
    pub fn header_texts(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter(|c| c.header).map(|c| c.text.as_str())
    }

    pub fn data_texts(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter(|c| !c.header).map(|c| c.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlTable {
    pub class: Option<String>,
    pub rows: Vec<HtmlRow>,
}

impl HtmlTable {
    /// Whether the `class` attribute contains every class in `classes`.
    pub fn has_classes(&self, classes: &[&str]) -> bool {
        let Some(class) = &self.class else {
            return false;
        };
        let present: Vec<&str> = class.split_whitespace().collect();
        classes.iter().all(|c| present.contains(c))
    }
}

/// Extract all tables from a page.
pub fn extract_tables(html: &str) -> Vec<HtmlTable> {
    let html = blank_inert(html);
    let html = html.as_str();
    // ASCII lowercasing keeps byte offsets identical to `html`.
    let lower = html.to_ascii_lowercase();
    let mut tables = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_tag(&lower, "table", pos) {
        let Some(open_end) = lower[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let end = lower[open_end..]
            .find("</table")
            .map(|i| open_end + i)
            .unwrap_or(lower.len());

        tables.push(HtmlTable {
            class: attribute(&html[start..open_end], "class"),
            rows: extract_rows(&html[open_end..end], &lower[open_end..end]),
        });
        pos = end;
    }

    tables
}

fn extract_rows(html: &str, lower: &str) -> Vec<HtmlRow> {
    let mut rows = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_tag(lower, "tr", pos) {
        let Some(open_end) = lower[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let end = [lower[open_end..].find("</tr"), find_tag(lower, "tr", open_end).map(|i| i - open_end)]
            .into_iter()
            .flatten()
            .min()
            .map(|i| open_end + i)
            .unwrap_or(lower.len());

        rows.push(HtmlRow {
            id: attribute(&html[start..open_end], "id"),
            cells: extract_cells(&html[open_end..end], &lower[open_end..end]),
        });
        pos = end;
    }

    rows
}

fn extract_cells(html: &str, lower: &str) -> Vec<HtmlCell> {
    let mut cells = Vec::new();
    let mut pos = 0;

    loop {
        let th = find_tag(lower, "th", pos);
        let td = find_tag(lower, "td", pos);
        let (start, header) = match (th, td) {
            (Some(a), Some(b)) if a < b => (a, true),
            (Some(a), None) => (a, true),
            (_, Some(b)) => (b, false),
            (None, None) => break,
        };
        let Some(open_end) = lower[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let close = if header { "</th" } else { "</td" };
        let next_cell = [find_tag(lower, "th", open_end), find_tag(lower, "td", open_end)]
            .into_iter()
            .flatten()
            .min();
        let end = [lower[open_end..].find(close).map(|i| open_end + i), next_cell]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(lower.len());

        cells.push(HtmlCell {
            header,
            text: visible_text(&html[open_end..end]),
        });
        pos = end;
    }

    cells
}

/// Replace comments and `<script>`/`<style>` elements with spaces of the same byte length.
fn blank_inert(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    loop {
        let next = [
            (lower.get(last..).and_then(|s| s.find("<!--")).map(|i| last + i), "-->"),
            (find_tag(&lower, "script", last), "</script"),
            (find_tag(&lower, "style", last), "</style"),
        ]
        .into_iter()
        .filter_map(|(start, close)| start.map(|s| (s, close)))
        .min_by_key(|&(s, _)| s);
        let Some((start, close)) = next else {
            break;
        };

        let end = match lower[start + 1..].find(close).map(|i| start + 1 + i) {
            Some(at) if close == "-->" => at + close.len(),
            Some(at) => lower[at..].find('>').map(|i| at + i + 1).unwrap_or(lower.len()),
            None => lower.len(),
        };
        out.push_str(&html[last..start]);
        out.extend(std::iter::repeat(' ').take(end - start));
        last = end;
    }

    out.push_str(&html[last..]);
    out
}

/// Position of the next `<name` opening tag (not a prefix of a longer name) at or after `from`.
fn find_tag(lower: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("<{name}");
    let mut pos = from;
    while let Some(i) = lower.get(pos..)?.find(&needle) {
        let at = pos + i;
        let after = lower.as_bytes().get(at + needle.len()).copied();
        match after {
            Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/') | None => return Some(at),
            _ => pos = at + needle.len(),
        }
    }
    None
}

/// Value of `name="..."` (or single-quoted) inside an opening tag.
fn attribute(tag: &str, name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let mut pos = 0;
    while let Some(i) = lower[pos..].find(name) {
        let at = pos + i;
        pos = at + name.len();
        let preceded_ok = at == 0 || lower.as_bytes()[at - 1].is_ascii_whitespace();
        let rest = lower[pos..].trim_start();
        if !preceded_ok || !rest.starts_with('=') {
            continue;
        }
        let value_start = tag.len() - rest.len() + 1;
        let value = tag[value_start..].trim_start();
        let quote = value.chars().next()?;
        if quote == '"' || quote == '\'' {
            let inner = &value[1..];
            let close = inner.find(quote)?;
            return Some(decode_entities(&inner[..close]));
        }
        let end = value
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(value.len());
        return Some(decode_entities(&value[..end]));
    }
    None
}

/// Strip tags, decode common entities and collapse whitespace.
pub fn visible_text(html: &str) -> String {
    let html = blank_inert(html);
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    decode_entities(&out).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&deg;", "°")
        .replace("&#176;", "°")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<table class="nav"><tr><td>menu</td></tr></table>
<TABLE class="table table-sm table-striped">
  <thead>
  <tr id="tableHeadRow"><th>Mass % Recovered</th><th>Temperature( oC )</th><th>Average( oC )</th></tr>
  </thead>
  <tr><th>IBP</th><td>35.2</td><td>34.0</td></tr>
  <tr><th>5</th><td><span>62.0</span></td><td>-</td></tr>
  <tr><th>10</th><td>1,090.4</td><td>88&nbsp;</td>
</TABLE>
</body></html>"#;

    #[test]
    fn extracts_rows_and_cells() {
        let tables = extract_tables(PAGE);
        assert_eq!(tables.len(), 2);
        assert!(!tables[0].has_classes(&["table-striped"]));

        let t = &tables[1];
        assert!(t.has_classes(&["table", "table-sm", "table-striped"]));
        assert_eq!(t.rows.len(), 4);
        assert_eq!(t.rows[0].id.as_deref(), Some("tableHeadRow"));
        let headers: Vec<&str> = t.rows[0].header_texts().collect();
        assert_eq!(headers, vec!["Mass % Recovered", "Temperature( oC )", "Average( oC )"]);

        let row = &t.rows[2];
        assert_eq!(row.header_texts().collect::<Vec<_>>(), vec!["5"]);
        assert_eq!(row.data_texts().collect::<Vec<_>>(), vec!["62.0", "-"]);

        // Unclosed row still yields its cells.
        assert_eq!(t.rows[3].data_texts().collect::<Vec<_>>(), vec!["1,090.4", "88"]);
    }

    #[test]
    fn visible_text_strips_markup() {
        let text = visible_text("<div><p>No distillation samples <b>available</b>.</p></div>");
        assert_eq!(text, "No distillation samples available .");
    }

    #[test]
    fn comments_and_scripts_hide_their_markup() {
        let page = r#"
<!-- <table class="old"><tr><td>stale</td></tr></table> -->
<script>var t = "<table><tr><td>x</td></tr></table>";</script>
<style>table { color: red; }</style>
<table class="table"><!-- <tr><td>9</td></tr> --><tr><th>IBP</th><td>35</td></tr></table>
<SCRIPT type="text/javascript">document.write("<table>")</SCRIPT>"#;

        let tables = extract_tables(page);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].class.as_deref(), Some("table"));
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[0].rows[0].data_texts().collect::<Vec<_>>(), vec!["35"]);
    }

    #[test]
    fn unterminated_comment_blanks_the_rest() {
        let masked = blank_inert("a<!-- <table>°");
        assert_eq!(masked.len(), "a<!-- <table>°".len());
        assert!(extract_tables("a<!-- <table>").is_empty());
        assert_eq!(visible_text("<p>No data</p><script>alert('x')</script>"), "No data");
    }

    #[test]
    fn thead_is_not_mistaken_for_th() {
        assert_eq!(find_tag("<thead><th>", "th", 0), Some(7));
    }
}
