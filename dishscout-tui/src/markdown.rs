//! Markdown → styled terminal lines.
//!
//! Block structure is decided per line (headings, bullets, numbered items,
//! quotes, rules, fenced code), then inline markers (bold, italic, code,
//! links, backslash escapes) are resolved within the line. Anything not
//! recognised, raw HTML included, is shown as plain text.
use crate::styles;
use dishscout_search::SearchResult;
use dishscout_search::render::{self, CITATIONS_HEADING, Presentation};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

const RULE_WIDTH: usize = 40;

pub fn render_result(result: &SearchResult) -> Vec<Line<'static>> {
    render_presentation(&render::present(result))
}

/// Body first, then the place citations under their own heading.
pub fn render_presentation(presentation: &Presentation<'_>) -> Vec<Line<'static>> {
    let mut lines = render_markdown(presentation.markdown);
    if presentation.has_citations() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            CITATIONS_HEADING,
            styles::heading(2),
        )));
        for citation in &presentation.citations {
            let mut spans = vec![
                Span::styled("• ", styles::bullet()),
                Span::styled(citation.label().to_string(), styles::link()),
            ];
            if citation.label() != citation.uri {
                spans.push(Span::styled(format!(" ({})", citation.uri), styles::dim()));
            }
            lines.push(Line::from(spans));
        }
    }
    lines
}

pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut fence: Option<&'static str> = None;

    for raw in text.lines() {
        let trimmed = raw.trim_start();
        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            } else {
                lines.push(Line::from(Span::styled(format!("  {raw}"), styles::code())));
            }
            continue;
        }
        if let Some(marker) = fence_marker(trimmed) {
            fence = Some(marker);
            continue;
        }
        lines.push(Line::from(render_line(raw)));
    }
    lines
}

fn fence_marker(trimmed: &str) -> Option<&'static str> {
    ["```", "~~~"]
        .into_iter()
        .find(|marker| trimmed.starts_with(*marker))
}

fn render_line(line: &str) -> Vec<Span<'static>> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if let Some((level, content)) = heading(trimmed) {
        return inline(content, styles::heading(level));
    }
    if is_rule(trimmed) {
        return vec![Span::styled("─".repeat(RULE_WIDTH), styles::dim())];
    }
    if let Some(content) = trimmed.strip_prefix('>') {
        let mut spans = vec![Span::styled("│ ", styles::dim())];
        spans.extend(inline(content.trim_start(), styles::quote()));
        return spans;
    }

    let marker = ["- ", "* ", "+ "]
        .into_iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix).map(|rest| ("• ".to_string(), rest)))
        .or_else(|| numbered(trimmed).map(|(n, rest)| (format!("{n}. "), rest)));

    match marker {
        Some((marker, content)) => {
            let mut spans = Vec::new();
            if !indent.is_empty() {
                spans.push(Span::raw(indent.to_string()));
            }
            spans.push(Span::styled(marker, styles::bullet()));
            spans.extend(inline(content, Style::default()));
            spans
        }
        None => inline(line, Style::default()),
    }
}

fn heading(trimmed: &str) -> Option<(usize, &str)> {
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim_end()))
}

fn is_rule(trimmed: &str) -> bool {
    let mut marks = trimmed.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && {
        let rest: Vec<char> = marks.collect();
        rest.len() >= 2 && rest.iter().all(|&c| c == first)
    }
}

fn numbered(trimmed: &str) -> Option<(&str, &str)> {
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let rest = &trimmed[digits..];
    let content = rest
        .strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))?;
    Some((&trimmed[..digits], content))
}

fn inline(text: &str, base: Style) -> Vec<Span<'static>> {
    let mut out = Inline::new(base);
    let mut i = 0;

    while let Some(c) = text[i..].chars().next() {
        let rest = &text[i..];
        let prev = text[..i].chars().next_back();
        let consumed = match c {
            '\\' => out.escape(rest),
            '`' => out.code(rest),
            '*' => out.emphasis(rest),
            '_' if !prev.is_some_and(char::is_alphanumeric) => out.emphasis(rest),
            '[' => out.link(rest),
            _ => None,
        };
        match consumed {
            Some(n) => i += n,
            None => {
                out.plain.push(c);
                i += c.len_utf8();
            }
        }
    }
    out.finish()
}

/// Accumulates plain text in the base style and flushes it before every
/// styled span.
struct Inline {
    base: Style,
    plain: String,
    spans: Vec<Span<'static>>,
}

impl Inline {
    fn new(base: Style) -> Self {
        Self {
            base,
            plain: String::new(),
            spans: Vec::new(),
        }
    }

    fn flush(&mut self) {
        if !self.plain.is_empty() {
            let text = std::mem::take(&mut self.plain);
            self.spans.push(Span::styled(text, self.base));
        }
    }

    fn extend(&mut self, spans: Vec<Span<'static>>) {
        self.flush();
        self.spans.extend(spans);
    }

    fn finish(mut self) -> Vec<Span<'static>> {
        self.flush();
        self.spans
    }

    fn escape(&mut self, rest: &str) -> Option<usize> {
        let next = rest[1..].chars().next().filter(char::is_ascii_punctuation)?;
        self.plain.push(next);
        Some(1 + next.len_utf8())
    }

    fn code(&mut self, rest: &str) -> Option<usize> {
        let end = rest[1..].find('`')?;
        let body = &rest[1..1 + end];
        if body.is_empty() {
            return None;
        }
        self.extend(vec![Span::styled(body.to_string(), styles::code())]);
        Some(end + 2)
    }

    /// `rest` starts with `*` or `_`; doubled markers are bold, single italic.
    fn emphasis(&mut self, rest: &str) -> Option<usize> {
        let marker = rest.as_bytes()[0];
        let strong = rest.as_bytes().get(1) == Some(&marker);
        let width = if strong { 2 } else { 1 };
        let delim = &rest[..width];

        let inner = &rest[width..];
        let end = inner.find(delim)?;
        let body = &inner[..end];
        if body.is_empty()
            || body.starts_with(char::is_whitespace)
            || body.ends_with(char::is_whitespace)
        {
            return None;
        }

        let modifier = if strong {
            Modifier::BOLD
        } else {
            Modifier::ITALIC
        };
        self.extend(inline(body, self.base.add_modifier(modifier)));
        Some(width * 2 + end)
    }

    /// `[label](target)`, drawn as the label followed by the target.
    fn link(&mut self, rest: &str) -> Option<usize> {
        let close = rest.find("](")?;
        let label = &rest[1..close];
        if label.contains(']') {
            return None;
        }
        let after = &rest[close + 2..];
        let end = after.find(')')?;
        let target = after[..end].split_whitespace().next().unwrap_or("");
        if label.trim().is_empty() && target.is_empty() {
            return None;
        }

        let label_style = self.base.patch(styles::link());
        if label.trim().is_empty() {
            self.extend(vec![Span::styled(target.to_string(), label_style)]);
        } else {
            self.extend(inline(label, label_style));
            if !target.is_empty() && label.trim() != target {
                self.extend(vec![Span::styled(format!(" ({target})"), styles::dim())]);
            }
        }
        Some(close + 2 + end + 1)
    }
}
