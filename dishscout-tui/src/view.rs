use crate::form::Focus;
use crate::styles;
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::io::Stdout;
use textwrap::WordSeparator;
use textwrap::core::break_words;
use textwrap::wrap_algorithms::wrap_first_fit;
use unicode_width::UnicodeWidthStr;

const LOCATION_PLACEHOLDER: &str = "e.g. Tiong Bahru, Singapore";
const KEY_HINTS: &str =
    "Tab switch field • ←/→ change • Enter find • ↑/↓ PgUp/PgDn scroll • Esc clear/quit";

pub struct ViewSnap<'a> {
    pub title: String,
    pub focus: Focus,
    pub cuisine: &'static str,
    pub budget: &'static str,
    pub location: &'a str,
    pub cursor: usize,
    pub button: &'static str,
    pub button_enabled: bool,
    pub notice: Option<&'a str>,
    pub warning: Option<&'a str>,
    pub body: &'a [Line<'static>],
    pub scroll: usize,
    pub busy: bool,
    pub spinner: &'static str,
}

/// Draw one frame. Returns the scroll offset actually used, clamped to the
/// wrapped body height.
pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, snap: &ViewSnap<'_>) -> Result<usize> {
    let mut used_scroll = snap.scroll;

    term.draw(|frame| {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", snap.title),
            styles::title(),
        )));
        frame.render_widget(header, layout[0]);

        // Form row
        let fields = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(18),
                Constraint::Length(16),
                Constraint::Min(20),
                Constraint::Length(16),
            ])
            .split(layout[1]);

        frame.render_widget(
            selector(" Cuisine ", snap.cuisine, snap.focus == Focus::Cuisine),
            fields[0],
        );
        frame.render_widget(
            selector(" Budget ", snap.budget, snap.focus == Focus::Budget),
            fields[1],
        );

        let location_focused = snap.focus == Focus::Location;
        let inner_w = fields[2].width.saturating_sub(2) as usize;
        let caret_col = visual_caret_col(snap.location, snap.cursor);
        let offset = caret_col.saturating_sub(inner_w.saturating_sub(1));
        let location = if snap.location.is_empty() {
            Paragraph::new(Span::styled(LOCATION_PLACEHOLDER, styles::dim()))
        } else {
            Paragraph::new(Span::styled(snap.location.to_string(), styles::value()))
                .scroll((0, offset as u16))
        };
        frame.render_widget(Clear, fields[2]);
        frame.render_widget(
            location.block(field_block(" Location ", location_focused)),
            fields[2],
        );
        if location_focused {
            frame.set_cursor_position(Position {
                x: fields[2].x + 1 + (caret_col - offset) as u16,
                y: fields[2].y + 1,
            });
        }

        let button = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", snap.button),
            styles::button(snap.button_enabled),
        )))
        .centered()
        .block(Block::default().borders(Borders::ALL).border_style(styles::border(false)));
        frame.render_widget(button, fields[3]);

        // Notice / validation line
        let message = match (snap.notice, snap.warning) {
            (_, Some(warning)) => Span::styled(format!(" {warning}"), styles::warning()),
            (Some(notice), None) => Span::styled(format!(" {notice}"), styles::error()),
            (None, None) => Span::raw(""),
        };
        frame.render_widget(Paragraph::new(Line::from(message)), layout[2]);

        // Results
        used_scroll = draw_body(frame, layout[3], snap);

        // Status bar
        let state = if snap.busy {
            Span::styled("Searching…", styles::label())
        } else if snap.notice.is_some() {
            Span::styled("Search disabled", styles::error())
        } else {
            Span::styled("Ready", styles::system())
        };
        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(snap.spinner, styles::label()),
            Span::raw(" "),
            state,
            Span::styled(format!("  {KEY_HINTS}"), styles::dim()),
        ]);
        let status = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[4]);
    })?;

    Ok(used_scroll)
}

fn draw_body(frame: &mut ratatui::Frame<'_>, area: Rect, snap: &ViewSnap<'_>) -> usize {
    let visible_h = area.height.saturating_sub(2) as usize;
    let content_width = area.width.saturating_sub(2) as usize;
    let wrapped = wrap_lines(snap.body, content_width);
    let total = wrapped.len();
    let scroll = snap.scroll.min(total.saturating_sub(visible_h));
    let end = (scroll + visible_h).min(total);

    let title = if total > visible_h {
        format!(" Recommendations ({}-{} of {}) ", scroll + 1, end, total)
    } else {
        " Recommendations ".to_string()
    };
    let body = Paragraph::new(Text::from(wrapped[scroll..end].to_vec()))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(body, area);
    scroll
}

fn selector(title: &'static str, value: &'static str, focused: bool) -> Paragraph<'static> {
    let line = if focused {
        Line::from(vec![
            Span::styled("◀ ", styles::dim()),
            Span::styled(value, styles::label()),
            Span::styled(" ▶", styles::dim()),
        ])
    } else {
        Line::from(Span::styled(value, styles::value()))
    };
    Paragraph::new(line).block(field_block(title, focused))
}

fn field_block(title: &'static str, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border(focused))
        .title(title)
}

fn visual_caret_col(input: &str, cursor: usize) -> usize {
    UnicodeWidthStr::width(&input[..cursor.min(input.len())])
}

/// Word-wrap styled lines to `width` columns, keeping each span's style.
pub fn wrap_lines(lines: &[Line<'static>], width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let plain: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        if UnicodeWidthStr::width(plain.as_str()) <= width {
            out.push(line.clone());
            continue;
        }
        for (start, end) in break_points(&plain, width) {
            out.push(slice_line(line, start, end));
        }
    }
    out
}

/// Byte ranges of each wrapped row; trailing whitespace at a break is dropped.
fn break_points(text: &str, width: usize) -> Vec<(usize, usize)> {
    let words = break_words(WordSeparator::AsciiSpace.find_words(text), width);

    let mut offsets = Vec::with_capacity(words.len());
    let mut at = 0;
    for word in &words {
        offsets.push(at);
        at += word.word.len() + word.whitespace.len();
    }

    let mut ranges = Vec::new();
    let mut index = 0;
    for row in wrap_first_fit(&words, &[width as f64]) {
        if row.is_empty() {
            continue;
        }
        let first = index;
        index += row.len();
        let last = index - 1;
        ranges.push((offsets[first], offsets[last] + words[last].word.len()));
    }
    if ranges.is_empty() {
        ranges.push((0, text.len()));
    }
    ranges
}

fn slice_line(line: &Line<'static>, start: usize, end: usize) -> Line<'static> {
    let mut spans = Vec::new();
    let mut at = 0;
    for span in &line.spans {
        let content = span.content.as_ref();
        let (span_start, span_end) = (at, at + content.len());
        at = span_end;

        let from = start.max(span_start);
        let to = end.min(span_end);
        if from < to {
            spans.push(Span::styled(
                content[from - span_start..to - span_start].to_string(),
                span.style,
            ));
        }
    }
    Line::from(spans).style(line.style)
}
