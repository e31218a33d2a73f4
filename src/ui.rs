use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{App, FormRow, InputMode, Screen, WorkflowForm};
use crate::catalog::group_label;
use crate::model::{NamespacePhase, ResourceEntry, SubmissionState, Workflow};
use crate::preview;
use crate::submit::{Artifact, Submission};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const CURSOR_BG: Color = Color::Rgb(30, 41, 59);
const KEY: Color = Color::Rgb(103, 232, 249);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    match app.screen() {
        Screen::Selector => render_selector(frame, root[1], app),
        Screen::Workflow(workflow) => render_workflow(frame, root[1], app, workflow),
    }
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut left = Vec::new();
    match app.active_workflow() {
        Some(workflow) => {
            push_powerline_segment(&mut left, " 󱃾 kubeaccess ", Color::White, PL_A, PL_B);
            push_powerline_segment(
                &mut left,
                format!(" {} ", workflow.title()),
                Color::White,
                PL_B,
                PL_C,
            );
            push_powerline_segment(
                &mut left,
                format!(
                    " 󰅩 {} ",
                    compact_text(app.form(workflow).namespace(), 24)
                ),
                Color::White,
                PL_C,
                BG,
            );
        }
        None => {
            push_powerline_segment(&mut left, " 󱃾 kubeaccess ", Color::White, PL_A, PL_B);
            push_powerline_segment(&mut left, " choose a generator ", Color::White, PL_B, BG);
        }
    }
    let left_line = Line::from(left);

    let right_line = build_workflow_tabs(app);
    let right_width = spans_width(&right_line.spans) as u16;
    if area.width < 42 || right_width == 0 || right_width >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right_line).style(Style::default().bg(BG)),
        chunks[1],
    );
}

fn build_workflow_tabs(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    let mut next_bg = BG;
    for (slot, workflow) in Workflow::ALL.iter().enumerate() {
        let active = app.active_workflow() == Some(*workflow);
        let bg = if active {
            Color::Rgb(59, 130, 246)
        } else {
            Color::Rgb(30, 41, 59)
        };
        let fg = if active { Color::Black } else { Color::White };
        let label = format!(" {} {} ", slot + 1, workflow.artifact_label());
        push_powerline_segment_rtl(&mut spans, label, fg, bg, next_bg);
        next_bg = bg;
    }
    spans.push(Span::styled(" ", Style::default().bg(next_bg)));
    Line::from(spans)
}

fn render_selector(frame: &mut Frame, area: Rect, app: &App) {
    let outer = Block::default()
        .title(" Kubernetes Access Manager ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .style(Style::default().bg(PANEL));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new("Select a tool to get started")
            .alignment(Alignment::Center)
            .style(Style::default().fg(MUTED)),
        rows[0],
    );

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    for (index, workflow) in Workflow::ALL.iter().enumerate() {
        let selected = index == app.selector_index();
        let card = Paragraph::new(vec![
            Line::from(Span::styled(
                workflow.blurb().to_string(),
                Style::default().fg(Color::White),
            )),
            Line::from(""),
            Line::from(Span::styled(
                if selected { "Enter to open" } else { "" },
                Style::default().fg(ACCENT),
            )),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" {}  {} ", index + 1, workflow.title()))
                .borders(Borders::ALL)
                .border_style(if selected {
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(MUTED)
                }),
        );
        frame.render_widget(card, cards[index]);
    }
}

fn render_workflow(frame: &mut Frame, area: Rect, app: &App, workflow: Workflow) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let form = app.form(workflow);

    let banner = banner_lines(workflow, form);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if banner.is_empty() {
                0
            } else {
                banner.len() as u16 + 2
            }),
            Constraint::Min(4),
        ])
        .split(columns[0]);

    render_form(frame, left[1], app, workflow, form);
    if !banner.is_empty() {
        let color = match form.submission() {
            SubmissionState::Invalid(_) | SubmissionState::Failure(_) => ERROR,
            SubmissionState::Pending { .. } => WARN,
            _ => ACCENT,
        };
        frame.render_widget(
            Paragraph::new(banner)
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(color))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color))
                        .style(Style::default().bg(PANEL)),
                ),
            left[0],
        );
    }
    render_preview(frame, columns[1], workflow, form);
}

fn render_form(frame: &mut Frame, area: Rect, app: &App, workflow: Workflow, form: &WorkflowForm) {
    let editing = app.mode() == InputMode::EditName;
    let cursor = form.cursor();
    let lines = form
        .rows()
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let focused = index == cursor;
            let line = form_row_line(app, workflow, form, row, focused, editing);
            if focused {
                line.style(Style::default().bg(CURSOR_BG))
            } else {
                line
            }
        })
        .collect::<Vec<_>>();

    let visible = area.height.saturating_sub(2).max(1) as usize;
    let offset = (cursor + 1).saturating_sub(visible) as u16;
    let block = Block::default()
        .title(format!(
            " {}  {}/{} resources ",
            workflow.title(),
            form.selection().selected_count(),
            form.selection().len()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(Style::default().fg(Color::White))
            .scroll((offset, 0)),
        area,
    );
}

fn form_row_line(
    app: &App,
    workflow: Workflow,
    form: &WorkflowForm,
    row: FormRow,
    focused: bool,
    editing: bool,
) -> Line<'static> {
    match row {
        FormRow::Name => {
            let label = match workflow {
                Workflow::Kubeconfig => "ServiceAccount",
                Workflow::Role => "Role name     ",
            };
            let mut value = form.name().to_string();
            if editing && focused {
                value.push('▏');
            }
            let value_style = if value.is_empty() {
                Style::default().fg(MUTED)
            } else {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            };
            Line::from(vec![
                Span::styled(format!(" {label} "), Style::default().fg(KEY)),
                Span::styled(
                    if value.is_empty() {
                        "press i to type".to_string()
                    } else {
                        value
                    },
                    value_style,
                ),
            ])
        }
        FormRow::Namespace => {
            let hint = match app.namespaces() {
                NamespacePhase::Loading => "loading…".to_string(),
                NamespacePhase::Loaded(_) => {
                    format!("{} available", app.namespaces().namespaces().len())
                }
                NamespacePhase::Failed(error) => {
                    format!("Failed to load namespaces: {}", compact_text(error, 32))
                }
            };
            let hint_color = if matches!(app.namespaces(), NamespacePhase::Failed(_)) {
                ERROR
            } else {
                MUTED
            };
            Line::from(vec![
                Span::styled(" Namespace      ", Style::default().fg(KEY)),
                Span::styled(
                    format!("‹ {} ›", form.namespace()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(format!("  {hint}"), Style::default().fg(hint_color)),
            ])
        }
        FormRow::SelectAll => {
            let all = form.selection().all_selected();
            Line::from(vec![
                Span::styled(
                    format!(" {} ", checkbox(all)),
                    Style::default().fg(ACCENT),
                ),
                Span::styled(
                    "Select all resources",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ])
        }
        FormRow::Resource(index) => match form.selection().entries().get(index) {
            Some(entry) => resource_line(entry),
            None => Line::from(""),
        },
        FormRow::Verbs(index) => match form.selection().entries().get(index) {
            Some(entry) => verbs_line(entry, focused.then_some(form.verb_cursor())),
            None => Line::from(""),
        },
        FormRow::Generate => {
            let (label, color) = if form.submission().is_pending() {
                ("Generating…".to_string(), WARN)
            } else {
                (format!("Generate {}", workflow.artifact_label()), ACCENT)
            };
            Line::from(Span::styled(
                format!(" [ {label} ] "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        FormRow::Save => {
            let file_name = form
                .submission()
                .generated()
                .map(|file| Artifact::new(workflow, &file.account, "").file_name)
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    format!(" [ Save {file_name} ] "),
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" into {}", app.output_dir().display()),
                    Style::default().fg(MUTED),
                ),
            ])
        }
    }
}

fn resource_line(entry: &ResourceEntry) -> Line<'static> {
    let marker = if entry.expanded { "▾" } else { "▸" };
    let name_style = if entry.selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(MUTED)
    };
    let verbs = if entry.selected_verbs.is_empty() {
        "no verbs".to_string()
    } else if entry.all_verbs_selected() {
        "all verbs".to_string()
    } else {
        entry.selected_verbs.join(",")
    };
    Line::from(vec![
        Span::styled(format!("   {marker} "), Style::default().fg(MUTED)),
        Span::styled(
            format!("{} ", checkbox(entry.selected)),
            Style::default().fg(if entry.selected { ACCENT } else { MUTED }),
        ),
        Span::styled(format!("{:<24}", entry.name), name_style),
        Span::styled(
            format!("{:<22}", compact_text(group_label(entry.api_group), 21)),
            Style::default().fg(Color::Rgb(147, 197, 253)),
        ),
        Span::styled(verbs, Style::default().fg(MUTED)),
    ])
}

fn verbs_line(entry: &ResourceEntry, verb_cursor: Option<usize>) -> Line<'static> {
    let mut spans = vec![Span::raw("         ")];
    for (index, verb) in entry.supported_verbs.iter().enumerate() {
        let checked = entry.has_verb(verb);
        let style = if verb_cursor == Some(index) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Rgb(94, 234, 212))
                .add_modifier(Modifier::BOLD)
        } else if checked {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        };
        spans.push(Span::styled(format!("{} {verb}", checkbox(checked)), style));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

fn banner_lines(workflow: Workflow, form: &WorkflowForm) -> Vec<Line<'static>> {
    match form.submission() {
        SubmissionState::Idle => Vec::new(),
        SubmissionState::Invalid(message) | SubmissionState::Failure(message) => {
            vec![Line::from(format!("󰅚 {message}"))]
        }
        SubmissionState::Pending { .. } => {
            vec![Line::from(format!(
                "Generating {}…",
                workflow.artifact_label()
            ))]
        }
        SubmissionState::Success(file) => {
            let mut lines = vec![Line::from(format!(
                "󰄬 {} generated for '{}' at {}",
                workflow.artifact_label(),
                file.account,
                file.received_at.format("%H:%M:%S")
            ))];
            if let Some(path) = form.saved_to() {
                lines.push(Line::from(format!("Saved to {}", path.display())));
            } else {
                lines.push(Line::from("Press s to save it"));
            }
            lines
        }
    }
}

fn render_preview(frame: &mut Frame, area: Rect, workflow: Workflow, form: &WorkflowForm) {
    let (title, text) = match form.submission() {
        SubmissionState::Success(file) => {
            let mut lines = match preview::summarize(workflow, &file.content) {
                Ok(summary) => summary
                    .into_iter()
                    .map(|line| Line::from(Span::styled(line, Style::default().fg(MUTED))))
                    .collect::<Vec<_>>(),
                Err(error) => vec![Line::from(Span::styled(
                    format!("summary unavailable: {error:#}"),
                    Style::default().fg(WARN),
                ))],
            };
            lines.push(Line::from(""));
            lines.extend(highlight_yaml_text(&file.content).lines);
            (
                format!(
                    " {} ",
                    Artifact::new(workflow, &file.account, "").file_name
                ),
                Text::from(lines),
            )
        }
        SubmissionState::Pending { .. } => (
            " Preview ".to_string(),
            Text::from(Span::styled(
                "Waiting for the access API…",
                Style::default().fg(WARN),
            )),
        ),
        _ => (" Request ".to_string(), request_preview(workflow, form)),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .style(Style::default().bg(PANEL));
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: false })
            .scroll((form.preview_scroll(), 0)),
        area,
    );
}

fn request_preview(workflow: Workflow, form: &WorkflowForm) -> Text<'static> {
    let prepared = Submission::prepare(
        workflow,
        form.name(),
        form.namespace(),
        form.selection(),
    );
    let body = match prepared {
        Ok(Submission::Kubeconfig(request)) => serde_json::to_string_pretty(&request),
        Ok(Submission::Role(request)) => serde_json::to_string_pretty(&request),
        Err(error) => {
            return Text::from(Span::styled(
                error.to_string(),
                Style::default().fg(MUTED),
            ));
        }
    };
    match body {
        Ok(body) => Text::from(body.lines().map(highlight_json_line).collect::<Vec<_>>()),
        Err(error) => Text::from(error.to_string()),
    }
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let (mode_label, mode_fg, mode_bg) = match app.mode() {
        InputMode::Normal => (" 󰘳 nrm ", Color::White, PL_A),
        InputMode::EditName => (" 󰏫 edit ", Color::Black, WARN),
    };

    let status_text = app.status().to_string();
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, mode_label, mode_fg, mode_bg, PL_B);
    push_powerline_segment(
        &mut spans,
        format!(
            " {} {} ",
            footer_status_icon(&status_text),
            compact_text(&status_text, area.width.saturating_sub(24).clamp(24, 120) as usize)
        ),
        Color::White,
        PL_B,
        BG,
    );

    let right_spans = vec![
        Span::styled("󰒍 ", Style::default().fg(MUTED)),
        Span::styled(
            compact_text(app.api_base_url(), 36),
            Style::default().fg(Color::Rgb(147, 197, 253)),
        ),
        Span::styled("  ? help ", Style::default().fg(MUTED)),
    ];
    let max_right = area.width.saturating_sub(28);
    let right_width = (spans_width(&right_spans) as u16).min(max_right);
    if right_width == 0 {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(Style::default().bg(BG))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = [
        "failed",
        "error",
        "please",
        "timed out",
        "unreachable",
        "refused",
        "unavailable",
    ]
    .iter()
    .any(|needle| status.contains(needle));
    if has_failure { "󰅚" } else { "󰄬" }
}

fn highlight_yaml_text(input: &str) -> Text<'static> {
    Text::from(input.lines().map(highlight_yaml_line).collect::<Vec<_>>())
}

fn highlight_yaml_line(line: &str) -> Line<'static> {
    let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
    let (indent, trimmed) = line.split_at(indent_len);

    let mut spans = vec![Span::raw(indent.to_string())];
    if trimmed.is_empty() {
        return Line::from(spans);
    }
    if trimmed.starts_with('#') {
        spans.push(Span::styled(trimmed.to_string(), Style::default().fg(MUTED)));
        return Line::from(spans);
    }

    let content = match trimmed.strip_prefix("- ") {
        Some(rest) => {
            spans.push(Span::styled("- ", Style::default().fg(ACCENT)));
            rest
        }
        None => trimmed,
    };
    match split_yaml_key_value(content) {
        Some((key, value)) => {
            spans.push(Span::styled(key.to_string(), Style::default().fg(KEY)));
            spans.push(Span::styled(":", Style::default().fg(MUTED)));
            let value = value.trim();
            if !value.is_empty() {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    value.to_string(),
                    Style::default().fg(scalar_color(value)),
                ));
            }
        }
        None => spans.push(Span::styled(
            content.to_string(),
            Style::default().fg(scalar_color(content)),
        )),
    }
    Line::from(spans)
}

fn split_yaml_key_value(content: &str) -> Option<(&str, &str)> {
    let (key, value) = content.split_once(':')?;
    let key = key.trim_end();
    if key.is_empty() || key.contains(' ') || !(value.is_empty() || value.starts_with(' ')) {
        return None;
    }
    Some((key, value))
}

/// Pretty-printed request bodies only ever hold `"key": value` pairs and brackets.
fn highlight_json_line(line: &str) -> Line<'static> {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, body) = line.split_at(indent_len);
    let mut spans = vec![Span::raw(indent.to_string())];
    match body.split_once("\": ") {
        Some((key, value)) => {
            spans.push(Span::styled(format!("{key}\""), Style::default().fg(KEY)));
            spans.push(Span::styled(": ", Style::default().fg(MUTED)));
            spans.push(Span::styled(
                value.to_string(),
                Style::default().fg(scalar_color(value.trim_end_matches(','))),
            ));
        }
        None => spans.push(Span::styled(
            body.to_string(),
            Style::default().fg(scalar_color(body.trim_end_matches(','))),
        )),
    }
    Line::from(spans)
}

fn scalar_color(value: &str) -> Color {
    if value.starts_with('"') || value.starts_with('\'') {
        Color::Rgb(125, 211, 252)
    } else if matches!(value, "true" | "false" | "null" | "~") {
        WARN
    } else if value.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else if value.starts_with(['{', '[', '}', ']']) {
        MUTED
    } else {
        Color::Rgb(147, 197, 253)
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn push_powerline_segment_rtl(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(72, 70, frame.area());
    frame.render_widget(Clear, area);

    let screen = match app.active_workflow() {
        Some(workflow) => workflow.title(),
        None => "selector",
    };
    let mut lines = vec![
        Line::from(format!(
            "kubeaccess help  mode:{}  screen:{}",
            help_mode_label(app.mode()),
            screen
        )),
        Line::from(""),
    ];
    lines.extend(contextual_help_lines(app).into_iter().map(Line::from));

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn contextual_help_lines(app: &App) -> Vec<&'static str> {
    let mut lines = vec![
        "Global: ? toggle help  q / Ctrl+c quit",
        "Workflows: 1 role  2 kubeconfig  Tab switch  Esc back to selector",
    ];
    match (app.screen(), app.mode()) {
        (Screen::Selector, _) => {
            lines.push("Selector: ←/→ or j/k pick a tool  Enter open");
        }
        (Screen::Workflow(_), InputMode::EditName) => {
            lines.push("Editing name: type to insert  Backspace delete  Enter/Esc done");
        }
        (Screen::Workflow(_), InputMode::Normal) => {
            lines.push("Move: j/k or ↑/↓  Home/End  PageUp/PageDown scroll preview");
            lines.push("Name: i or / edit, or Space on the name row");
            lines.push("Namespace: h/l or ←/→ on the namespace row cycles loaded namespaces");
            lines.push("Resources: Space select  Enter or e expand verbs  a select all");
            lines.push("Verbs: ←/→ pick  Space toggle  A all verbs of the focused resource");
            lines.push("Generate: g  Save generated file: s");
        }
    }
    lines
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::EditName => "edit",
    }
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{compact_text, footer_status_icon, highlight_yaml_line, render};
    use crate::app::{App, BackendEvent};
    use crate::input::Action;
    use crate::model::Workflow;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app(workflow: Option<Workflow>) -> App {
        App::new(
            "http://localhost:5005".to_string(),
            "default",
            PathBuf::from("out"),
            workflow,
        )
    }

    #[test]
    fn selector_lists_both_tools() {
        let text = screen_text(&app(None));
        assert!(text.contains("Kubernetes Access Manager"));
        assert!(text.contains("Role Generator"));
        assert!(text.contains("Kubeconfig Generator"));
        assert!(text.contains("Select a tool to get started"));
    }

    #[test]
    fn generated_file_is_previewed_with_summary() {
        let mut app = app(Some(Workflow::Kubeconfig));
        app.apply_action(Action::EditName);
        for c in "svc1".chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::SubmitInput);
        app.apply_action(Action::SelectAllResources);
        app.apply_action(Action::Generate);
        app.apply_backend_event(BackendEvent::Generated {
            workflow: Workflow::Kubeconfig,
            ticket: 1,
            account: "svc1".to_string(),
            result: Ok("apiVersion: v1\nkind: Config\ncurrent-context: svc1\n".to_string()),
        });

        let text = screen_text(&app);
        assert!(text.contains("kubeconfig-svc1.yaml"));
        assert!(text.contains("context:   svc1"));
        assert!(text.contains("Press s to save it"));
    }

    #[test]
    fn validation_error_is_bannered() {
        let mut app = app(Some(Workflow::Role));
        app.apply_action(Action::Generate);
        assert!(screen_text(&app).contains("Please enter a name"));
    }

    #[test]
    fn yaml_lines_split_keys_from_values() {
        let line = highlight_yaml_line("  - name: svc1");
        let parts = line
            .spans
            .iter()
            .map(|span| span.content.to_string())
            .collect::<Vec<_>>();
        assert_eq!(parts, vec!["  ", "- ", "name", ":", " ", "svc1"]);

        let url = highlight_yaml_line("server: https://10.0.0.1:6443");
        assert_eq!(url.spans[1].content, "server");
        assert_eq!(url.spans[4].content, "https://10.0.0.1:6443");
    }

    #[test]
    fn status_helpers() {
        assert_eq!(compact_text("kubeconfig", 4), "kub…");
        assert_eq!(footer_status_icon("Failed to generate role"), "󰅚");
        assert_eq!(footer_status_icon("Role generated successfully!"), "󰄬");
    }
}
