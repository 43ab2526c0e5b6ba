use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, InputMode};
use crate::state::{AgentState, Role, StepIcon, TraceStep};

const SIDE_PANEL_WIDTH: u16 = 34;
const PLACEHOLDER: &str = "Ask about Project Omega...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [chat_column, side_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(SIDE_PANEL_WIDTH),
    ])
    .areas(body_area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(chat_column);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_side_panel(app, frame, side_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ◆ ", Style::default().fg(Color::LightBlue)),
        Span::styled("Agentic RAG Control Panel", Style::default().fg(Color::White).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Lines of the conversation, including the "Thinking..." indicator
fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in &app.session.messages {
        let mut role_line = match msg.role {
            Role::User => vec![Span::styled(
                msg.role.display_name(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )],
            Role::Assistant => vec![Span::styled(
                msg.role.display_name(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )],
        };
        if msg.is_verified() {
            role_line.push(Span::styled(" ✓", Style::default().fg(Color::Green)));
        }
        role_line.push(Span::styled(
            format!("  {}", msg.timestamp.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::from(role_line));

        for line in msg.content.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.is_processing() {
        lines.push(Line::from(Span::styled(
            Role::Assistant.display_name(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store for mouse hit-testing and scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.client.endpoint()));

    let text = if app.session.messages.is_empty() && !app.is_processing() {
        Text::from(Span::styled(
            "No messages yet. Type a question below and press Enter.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(chat_lines(app))
    };

    // Measure before the block is attached; line_count ignores side borders
    let chat = Paragraph::new(text).wrap(Wrap { trim: true });
    app.set_chat_total_lines(chat.line_count(app.chat_width));

    let chat = chat.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let busy = app.is_processing();

    let border_color = if busy {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if busy { " Ask (waiting for reply) " } else { " Ask " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.session.input.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = app.session.input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let style = if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Paragraph::new(visible_text).style(style)
    };

    frame.render_widget(input.block(block), area);

    if editing && !busy {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn status_color(status: AgentState) -> Color {
    match status {
        AgentState::Idle => Color::Gray,
        AgentState::Researching => Color::Yellow,
        AgentState::Verified => Color::Green,
        AgentState::Error => Color::Red,
    }
}

fn trace_step_lines(step: &TraceStep) -> Vec<Line<'static>> {
    let icon = match step.icon {
        StepIcon::Researcher => "⌕",
        StepIcon::Critic => "⚖",
    };

    vec![
        Line::from(vec![
            Span::styled(format!("{} ", icon), Style::default().fg(Color::LightBlue)),
            Span::styled(step.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled(step.timestamp.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(step.description.clone(), Style::default().fg(Color::Gray)),
            Span::styled(
                format!(" [{}]", step.status.as_str()),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::default(),
    ]
}

fn render_side_panel(app: &App, frame: &mut Frame, area: Rect) {
    let [status_area, trace_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let status = app.session.status;
    let status_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Agent Status ");
    let status_line = Line::from(vec![
        Span::styled("● ", Style::default().fg(status_color(status))),
        Span::styled(status.label(), Style::default().fg(status_color(status)).bold()),
    ]);
    frame.render_widget(Paragraph::new(status_line).block(status_block), status_area);

    let trace_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Execution Trace ");
    let trace_text = if app.session.trace.is_empty() {
        Text::from(Span::styled(
            "No steps recorded.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(
            app.session
                .trace
                .iter()
                .flat_map(trace_step_lines)
                .collect::<Vec<_>>(),
        )
    };
    // Untrimmed so descriptions keep their indent under the step name
    let trace = Paragraph::new(trace_text)
        .block(trace_block)
        .wrap(Wrap { trim: false });
    frame.render_widget(trace, trace_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
            Span::styled(" Ctrl-C ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/bottom ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
