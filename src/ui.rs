use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use lotto_terminal::model::{BallKind, PredictionResult};
use lotto_terminal::state::{AppState, Overlay, PanelState, Screen};
use lotto_terminal::view::{
    self, BallRow, HISTORY_COLUMNS, HistoryTable, ball_detail_text, history_rows, model_info_lines,
    prediction_log_lines, strategy_selector,
};

pub fn draw(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.screen {
        Screen::Main => render_main(frame, chunks[1], state),
        Screen::About => render_about(frame, chunks[1]),
    }

    let notice = state
        .notice
        .as_ref()
        .map(|n| n.text.as_str())
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(notice).style(Style::default().fg(Color::Green)),
        chunks[2],
    );

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    frame.render_widget(Paragraph::new(footer_text(state)), chunks[4]);

    if let Some(overlay) = state.overlay {
        render_overlay(frame, frame.size(), state, overlay);
    }
}

fn header_text(state: &AppState) -> String {
    let updated = state.updated_at.as_deref().unwrap_or("--");
    format!(
        " LOTTO LAB | Strategy: {} | Data updated: {}",
        state.strategy.label(),
        updated
    )
}

fn footer_text(state: &AppState) -> &'static str {
    match state.screen {
        Screen::Main => {
            "n New analysis | 1-4 Strategy | r Reload | R History | ←/→ Ball | Enter Detail | h Log | e Export | a About | ? Help | q Quit"
        }
        Screen::About => "a/Esc Back | q Quit",
    }
}

fn render_main(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(4)])
        .split(area);

    let block = Block::default().title("Prediction").borders(Borders::ALL);
    match &state.prediction {
        PanelState::Loading => {
            let loading = Paragraph::new("Loading prediction...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(loading, rows[0]);
        }
        PanelState::Errored { message } => {
            frame.render_widget(error_panel(message, "r", block), rows[0]);
        }
        PanelState::Shown(result) => {
            let text = prediction_lines(result, state);
            frame.render_widget(Paragraph::new(text).block(block), rows[0]);
        }
    }

    render_history(frame, rows[1], state);
}

fn error_panel<'a>(message: &'a str, retry_key: &'a str, block: Block<'a>) -> Paragraph<'a> {
    let lines = vec![
        Line::styled(
            "Something went wrong",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::raw(message),
        Line::raw(""),
        Line::styled(
            format!("[{retry_key}] Retry"),
            Style::default().add_modifier(Modifier::REVERSED),
        ),
    ];
    Paragraph::new(lines).block(block).wrap(Wrap { trim: true })
}

fn prediction_lines<'a>(result: &'a PredictionResult, state: &AppState) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for (kind, title) in [(BallKind::Red, "Red  "), (BallKind::Blue, "Blue ")] {
        let row = view::ball_views(result.balls(kind), kind);
        let mut spans = vec![Span::raw(title)];
        match &row {
            BallRow::Empty => {
                spans.push(Span::styled(view::NO_DATA, Style::default().fg(Color::DarkGray)));
            }
            BallRow::Balls(balls) => {
                for (i, ball) in balls.iter().enumerate() {
                    let color = match ball.kind {
                        BallKind::Red => Color::Red,
                        BallKind::Blue => Color::Blue,
                    };
                    let mut style = Style::default().fg(color).add_modifier(Modifier::BOLD);
                    if offset + i == state.selected_ball {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    spans.push(Span::styled(format!("({})", ball.label), style));
                    spans.push(Span::raw(" "));
                }
            }
        }
        offset += row.len();
        lines.push(Line::from(spans));
    }

    if state.selector_visible {
        let mut spans = vec![Span::raw("Strategy ")];
        for option in strategy_selector(state.strategy) {
            let text = format!("{} {}", option.key, option.strategy.label());
            let style = if option.active {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(text, style));
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            state.strategy.blurb(),
            Style::default().add_modifier(Modifier::ITALIC),
        ));
        lines.push(Line::from(spans));
    }

    lines.push(Line::raw(""));
    for info in model_info_lines(result, state.updated_at.as_deref()) {
        lines.push(Line::raw(info));
    }
    lines
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Recent draws").borders(Borders::ALL);
    let result = match &state.history {
        PanelState::Loading => {
            let loading = Paragraph::new("Loading history...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(loading, area);
            return;
        }
        PanelState::Errored { message } => {
            frame.render_widget(error_panel(message, "R", block), area);
            return;
        }
        PanelState::Shown(result) => result,
    };

    let widths = [
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Min(20),
    ];
    let header = Row::new(HISTORY_COLUMNS.to_vec())
        .style(Style::default().add_modifier(Modifier::BOLD));

    match history_rows(&result.history) {
        HistoryTable::Placeholder(text) => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(inner);
            frame.render_widget(Table::new(Vec::<Row>::new(), widths).header(header), parts[0]);
            frame.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray)),
                parts[1],
            );
        }
        HistoryTable::Rows(rows) => {
            let rows: Vec<Row> = rows
                .into_iter()
                .map(|row| {
                    let numbers = Line::from(vec![
                        Span::styled(row.red.join(" "), Style::default().fg(Color::Red)),
                        Span::raw(" + "),
                        Span::styled(row.blue.join(" "), Style::default().fg(Color::Blue)),
                    ]);
                    Row::new(vec![
                        Cell::from(row.period),
                        Cell::from(row.date),
                        Cell::from(numbers),
                    ])
                })
                .collect();
            frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
        }
    }
}

fn render_about(frame: &mut Frame, area: Rect) {
    let text = [
        "About this lab",
        "",
        "Predictions are produced by the backend from historical draw frequencies.",
        "Strategies only change how hot, warm and cold numbers are weighted.",
        "",
        "Lottery draws are independent random events. Past frequency does not",
        "predict future draws, and nothing here improves your odds.",
        "Play responsibly.",
    ]
    .join("\n");
    let about = Paragraph::new(text)
        .block(Block::default().title("About").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(about, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_overlay(frame: &mut Frame, area: Rect, state: &AppState, overlay: Overlay) {
    let (title, text) = match overlay {
        Overlay::PredictionLog => {
            let mut lines = prediction_log_lines(&state.prediction_log);
            lines.push(String::new());
            lines.push("c Clear | h/Esc Close".to_string());
            ("Prediction log", lines.join("\n"))
        }
        Overlay::ConfirmClear => (
            "Confirm",
            format!(
                "Clear {} logged predictions?\n\ny Yes | n No",
                state.prediction_log.len()
            ),
        ),
        Overlay::BallDetail => {
            let text = match (state.selected_ball(), state.prediction.shown()) {
                (Some((kind, number)), Some(result)) => ball_detail_text(
                    kind,
                    number,
                    result.detail_for(kind, number),
                    result.sample_size(),
                ),
                _ => view::NO_DATA.to_string(),
            };
            ("Ball detail", text)
        }
        Overlay::Help => ("Help", help_text()),
    };

    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(text)
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(popup, popup_area);
}

fn help_text() -> String {
    [
        "Lotto Lab - Help",
        "",
        "  n            New analysis (logged)",
        "  1-4          Conservative / Balanced / Aggressive / Random",
        "  r            Reload prediction",
        "  R            Reload history",
        "  ←/→          Select ball",
        "  Enter / d    Ball detail",
        "  h            Prediction log",
        "  c            Clear prediction log",
        "  e            Export prediction",
        "  a            About",
        "  Esc / b      Close / back",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
