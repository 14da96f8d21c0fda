//! UI rendering for the quiz trainer.

use crate::app::{App, InputField, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    match app.view {
        View::TermList => draw_term_list(f, app),
        View::Quiz => draw_quiz(f, app),
        View::History => draw_history(f, app),
    }

    if app.show_help {
        draw_help(f);
    }

    if app.editing {
        draw_input(f, app);
    }

    if let Some(msg) = &app.message {
        draw_message(f, msg);
    }
}

fn draw_term_list(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let title = if app.stats.answered > 0 {
        format!(
            "Vocab Quiz | {} answered, {:.0}% correct",
            app.stats.answered,
            app.stats.accuracy() * 100.0
        )
    } else {
        "Vocab Quiz".to_string()
    };
    let header = Paragraph::new(title)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    if app.terms.is_empty() {
        let msg = Paragraph::new("No terms yet. Press 'a' to add one.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Terms "));
        f.render_widget(msg, chunks[1]);
    } else {
        let items: Vec<ListItem> = app
            .terms
            .iter()
            .enumerate()
            .map(|(i, term)| {
                let selected = i == app.selected_term;
                let name_style = if selected {
                    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                let spans = vec![
                    Span::styled(&term.name, name_style),
                    Span::raw(" - "),
                    Span::styled(&term.definition, Style::default().fg(Color::DarkGray)),
                ];

                ListItem::new(Line::from(spans)).style(if selected {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                })
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Terms "));
        f.render_widget(list, chunks[1]);
    }

    let footer = Paragraph::new("j/k:Navigate  Enter:Def→Term  t:Term→Def  a:Add term  h:History  ?:Help  q:Quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn draw_quiz(f: &mut Frame, app: &App) {
    let Some(play) = &app.play else { return };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Question type
            Constraint::Min(5),     // Prompt
            Constraint::Length(play.quiz.choices.len() as u16 + 2),
            Constraint::Length(3),  // Keys
        ])
        .split(f.area());

    let header = Paragraph::new(play.quiz.question_type.name())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let prompt = Paragraph::new(play.term.prompt_text(play.quiz.question_type))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Question "))
        .wrap(Wrap { trim: true });
    f.render_widget(prompt, chunks[1]);

    let items: Vec<ListItem> = play
        .quiz
        .choices
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let style = match play.answered {
                Some(_) if choice.is_correct => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                Some(a) if a.choice_id == choice.id => Style::default().fg(Color::Red),
                _ => Style::default(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", i + 1), Style::default().fg(Color::Yellow)),
                Span::styled(choice.text.as_str(), style),
            ]))
        })
        .collect();

    let title = match play.answered {
        Some(a) if a.is_correct => " Correct! ",
        Some(_) => " Wrong ",
        None => " Choices ",
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, chunks[2]);

    let keys = if play.answered.is_some() {
        "n:Answer again  q:Back"
    } else {
        "1-9:Answer  q:Back"
    };
    let footer = Paragraph::new(keys)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);
}

fn draw_history(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let header = Paragraph::new("Recent Answers")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let rows: Vec<Row> = app
        .history
        .iter()
        .map(|row| {
            let (mark, color) = if row.history.is_correct {
                ("✓", Color::Green)
            } else {
                ("✗", Color::Red)
            };
            Row::new(vec![
                Span::styled(mark, Style::default().fg(color)),
                Span::raw(row.term_name.clone()),
                Span::raw(row.question_type.code()),
                Span::raw(
                    row.history
                        .answered_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                ),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Percentage(50),
            Constraint::Length(6),
            Constraint::Min(16),
        ],
    )
    .header(Row::new(vec!["", "Term", "Type", "Answered"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(table, chunks[1]);

    let footer = Paragraph::new("q:Back  ?:Help")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help = r#"
Vocab Quiz Keybindings

Term List:
  j/k, Up/Down    Navigate terms
  Enter, Space    Quiz: definition → term
  t               Quiz: term → definition
  a               Add new term
  h               Answer history
  q               Quit

Quiz:
  1-9             Pick a choice
  n, r            Answer again
  q, Esc          Back to terms

General:
  ?               Show this help

Press any key to close
"#;

    let popup = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });
    f.render_widget(popup, area);
}

fn draw_input(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 15, f.area());
    f.render_widget(Clear, area);

    let title = match app.input_field {
        InputField::TermName => "Enter term",
        InputField::TermDefinition => "Enter definition",
        InputField::None => "",
    };

    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title)));
    f.render_widget(input, area);

    let cursor = app.input_buffer.chars().count() as u16;
    f.set_cursor_position((area.x + 1 + cursor, area.y + 1));
}

fn draw_message(f: &mut Frame, msg: &str) {
    let area = Rect::new(
        f.area().x + 2,
        f.area().height.saturating_sub(5),
        f.area().width.saturating_sub(4),
        3,
    );
    f.render_widget(Clear, area);

    let message = Paragraph::new(msg)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(message, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
