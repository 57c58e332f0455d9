use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;

use lotto_terminal::config::AppConfig;
use lotto_terminal::controller::Controller;
use lotto_terminal::http_client::ReqwestTransport;
use lotto_terminal::logging;
use lotto_terminal::model::Strategy;
use lotto_terminal::provider::{self, Endpoints};
use lotto_terminal::state::{Delta, Overlay};

mod ui;

struct App {
    controller: Controller,
    config: AppConfig,
    should_quit: bool,
}

impl App {
    fn new(controller: Controller, config: AppConfig) -> Self {
        Self {
            controller,
            config,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let c = &mut self.controller;

        // The confirmation prompt swallows everything but its answers.
        if c.state.overlay == Some(Overlay::ConfirmClear) {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => c.confirm_clear(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => c.cancel_clear(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => c.retry_prediction(),
            KeyCode::Char('R') => c.retry_history(),
            KeyCode::Char('n') | KeyCode::Char('N') => c.reanalyze(),
            KeyCode::Char(ch @ '1'..='4') => {
                let idx = ch.to_digit(10).unwrap_or_default() as usize;
                if let Some(strategy) = Strategy::from_index(idx) {
                    c.change_strategy(strategy);
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') => c.toggle_about(),
            KeyCode::Char('h') | KeyCode::Char('H') => {
                if c.state.overlay == Some(Overlay::PredictionLog) {
                    c.close_history_modal();
                } else {
                    c.show_prediction_history();
                }
            }
            KeyCode::Char('c') | KeyCode::Char('C') => c.clear_prediction_history(),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                c.export_prediction(&self.config.export_dir);
            }
            KeyCode::Left | KeyCode::Char('k') => c.select_prev_ball(),
            KeyCode::Right | KeyCode::Char('j') => c.select_next_ball(),
            KeyCode::Enter | KeyCode::Char('d') => c.show_ball_detail(),
            KeyCode::Char('?') => c.toggle_help(),
            KeyCode::Esc | KeyCode::Char('b') => c.back(),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    logging::init_logging(&config.log_level, config.log_file.as_deref())?;
    tracing::info!(base_url = %config.base_url, "starting lotto_terminal");

    let transport = ReqwestTransport::new(config.request_timeout)?;
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    provider::spawn_provider(tx, cmd_rx, Arc::new(transport), Endpoints::from_config(&config));

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let history_limit = Some(config.history_limit);
    let mut app = App::new(Controller::new(Some(cmd_tx), history_limit), config);
    app.controller.start();
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "ui loop failed");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = app.config.tick_rate;
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            app.controller.apply(delta);
        }
        app.controller.tick(Instant::now());

        terminal.draw(|f| ui::draw(f, &app.controller.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
