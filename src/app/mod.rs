mod renderer;

use std::{
    collections::HashSet,
    io::{Stdout, Write},
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{self, KeyCode},
    queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};
use rand::Rng;

use crate::{
    app::renderer::{Phase, Renderer},
    config::{AlgorithmKind, MazeConfig},
    generators::Generator,
    maze::{Maze, OperationKind},
    solvers::Solver,
};

#[derive(Debug, Clone, Copy)]
enum UserActionEvent {
    /// Pause or resume whatever is running
    TogglePause,
    /// Regenerate with the selected generator
    Generate,
    /// Solve with the selected solver
    Solve,
    /// Flood from a random cell
    Fill,
    /// Pick a random generator and solver, then regenerate
    Shuffle,
    /// Halve the delay of the current algorithm
    SpeedUp,
    /// Double the delay of the current algorithm
    SlowDown,
    /// Terminal resize
    Resize,
    /// Stop and exit
    Cancel,
}

impl UserActionEvent {
    fn from_key(code: KeyCode) -> Option<Self> {
        let action = match code {
            KeyCode::Enter => UserActionEvent::TogglePause,
            KeyCode::Char('g') => UserActionEvent::Generate,
            KeyCode::Char('s') => UserActionEvent::Solve,
            KeyCode::Char('f') => UserActionEvent::Fill,
            KeyCode::Char('r') => UserActionEvent::Shuffle,
            KeyCode::Up => UserActionEvent::SpeedUp,
            KeyCode::Down => UserActionEvent::SlowDown,
            KeyCode::Esc => UserActionEvent::Cancel,
            _ => return None,
        };
        Some(action)
    }
}

/// A finished operation as reported by its callback, tagged with the id of
/// the start request that launched it.
type Completion = (u64, OperationKind, bool);

pub struct App {
    /// How long to wait for input between frames
    frame_interval: Duration,
    /// Slowest pacing the arrow keys can reach
    max_delay: Duration,
}

impl Default for App {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(33),
            max_delay: Duration::from_millis(500),
        }
    }
}

/// Everything the controller loop tracks between frames.
struct Session {
    generator: Generator,
    solver: Solver,
    auto_solve: bool,
    /// Algorithm the speed keys apply to
    current: AlgorithmKind,
    /// How the renderer reads cell flags
    phase: Phase,
    message: String,
    /// Id of the next start request
    next_run: u64,
    /// Start requests that were refused; their `false` report is not news
    refused: HashSet<u64>,
}

impl App {
    /// Set a panic hook to restore terminal state on panic, even if the panic
    /// occurs on a maze worker
    fn set_panic_hook() {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = App::restore_terminal(&mut std::io::stdout());
            hook(panic_info);
        }));
    }

    /// Setup terminal in raw mode and enter alternate screen
    pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        terminal::enable_raw_mode()?;
        App::set_panic_hook();
        queue!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Leave alternate screen and disable raw mode
    pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        queue!(stdout, terminal::LeaveAlternateScreen, cursor::Show)?;
        stdout.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Asks for the maze setup, then drives the maze until the user presses Esc.
    pub fn run(&self, stdout: &mut Stdout) -> std::io::Result<()> {
        let Some((width, height)) = App::ask_maze_dimensions(stdout)? else {
            return Ok(());
        };

        let Some(generator) = App::select_from_menu(
            stdout,
            "Select maze generation algorithm (use arrow keys and Enter, or Esc to exit):",
            &Generator::ALL,
        )?
        else {
            return Ok(());
        };
        App::print_selected(stdout, "generator", &generator)?;

        let Some(solver) = App::select_from_menu(
            stdout,
            "Select maze solving algorithm (use arrow keys and Enter, or Esc to exit):",
            &Solver::ALL,
        )?
        else {
            return Ok(());
        };
        App::print_selected(stdout, "solver", &solver)?;

        let Some(auto_solve) = App::select_from_menu(
            stdout,
            "Solve automatically once the maze is generated? (use arrow keys and Enter, or Esc to exit):",
            &["Yes", "No"],
        )?
        .map(|choice| choice == "Yes") else {
            return Ok(());
        };

        let maze = Maze::new(MazeConfig::default().with_size(width, height));
        let mut session = Session {
            generator,
            solver,
            auto_solve,
            current: AlgorithmKind::Generate(generator),
            phase: Phase::Carving,
            message: String::new(),
            next_run: 0,
            refused: HashSet::new(),
        };
        let (completion_tx, completion_rx) = mpsc::channel::<Completion>();
        App::start(&maze, &mut session, UserActionEvent::Generate, &completion_tx);

        let result = self.app_loop(stdout, &maze, &mut session, &completion_tx, completion_rx);
        // Dropping the maze stops and joins the worker
        drop(maze);
        result
    }

    /// Draws a frame, then handles at most one input event and every pending
    /// completion, until the user cancels
    fn app_loop(
        &self,
        stdout: &mut Stdout,
        maze: &Maze,
        session: &mut Session,
        completion_tx: &Sender<Completion>,
        completion_rx: Receiver<Completion>,
    ) -> std::io::Result<()> {
        tracing::info!("Started main app loop");
        let mut renderer = Renderer::new();

        loop {
            let status = App::status_line(maze, session);
            renderer.draw(stdout, &maze.cell_buffer(), session.phase, &status)?;

            if event::poll(self.frame_interval)? {
                let action = match event::read()? {
                    event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                        UserActionEvent::from_key(key_event.code)
                    }
                    event::Event::Resize(_, _) => Some(UserActionEvent::Resize),
                    _ => None,
                };
                if let Some(action) = action {
                    tracing::debug!(?action, "user action");
                    if !self.handle_action(maze, session, action, completion_tx, &mut renderer) {
                        break;
                    }
                }
            }

            while let Ok((run, op, success)) = completion_rx.try_recv() {
                if session.refused.remove(&run) {
                    continue;
                }
                session.message = match success {
                    true => format!("{} finished", session.current),
                    false => format!("{} ended without success", session.current),
                };
                if op == OperationKind::Generation && success && session.auto_solve {
                    App::start(maze, session, UserActionEvent::Solve, completion_tx);
                }
            }
        }

        tracing::info!("Exiting main app loop");
        Ok(())
    }

    /// Returns false when the loop should exit
    fn handle_action(
        &self,
        maze: &Maze,
        session: &mut Session,
        action: UserActionEvent,
        completion_tx: &Sender<Completion>,
        renderer: &mut Renderer,
    ) -> bool {
        match action {
            UserActionEvent::Cancel => {
                App::stop_active(maze);
                return false;
            }
            UserActionEvent::TogglePause => App::toggle_pause(maze, session),
            UserActionEvent::SpeedUp | UserActionEvent::SlowDown => {
                let delay = maze.animation_delay(session.current);
                let delay = match action {
                    UserActionEvent::SpeedUp => delay / 2,
                    _ => (delay * 2).max(Duration::from_millis(1)),
                }
                .min(self.max_delay);
                maze.set_animation_delay(session.current, Some(delay));
                session.message = format!("{} delay: {:?}", session.current, delay);
            }
            UserActionEvent::Resize => renderer.force_redraw(),
            UserActionEvent::Shuffle => {
                let mut rng = rand::rng();
                session.generator = Generator::ALL[rng.random_range(0..Generator::ALL.len())];
                session.solver = Solver::ALL[rng.random_range(0..Solver::ALL.len())];
                App::start(maze, session, UserActionEvent::Generate, completion_tx);
            }
            start => App::start(maze, session, start, completion_tx),
        }
        true
    }

    /// Starts the operation named by `action` if nothing else is running
    fn start(
        maze: &Maze,
        session: &mut Session,
        action: UserActionEvent,
        completion_tx: &Sender<Completion>,
    ) {
        let run = session.next_run;
        session.next_run += 1;
        let notify = |op: OperationKind| {
            let tx = completion_tx.clone();
            // The loop may already be gone when a stopped worker reports
            move |success| {
                tx.send((run, op, success)).ok();
            }
        };
        let (kind, result) = match action {
            UserActionEvent::Generate => {
                let kind = AlgorithmKind::Generate(session.generator);
                (kind, maze.generate(session.generator, notify(OperationKind::Generation)))
            }
            UserActionEvent::Solve => {
                let kind = AlgorithmKind::Solve(session.solver);
                (kind, maze.start_solve(session.solver, notify(OperationKind::Solving)))
            }
            UserActionEvent::Fill => {
                let mut rng = rand::rng();
                let row = rng.random_range(0..maze.height());
                let col = rng.random_range(0..maze.width());
                (AlgorithmKind::Fill, maze.fill(row, col, notify(OperationKind::Fill)))
            }
            _ => return,
        };
        match result {
            Ok(()) => {
                session.current = kind;
                session.phase = match kind {
                    AlgorithmKind::Generate(_) => Phase::Carving,
                    _ => Phase::Searching,
                };
                session.message = format!("Running {kind}");
            }
            Err(err) => {
                session.refused.insert(run);
                session.message = err.to_string();
            }
        }
    }

    fn toggle_pause(maze: &Maze, session: &mut Session) {
        let Some(op) = maze.active_operation() else {
            session.message = "Nothing is running".to_string();
            return;
        };
        let paused = maze.is_paused(op);
        let changed = match (op, paused) {
            (OperationKind::Generation, false) => maze.pause_generation(),
            (OperationKind::Generation, true) => maze.resume_generation(),
            (OperationKind::Solving, false) => maze.pause_solving(),
            (OperationKind::Solving, true) => maze.resume_solving(),
            (OperationKind::Fill, false) => maze.pause_fill(),
            (OperationKind::Fill, true) => maze.resume_fill(),
        };
        if changed {
            session.message = match paused {
                true => format!("Resumed {op}"),
                false => format!("Paused {op}"),
            };
        }
    }

    fn stop_active(maze: &Maze) {
        match maze.active_operation() {
            Some(OperationKind::Generation) => maze.stop_generation(),
            Some(OperationKind::Solving) => maze.stop_solving(),
            Some(OperationKind::Fill) => maze.stop_fill(),
            None => false,
        };
    }

    fn status_line(maze: &Maze, session: &Session) -> String {
        let state = match maze.active_operation() {
            Some(op) if maze.is_paused(op) => "paused",
            Some(_) => "running",
            None => "idle",
        };
        format!(
            "[{state}] {} | gen: {} | solve: {} | Enter pause, g/s/f start, r shuffle, ↑/↓ speed, Esc exit",
            session.message, session.generator, session.solver
        )
    }

    fn print_selected(
        stdout: &mut Stdout,
        what: &str,
        choice: &impl std::fmt::Display,
    ) -> std::io::Result<()> {
        stdout.execute(style::PrintStyledContent(
            format!("Selected {what}: {choice}\r\n")
                .with(Color::Green)
                .attribute(Attribute::Bold),
        ))?;
        Ok(())
    }

    /// Get user input with real-time validation and feedback
    /// Returns None if user cancels input with Esc
    fn prompt_with_validation<F, T>(
        stdout: &mut Stdout,
        prompt: &str,
        validate: F,
    ) -> std::io::Result<Option<T>>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        queue!(stdout, cursor::Hide, cursor::SavePosition)?;
        stdout.flush()?;

        let mut input = String::new();

        let value = loop {
            queue!(
                stdout,
                cursor::RestorePosition,
                terminal::Clear(ClearType::FromCursorDown)
            )?;
            stdout.queue(style::PrintStyledContent(
                prompt.with(Color::Cyan).attribute(Attribute::Bold),
            ))?;

            let validation_result = validate(input.trim());
            let color = match validation_result {
                Ok(_) => Color::Green,
                Err(_) => Color::Red,
            };
            queue!(
                stdout,
                style::SetForegroundColor(color),
                style::Print(&input),
                style::ResetColor,
                style::Print(" \r\n")
            )?;
            if let Err(msg) = validation_result {
                stdout.queue(style::PrintStyledContent(
                    msg.with(Color::DarkGrey).attribute(Attribute::Dim),
                ))?;
            }
            stdout.flush()?;

            if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
                if kind != event::KeyEventKind::Press {
                    continue;
                }
                match code {
                    KeyCode::Enter => {
                        if let Ok(value) = validate(input.trim()) {
                            break Some(value);
                        }
                    }
                    KeyCode::Char(c) if !c.is_whitespace() && !c.is_control() => input.push(c),
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Esc => break None,
                    _ => {}
                }
            }
        };
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown),
            cursor::Show
        )?;
        stdout.flush()?;

        Ok(value)
    }

    /// Accepts an empty string as `max`, otherwise a number in `1..=max`
    fn parse_dimension(s: &str, max: usize) -> Result<usize, String> {
        if s.is_empty() {
            return Ok(max);
        }
        let error_msg = format!("Please enter a number between 1 and {max}, or nothing for {max}.");
        match s.parse::<usize>() {
            Ok(n) if (1..=max).contains(&n) => Ok(n),
            _ => Err(error_msg),
        }
    }

    /// Ask user for maze dimensions, capped by what fits the terminal
    /// Returns None if user cancels input with Esc
    fn ask_maze_dimensions(stdout: &mut Stdout) -> std::io::Result<Option<(usize, usize)>> {
        stdout.execute(style::PrintStyledContent(
            "Enter maze dimensions, or press Esc to exit. \
Maximum acceptable values are based on current terminal size.\r\n"
                .with(Color::Blue),
        ))?;

        let max_size = || {
            terminal::size()
                .map(|(w, h)| Renderer::max_maze_size(w, h))
                .unwrap_or((u8::MAX as usize, u8::MAX as usize))
        };

        let Some(width) = App::prompt_with_validation(stdout, "Width: ", |s| {
            App::parse_dimension(s, max_size().0)
        })?
        else {
            return Ok(None);
        };
        App::print_selected(stdout, "width", &width)?;

        let Some(height) = App::prompt_with_validation(stdout, "Height: ", |s| {
            App::parse_dimension(s, max_size().1)
        })?
        else {
            return Ok(None);
        };
        App::print_selected(stdout, "height", &height)?;

        Ok(Some((width, height)))
    }

    /// Present a menu of options and let the user pick one with the arrow keys
    /// Returns None if user cancels input with Esc
    fn select_from_menu<T: std::fmt::Display + Copy>(
        stdout: &mut Stdout,
        prompt: &str,
        options: &[T],
    ) -> std::io::Result<Option<T>> {
        if options.is_empty() {
            return Ok(None);
        }
        queue!(stdout, cursor::Hide, cursor::SavePosition)?;

        let mut selected = 0;

        let selected_option = loop {
            queue!(
                stdout,
                cursor::RestorePosition,
                terminal::Clear(ClearType::FromCursorDown)
            )?;
            stdout.queue(style::PrintStyledContent(prompt.with(Color::Yellow)))?;
            for (i, option) in options.iter().enumerate() {
                if i == selected {
                    stdout.queue(style::SetAttribute(Attribute::Reverse))?;
                }
                stdout.queue(style::Print(format!("\r\n{option}")))?;
                if i == selected {
                    stdout.queue(style::SetAttribute(Attribute::NoReverse))?;
                }
            }
            stdout.queue(style::Print("\r\n"))?;
            stdout.flush()?;

            if let event::Event::Key(event::KeyEvent { code, kind, .. }) = event::read()? {
                if kind != event::KeyEventKind::Press {
                    continue;
                }
                match code {
                    KeyCode::Up => selected = (selected + options.len() - 1) % options.len(),
                    KeyCode::Down => selected = (selected + 1) % options.len(),
                    KeyCode::Enter => break Some(options[selected]),
                    KeyCode::Esc => break None,
                    _ => {}
                }
            }
        };
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown),
            cursor::Show
        )?;
        stdout.flush()?;

        Ok(selected_option)
    }
}
