use chrono::{DateTime, Local, NaiveDate};
use notify_rust::Notification;
use std::fs::OpenOptions;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::time::{Duration, interval};

mod config;
mod timer;
mod todo;
mod ws;

use timer::clock::TokioClock;
use timer::engine::TimerEngine;
use timer::registry::{DurationRegistry, Phase, ValidationError};
use todo::list::{SHARE_CARD_TEXT, TodoList};
use todo::store::TodoDocument;
use ws::websocket_server::{StateEvent, TimerCommand};

/// Timestamped append-only activity log. Write failures are ignored;
/// logging must never take the timer down.
struct ActivityLog {
    path: Option<String>,
}

impl ActivityLog {
    fn new(path: Option<String>) -> Self {
        let log = Self { path };
        log.raw(&format!(
            "=== Session started at {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        log
    }

    fn log_to_file(path: &str, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", message)?;
        Ok(())
    }

    fn raw(&self, message: &str) {
        if let Some(ref path) = self.path {
            let _ = Self::log_to_file(path, message);
        }
    }

    fn log(&self, message: &str) {
        self.raw(&format!(
            "[{}] {}",
            Local::now().format("%H:%M:%S"),
            message
        ));
    }
}

fn send_notification(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .summary("Focus Clock")
        .body(message)
        .timeout(0) // No auto-dismiss
        .show()?;
    Ok(())
}

fn switch_message(next: Phase, registry: &DurationRegistry) -> String {
    match next {
        Phase::Break => format!(
            "Work session complete! Time for a {}-minute break.",
            registry.selected(Phase::Break)
        ),
        Phase::Work => format!(
            "Break is over! Starting {}-minute work session.",
            registry.selected(Phase::Work)
        ),
    }
}

fn today_string() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn stamp_string() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn flag_value(args: &[String], long: &str, short: &str) -> Option<String> {
    args.iter()
        .position(|a| a == long || a == short)
        .and_then(|pos| args.get(pos + 1).cloned())
}

fn apply_duration_flags(
    args: &[String],
    registry: &mut DurationRegistry,
) -> Result<(), ValidationError> {
    if let Some(raw) = flag_value(args, "--work", "-w") {
        let minutes = DurationRegistry::parse_custom(Phase::Work, &raw)?;
        registry.select(Phase::Work, minutes);
    }
    if let Some(raw) = flag_value(args, "--break", "-b") {
        let minutes = DurationRegistry::parse_custom(Phase::Break, &raw)?;
        registry.select(Phase::Break, minutes);
    }
    Ok(())
}

fn print_usage() {
    println!("Usage: focus_clock [--daemon] [--work <minutes>] [--break <minutes>]");
    println!("                   [--addr <host:port>] [--log <file>] [--no-notify] [--verbose]");
}

fn print_help() {
    println!("\nCommands:");
    println!("  start | pause | reset          control the timer");
    println!("  work <minutes>                 work duration (presets 25/30/45, custom 1-120)");
    println!("  break <minutes>                break duration (presets 5/10/15, custom 1-60)");
    println!("  status                         timer and to-do summary");
    println!("  todos                          list tasks");
    println!("  todo add <name> [@YYYY-MM-DD]  add a task (today by default)");
    println!("  todo done <n> | todo rm <n>    toggle or remove task n");
    println!("  todo all | todo clear          toggle all of today / drop completed");
    println!("  share                          print the share-card line");
    println!("  quit                           save and exit\n");
}

/// Interactive-mode state: the host owns the engine and the to-do list
/// and threads them through every command.
struct Session {
    engine: TimerEngine<TokioClock>,
    todos: TodoList,
    store_path: PathBuf,
    log: ActivityLog,
    notify: bool,
    verbose: bool,
    session_start: DateTime<Local>,
}

impl Session {
    fn redraw(&self) {
        let display = self.engine.display();
        print!(
            "\r🕐 {}  {}:{}  {}  🍅 {}        ",
            Local::now().format("%H:%M"),
            display.minutes_text,
            display.seconds_text,
            display.status_text,
            self.engine.completed_cycles()
        );
        let _ = std::io::stdout().flush();
    }

    fn on_phase_switch(&mut self, next: Phase) {
        let message = switch_message(next, self.engine.registry());
        println!("\n🔔 {}", message);
        self.log.log(&format!("🔔 {}", message));

        if self.notify {
            if let Err(e) = send_notification(&message) {
                eprintln!("Failed to send notification: {}", e);
            }
        }

        if next == Phase::Break {
            println!(
                "🍅 Focus sessions completed this run: {}",
                self.engine.completed_cycles()
            );
        }
    }

    fn save_todos(&self) {
        let doc = TodoDocument {
            todos: self.todos.items_for_save(),
            logs: self.todos.logs().to_vec(),
        };
        if let Err(e) = todo::store::save(&self.store_path, &doc) {
            eprintln!("Failed to save to-dos: {}", e);
        }
    }

    fn apply_duration(&mut self, phase: Phase, raw: &str) {
        // Presets select directly; anything else is custom input.
        let preset = raw
            .parse::<u32>()
            .ok()
            .filter(|minutes| phase.presets().contains(minutes));
        let result = match preset {
            Some(minutes) => {
                self.engine.select_duration(phase, minutes);
                Ok(minutes)
            }
            None => self.engine.set_custom_duration(phase, raw),
        };
        match result {
            Ok(minutes) => self
                .log
                .log(&format!("Selected {}-minute {} duration", minutes, phase)),
            Err(e) => println!("Error: {}", e),
        }
    }

    fn handle_todo(&mut self, args: &[&str]) {
        match args.first().copied() {
            Some("add") => {
                let mut rest: Vec<&str> = args[1..].to_vec();
                let mut date = today_string();
                if let Some(raw) = rest.last().and_then(|last| last.strip_prefix('@')) {
                    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                        Ok(parsed) => {
                            // Re-format so unpadded input compares
                            // correctly against today's date.
                            date = parsed.format("%Y-%m-%d").to_string();
                            rest.pop();
                        }
                        Err(_) => {
                            println!("Error: dates look like @YYYY-MM-DD");
                            return;
                        }
                    }
                }
                let name = rest.join(" ");
                match self.todos.add(
                    &name,
                    &date,
                    &today_string(),
                    Local::now().timestamp_millis(),
                    &stamp_string(),
                ) {
                    Ok(()) => {
                        println!("Added: {} ({})", name.trim(), date);
                        self.save_todos();
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            Some("done") => match args.get(1).and_then(|raw| raw.parse::<usize>().ok()) {
                Some(index) => match self.todos.toggle(index, &stamp_string()) {
                    Ok(item) => {
                        let verb = if item.completed { "Finished" } else { "Restarted" };
                        println!("{}: {}", verb, item.name);
                        self.save_todos();
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: todo done <n>"),
            },
            Some("rm") => match args.get(1).and_then(|raw| raw.parse::<usize>().ok()) {
                Some(index) => match self.todos.remove(index, &stamp_string()) {
                    Ok(item) => {
                        println!("Removed: {}", item.name);
                        self.save_todos();
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: todo rm <n>"),
            },
            Some("all") => match self.todos.toggle_all_today(&stamp_string()) {
                Some(true) => {
                    println!("Finished all of today's tasks");
                    self.save_todos();
                }
                Some(false) => {
                    println!("Restarted all of today's tasks");
                    self.save_todos();
                }
                None => println!("No tasks for today"),
            },
            Some("clear") => {
                let cleared = self.todos.clear_completed(&stamp_string());
                println!("Cleared {} completed task(s)", cleared);
                self.save_todos();
            }
            _ => println!(
                "Usage: todo add <name> [@YYYY-MM-DD] | todo done <n> | todo rm <n> | todo all | todo clear"
            ),
        }
    }

    fn print_status(&self) {
        let display = self.engine.display();
        let registry = self.engine.registry();
        println!("\n--- Timer Status ---");
        println!(
            "{} {} {}:{} ({})",
            self.engine.phase().emoji(),
            self.engine.phase(),
            display.minutes_text,
            display.seconds_text,
            display.status_text
        );
        println!(
            "Durations: {}min work / {}min break",
            registry.selected(Phase::Work),
            registry.selected(Phase::Break)
        );
        println!(
            "🍅 Completed focus sessions: {}",
            self.engine.completed_cycles()
        );
        println!("To-dos left: {}", self.todos.left_count());
        println!("--------------------\n");
    }

    fn print_todos(&self) {
        println!("\n--- To-Do List ---");
        if self.todos.today_items().is_empty() && self.todos.future_items().is_empty() {
            println!("Nothing here yet.");
        }
        let mut index = 1;
        if !self.todos.today_items().is_empty() {
            println!("Today:");
            for item in self.todos.today_items() {
                let mark = if item.completed { "x" } else { " " };
                println!("  {:>2}. [{}] {}", index, mark, item.name);
                index += 1;
            }
        }
        if !self.todos.future_items().is_empty() {
            println!("Upcoming:");
            for item in self.todos.future_items() {
                let mark = if item.completed { "x" } else { " " };
                println!("  {:>2}. [{}] {} ({})", index, mark, item.name, item.date);
                index += 1;
            }
        }
        println!("{} task(s) left", self.todos.left_count());
        println!("------------------\n");
    }

    fn print_stats(&self) {
        println!("\n--- Session Statistics ---");
        println!(
            "Session duration: {} minutes",
            (Local::now() - self.session_start).num_seconds() / 60
        );
        println!(
            "🍅 Completed focus sessions: {}",
            self.engine.completed_cycles()
        );
        println!("To-dos left: {}", self.todos.left_count());
        println!("------------------------\n");
    }

    /// Dispatch one input line. Returns false when the session should
    /// end.
    fn handle_line(&mut self, line: &str) -> bool {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            self.redraw();
            return true;
        };

        match command {
            "start" => {
                self.engine.start();
                self.log.log("Timer started");
            }
            "pause" => {
                self.engine.pause();
                self.log.log("Timer paused");
            }
            "reset" => {
                self.engine.reset();
                self.log.log("Timer reset");
            }
            "work" | "break" => {
                let phase = if command == "work" {
                    Phase::Work
                } else {
                    Phase::Break
                };
                match parts.get(1) {
                    Some(raw) => self.apply_duration(phase, raw),
                    None => println!("Usage: {} <minutes>", command),
                }
            }
            "status" => self.print_status(),
            "share" => println!("{}", SHARE_CARD_TEXT),
            "todos" => self.print_todos(),
            "todo" => self.handle_todo(&parts[1..]),
            "help" => print_help(),
            "quit" | "exit" => return false,
            other => println!("Unknown command: {} (try 'help')", other),
        }

        self.redraw();
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage();
        return Ok(());
    }

    let app_config = config::load_config();
    let mut registry = DurationRegistry::new(app_config.work_minutes, app_config.break_minutes);

    // CLI overrides pass through the same validation as custom input;
    // a bad value aborts startup with a non-zero status instead of
    // falling back.
    if let Err(e) = apply_duration_flags(&args, &mut registry) {
        eprintln!("Error: {}", e);
        print_usage();
        std::process::exit(2);
    }

    let notify = !args.contains(&"--no-notify".to_string());
    let verbose = args.contains(&"--verbose".to_string()) || args.contains(&"-v".to_string());

    // Check for log file argument
    let log_file = if let Some(pos) = args.iter().position(|a| a == "--log" || a == "-l") {
        args.get(pos + 1).cloned()
    } else {
        Some(format!(
            "{}/.local/share/focus_clock/activity.log",
            std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
        ))
    };

    // Create log directory if needed
    if let Some(ref path) = log_file {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if args.contains(&"--daemon".to_string()) {
        let addr = flag_value(&args, "--addr", "-a").unwrap_or(app_config.listen_addr);
        return run_daemon_mode(registry, addr, notify, log_file).await;
    }

    run_interactive(registry, notify, verbose, log_file).await
}

async fn run_interactive(
    registry: DurationRegistry,
    notify: bool,
    verbose: bool,
    log_file: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🍅 Focus Clock - Pomodoro Timer & To-Do List");
    println!("======================================================");
    println!(
        "Pomodoro settings: {}min work / {}min break",
        registry.selected(Phase::Work),
        registry.selected(Phase::Break)
    );
    if verbose {
        println!("Verbose mode: ON");
    }
    if let Some(ref path) = log_file {
        println!("Logging to: {}", path);
    }
    println!("Type 'help' for commands. Press Ctrl+C to stop and see stats\n");

    let (clock, mut tick_rx) = TokioClock::new();
    let store_path = todo::store::default_store_path();
    let doc = todo::store::load(&store_path);
    let todos = TodoList::from_items(doc.todos, doc.logs, &today_string());

    let mut session = Session {
        engine: TimerEngine::new(clock, registry),
        todos,
        store_path,
        log: ActivityLog::new(log_file),
        notify,
        verbose,
        session_start: Local::now(),
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    // Status-bar clock refresh, once per minute.
    let mut minute = interval(Duration::from_secs(60));
    minute.tick().await;

    session.redraw();

    loop {
        tokio::select! {
            Some(token) = tick_rx.recv() => {
                if let Some(next) = session.engine.tick(token) {
                    session.on_phase_switch(next);
                }
                session.redraw();
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if session.verbose && !line.trim().is_empty() {
                            println!("[DEBUG] Command: {}", line.trim());
                        }
                        if !session.handle_line(&line) {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("Error reading input: {}", e);
                        break;
                    }
                }
            }
            _ = minute.tick() => {
                session.redraw();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.engine.pause();
    session.save_todos();
    session.log.log("Session ended");
    session.print_stats();
    Ok(())
}

fn state_event(engine: &TimerEngine<TokioClock>) -> StateEvent {
    let display = engine.display();
    StateEvent::State {
        minutes_text: display.minutes_text,
        seconds_text: display.seconds_text,
        status_text: display.status_text,
        phase: engine.phase(),
        running: engine.running(),
        completed_cycles: engine.completed_cycles(),
        clock: Local::now().format("%H:%M").to_string(),
    }
}

fn report_duration_result(
    result: Result<u32, ValidationError>,
    phase: Phase,
    log: &ActivityLog,
    event_tx: &broadcast::Sender<StateEvent>,
) {
    match result {
        Ok(minutes) => log.log(&format!("Selected {}-minute {} duration", minutes, phase)),
        Err(e) => {
            log.log(&format!("Rejected {} duration input: {}", phase, e));
            let _ = event_tx.send(StateEvent::Error {
                message: e.to_string(),
            });
        }
    }
}

/// Run in daemon mode - WebSocket command surface + state broadcasts
async fn run_daemon_mode(
    registry: DurationRegistry,
    addr: String,
    notify: bool,
    log_file: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🍅 Focus Clock - Daemon Mode");
    println!("======================================================");
    println!(
        "Pomodoro settings: {}min work / {}min break",
        registry.selected(Phase::Work),
        registry.selected(Phase::Break)
    );
    println!("Running WebSocket server on ws://{}\n", addr);

    let log = ActivityLog::new(log_file);

    let (command_tx, mut command_rx) = ws::websocket_server::create_command_channel();
    let event_tx = ws::websocket_server::create_event_channel();

    let ws_addr: SocketAddr = addr.parse()?;
    let server_events = event_tx.clone();
    tokio::spawn(async move {
        if let Err(e) =
            ws::websocket_server::start_websocket_server(ws_addr, command_tx, server_events).await
        {
            eprintln!("WebSocket server error: {}", e);
        }
    });

    let (clock, mut tick_rx) = TokioClock::new();
    let mut engine = TimerEngine::new(clock, registry);

    let mut minute = interval(Duration::from_secs(60));
    minute.tick().await;

    loop {
        tokio::select! {
            Some(token) = tick_rx.recv() => {
                if let Some(next) = engine.tick(token) {
                    let message = switch_message(next, engine.registry());
                    println!("🔔 {}", message);
                    log.log(&format!("🔔 {}", message));
                    if notify {
                        if let Err(e) = send_notification(&message) {
                            eprintln!("Failed to send notification: {}", e);
                        }
                    }
                }
                let _ = event_tx.send(state_event(&engine));
            }
            Some(command) = command_rx.recv() => {
                match command {
                    TimerCommand::Start => {
                        engine.start();
                        log.log("Timer started");
                    }
                    TimerCommand::Pause => {
                        engine.pause();
                        log.log("Timer paused");
                    }
                    TimerCommand::Reset => {
                        engine.reset();
                        log.log("Timer reset");
                    }
                    TimerCommand::SelectDuration { phase, minutes } => {
                        // Non-preset values take the custom validation
                        // path; the engine never sees them unchecked.
                        let result = if phase.presets().contains(&minutes) {
                            engine.select_duration(phase, minutes);
                            Ok(minutes)
                        } else {
                            engine.set_custom_duration(phase, &minutes.to_string())
                        };
                        report_duration_result(result, phase, &log, &event_tx);
                    }
                    TimerCommand::CustomDuration { phase, value } => {
                        let result = engine.set_custom_duration(phase, &value);
                        report_duration_result(result, phase, &log, &event_tx);
                    }
                    TimerCommand::Status => {}
                }
                let _ = event_tx.send(state_event(&engine));
            }
            _ = minute.tick() => {
                let _ = event_tx.send(state_event(&engine));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    engine.pause();
    log.log("Session ended");
    println!("\n🍅 Completed focus sessions: {}", engine.completed_cycles());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duration_flags_override_after_validation() {
        let mut registry = DurationRegistry::default();
        apply_duration_flags(
            &args(&["focus_clock", "--work", "90", "-b", "20"]),
            &mut registry,
        )
        .unwrap();
        assert_eq!(registry.selected(Phase::Work), 90);
        assert_eq!(registry.selected(Phase::Break), 20);
    }

    #[test]
    fn test_bad_duration_flag_aborts_startup() {
        let mut registry = DurationRegistry::default();
        let result = apply_duration_flags(&args(&["focus_clock", "--work", "121"]), &mut registry);
        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
        assert_eq!(registry.selected(Phase::Work), 25, "registry untouched");

        let result = apply_duration_flags(&args(&["focus_clock", "--break", "abc"]), &mut registry);
        assert!(matches!(result, Err(ValidationError::NotAnInteger { .. })));
    }
}
