use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use quarterfocus_core::timer::{AutoConfirm, Confirm, Notice, Notifier, SoundCue};
use quarterfocus_core::{Config, Database, Event, PomodoroTimer, TimerDriver, TimerOptions};
use tokio::sync::watch;

use super::{load_preferences, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run an interactive timer in the terminal
    Run {
        /// Task ID the focus sessions count toward
        #[arg(long)]
        task_id: Option<String>,
        /// Focus length in minutes (defaults to preferences)
        #[arg(long)]
        focus: Option<u32>,
        /// Break length in minutes (defaults to preferences)
        #[arg(long = "break")]
        break_minutes: Option<u32>,
        /// Start counting immediately
        #[arg(long)]
        auto_start: bool,
        /// Do not ask before stopping
        #[arg(long)]
        yes: bool,
    },
    /// Print effective preferences and an idle timer snapshot as JSON
    Status,
}

/// Prints notices to stderr and rings the terminal bell for sound cues.
/// With notifications disabled it stays silent.
struct TerminalNotifier {
    enabled: bool,
    sound: bool,
}

impl TerminalNotifier {
    fn render(&self, notice: &Notice) -> Option<String> {
        self.enabled
            .then(|| format!("== {} {}", notice.title, notice.message))
    }

    fn rings_bell(&self) -> bool {
        self.enabled && self.sound
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: &Notice) {
        if let Some(line) = self.render(notice) {
            eprintln!("{line}");
        }
    }

    fn play_sound(&self, _cue: SoundCue) {
        if self.rings_bell() {
            eprint!("\x07");
        }
    }
}

/// Asks on stderr and reads the answer from stdin.
struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{message} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

const HELP: &str = "commands: [p]lay/pause  [s]top  [r]eset  [f]ocus <min>  [i]nfo  [q]uit";

pub fn run(action: TimerAction) -> CliResult {
    let db = Arc::new(Database::open()?);
    let mut prefs = load_preferences(&db)?;

    match action {
        TimerAction::Status => {
            let timer = PomodoroTimer::new(TimerOptions::default().with_preferences(prefs), db);
            let out = serde_json::json!({
                "preferences": prefs,
                "snapshot": timer.snapshot(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        TimerAction::Run {
            task_id,
            focus,
            break_minutes,
            auto_start,
            yes,
        } => {
            if let Some(focus) = focus {
                prefs.focus_minutes = focus;
            }
            if let Some(break_minutes) = break_minutes {
                prefs.short_break_minutes = break_minutes;
            }
            prefs.validate()?;

            let config = Config::load()?;
            let mut options = TimerOptions::default()
                .with_preferences(prefs)
                .auto_start(auto_start);
            if let Some(task_id) = task_id {
                options = options.task(task_id);
            }

            let timer = PomodoroTimer::new(options, db).with_notifier(TerminalNotifier {
                enabled: config.notifications.enabled,
                sound: config.notifications.sound,
            });
            let timer = if yes {
                timer.with_confirm(AutoConfirm(true))
            } else {
                timer.with_confirm(PromptConfirm)
            };
            run_interactive(timer, prefs)?;
        }
    }
    Ok(())
}

fn run_interactive(
    timer: PomodoroTimer,
    mut prefs: quarterfocus_core::TimerPreferences,
) -> CliResult {
    let rt = tokio::runtime::Runtime::new()?;
    let driver = TimerDriver::new(timer);
    let (prefs_tx, prefs_rx) = watch::channel(prefs);

    let handle = {
        let _guard = rt.enter();
        let (handle, mut events) = driver.spawn(Some(prefs_rx));
        rt.spawn(async move {
            while let Some(event) = events.recv().await {
                print_event(&event);
            }
        });
        handle
    };

    eprintln!("{HELP}");
    let shared = driver.timer();
    print_event(&shared.blocking_lock().snapshot());

    // Read one line at a time without holding the stdin lock, so the stop
    // prompt can read its answer from the same stream.
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("p") => print_event(&shared.blocking_lock().toggle()),
            Some("s") => {
                let stopped = shared.blocking_lock().stop();
                match stopped {
                    Some(event) => print_event(&event),
                    None => eprintln!("timer not stopped"),
                }
            }
            Some("r") => print_event(&shared.blocking_lock().reset()),
            Some("f") => match parts.next().and_then(|m| m.parse::<u32>().ok()) {
                Some(minutes) if minutes > 0 => {
                    prefs.focus_minutes = minutes;
                    prefs_tx.send_replace(prefs);
                }
                _ => eprintln!("usage: f <minutes>"),
            },
            Some("i") => print_event(&shared.blocking_lock().snapshot()),
            Some("q") => break,
            Some(_) => eprintln!("{HELP}"),
            None => {}
        }
    }

    handle.cancel();
    rt.shutdown_background();
    Ok(())
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("failed to serialize event: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_notifier_renders_notices() {
        let notifier = TerminalNotifier {
            enabled: true,
            sound: true,
        };
        let line = notifier.render(&Notice::new("Break ended", "Back to work."));
        assert_eq!(line.as_deref(), Some("== Break ended Back to work."));
        assert!(notifier.rings_bell());
    }

    #[test]
    fn disabled_notifier_is_silent() {
        let notifier = TerminalNotifier {
            enabled: false,
            sound: true,
        };
        assert!(notifier.render(&Notice::new("Timer stopped", "x")).is_none());
        assert!(!notifier.rings_bell());
    }

    #[test]
    fn sound_off_keeps_notices() {
        let notifier = TerminalNotifier {
            enabled: true,
            sound: false,
        };
        assert!(notifier.render(&Notice::new("Timer stopped", "x")).is_some());
        assert!(!notifier.rings_bell());
    }
}
