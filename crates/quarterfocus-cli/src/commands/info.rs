use std::io::Read;

use clap::Subcommand;
use quarterfocus_core::task_info::{self, Subtask};

use super::CliResult;

#[derive(Subcommand)]
pub enum InfoAction {
    /// Parse an info blob into notes and subtasks (JSON)
    Decode {
        /// Info text; read from stdin when omitted
        text: Option<String>,
    },
    /// Build an info blob from notes and subtasks
    Encode {
        /// Note line (repeatable)
        #[arg(long = "note")]
        notes: Vec<String>,
        /// Open subtask (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
        /// Completed subtask (repeatable)
        #[arg(long = "done")]
        done: Vec<String>,
    },
}

pub fn run(action: InfoAction) -> CliResult {
    match action {
        InfoAction::Decode { text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let doc = task_info::decode(Some(&text));
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        InfoAction::Encode {
            notes,
            subtasks,
            done,
        } => {
            let subtasks: Vec<Subtask> = done
                .into_iter()
                .map(|text| Subtask::new(text, true))
                .chain(subtasks.into_iter().map(|text| Subtask::new(text, false)))
                .collect();
            println!("{}", task_info::encode(&notes, &subtasks));
        }
    }
    Ok(())
}
