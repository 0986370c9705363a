use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use git_sim::{validation, CommandRecord, Session};

const PROMPT: &str = "$ ";

pub struct Options {
    /// Emit results as JSON lines instead of a transcript
    pub json: bool,
    /// Where to write the session script on exit
    pub export: Option<PathBuf>,
}

/// Lines starting with ':' talk to the host instead of the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    Check,
    Hint,
    History,
    Back,
    Forward,
    Export,
    Reset,
    Quit,
}

impl HostCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim_start_matches(':') {
            "check" => Some(HostCommand::Check),
            "hint" => Some(HostCommand::Hint),
            "history" => Some(HostCommand::History),
            "back" => Some(HostCommand::Back),
            "forward" => Some(HostCommand::Forward),
            "export" => Some(HostCommand::Export),
            "reset" => Some(HostCommand::Reset),
            "quit" | "q" | "exit" => Some(HostCommand::Quit),
            _ => None,
        }
    }
}

/// Read commands from `input` until EOF or `:quit`, writing the transcript
/// to `output`.
pub async fn run<R, W>(
    mut session: Session,
    input: R,
    mut output: W,
    options: Options,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut completed = session.is_complete();

    if let Some(challenge) = session.challenge() {
        if !options.json {
            let banner = format!("== {} ==\n{}\n", challenge.title, challenge.instructions);
            output.write_all(banner.as_bytes()).await?;
        }
    }

    loop {
        if !options.json {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;
        }

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();

        if line.starts_with(':') {
            match HostCommand::parse(line) {
                Some(HostCommand::Quit) => break,
                Some(command) => {
                    let text = host_command(&mut session, command);
                    write_line(&mut output, &text).await?;
                }
                None => {
                    write_line(&mut output, &format!("unknown host command: {}", line)).await?;
                }
            }
            continue;
        }

        let result = session.execute(line).await;
        if options.json {
            let json = serde_json::to_string(&result).context("Failed to encode result")?;
            write_line(&mut output, &json).await?;
        } else {
            if !result.output.is_empty() {
                write_line(&mut output, &result.output).await?;
            }
            if result.is_error() {
                if let Some(hint) = session.hint_for_failure(line) {
                    write_line(&mut output, &format!("hint: {}", hint)).await?;
                }
            }
        }

        if !completed && session.is_complete() {
            completed = true;
            tracing::info!("challenge complete");
            if !options.json {
                write_line(&mut output, "Challenge complete! Every check passes.").await?;
            }
        }
    }

    output.flush().await?;

    if let Some(path) = &options.export {
        session.write_script(path)?;
    }

    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}

fn host_command(session: &mut Session, command: HostCommand) -> String {
    match command {
        HostCommand::Check => match session.check_challenge() {
            Some(results) => {
                let mut lines: Vec<String> = results.iter().map(|r| r.message.clone()).collect();
                let failed = validation::failed_tests(&results).len();
                if failed == 0 {
                    lines.push("All checks pass.".to_string());
                } else {
                    lines.push(format!("{} of {} checks failing.", failed, results.len()));
                }
                lines.join("\n")
            }
            None => "No challenge loaded.".to_string(),
        },
        HostCommand::Hint => {
            let shown = session.hints_shown() + 1;
            match session.next_hint() {
                Some(hint) => format!("Hint {}: {}", shown, hint.text),
                None => "No more hints.".to_string(),
            }
        }
        HostCommand::History => {
            let recorder = session.recorder();
            if recorder.is_empty() {
                return "No commands yet.".to_string();
            }
            let mut lines: Vec<String> = recorder
                .history()
                .iter()
                .map(|r| {
                    let mark = if r.success { "✓" } else { "✗" };
                    format!("{:>7} {} {}", r.id, mark, r.command)
                })
                .collect();
            lines.push(format!("{:.0}% succeeded", recorder.success_rate()));
            lines.join("\n")
        }
        HostCommand::Back => describe(session.back(), "Already at the first command."),
        HostCommand::Forward => describe(session.forward(), "Already at the latest command."),
        HostCommand::Export => {
            let script = session.export_script();
            if script.is_empty() {
                "Nothing to export.".to_string()
            } else {
                script
            }
        }
        HostCommand::Reset => {
            session.reset();
            "Session reset.".to_string()
        }
        HostCommand::Quit => String::new(),
    }
}

/// Playback view of one record; the live repository is untouched.
fn describe(record: Option<&CommandRecord>, at_edge: &str) -> String {
    let Some(record) = record else {
        return at_edge.to_string();
    };
    let state = &record.state_after;
    let mut text = format!("[{}] $ {}", record.id, record.command);
    if !record.output.is_empty() {
        text.push('\n');
        text.push_str(&record.output);
    }
    text.push_str(&format!(
        "\n(branch {}, {} commit(s), {} staged, {} unstaged)",
        if state.current_branch().is_empty() {
            "-"
        } else {
            state.current_branch()
        },
        state.commits().len(),
        state.staging_area().len(),
        state.working_directory().len()
    ));
    text
}
