//! Simulated shell command table.

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

pub const PROMPT: &str = "student@lab:~$ ";
const NEWLINE: &str = "\r\n";

/// Inputs a command may read besides the line itself.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext {
    pub now: DateTime<Utc>,
    pub remaining: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ClearScreen,
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub transcript: String,
    pub control: Option<Control>,
}

impl Dispatch {
    fn lines(lines: &[&str]) -> Self {
        let mut transcript = String::from(NEWLINE);
        for line in lines {
            transcript.push_str(line);
            transcript.push_str(NEWLINE);
        }
        transcript.push_str(PROMPT);
        Self {
            transcript,
            control: None,
        }
    }

    fn control(transcript: String, control: Control) -> Self {
        Self {
            transcript,
            control: Some(control),
        }
    }
}

/// Maps one input line to its transcript and optional control signal.
pub fn dispatch(line: &str, ctx: &DispatchContext) -> Dispatch {
    let command = line.trim();
    match command {
        "" => Dispatch::lines(&[]),
        "ls" => Dispatch::lines(&[
            "Desktop  Documents  Downloads  lab.sh  Music  Pictures  Videos",
        ]),
        "pwd" => Dispatch::lines(&["/home/student"]),
        "whoami" => Dispatch::lines(&["student"]),
        "date" => {
            let now = ctx.now.format("%a %b %e %H:%M:%S UTC %Y").to_string();
            Dispatch::lines(&[now.as_str()])
        }
        "help" => Dispatch::lines(&[
            "Available commands: ls, pwd, whoami, date, help, clear, uname, lab, exit",
        ]),
        "clear" => Dispatch::control(String::new(), Control::ClearScreen),
        "uname" | "uname -a" => {
            Dispatch::lines(&["Linux lab 5.15.0-1 #1 SMP Ubuntu x86_64 GNU/Linux"])
        }
        "lab" => Dispatch::lines(&["Lab Management Tool v1.0", "Usage: lab [start|end|status]"]),
        "lab status" => {
            let minutes = ctx.remaining.as_secs().div_ceil(60);
            let remaining = format!("Session Time Remaining: {minutes} minutes");
            Dispatch::lines(&["Lab Status: Active", remaining.as_str()])
        }
        "lab end" | "exit" => {
            Dispatch::control(format!("{NEWLINE}logout{NEWLINE}"), Control::Terminate)
        }
        other => {
            let name = other.split_whitespace().next().unwrap_or(other);
            let message = format!("bash: {name}: command not found");
            Dispatch::lines(&[message.as_str()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> DispatchContext {
        DispatchContext {
            now: Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap(),
            remaining: Duration::from_secs(57 * 60 + 10),
        }
    }

    #[test]
    fn test_ls_lists_home_directory() {
        let out = dispatch("ls", &ctx());
        assert_eq!(
            out.transcript,
            "\r\nDesktop  Documents  Downloads  lab.sh  Music  Pictures  Videos\r\nstudent@lab:~$ "
        );
        assert_eq!(out.control, None);
    }

    #[test]
    fn test_clear_has_no_text() {
        let out = dispatch("clear", &ctx());
        assert!(out.transcript.is_empty());
        assert_eq!(out.control, Some(Control::ClearScreen));
    }

    #[test]
    fn test_unknown_command() {
        let out = dispatch("bogus", &ctx());
        assert_eq!(
            out.transcript,
            "\r\nbash: bogus: command not found\r\nstudent@lab:~$ "
        );
    }

    #[test]
    fn test_unknown_command_reports_program_name_only() {
        let out = dispatch("  rm -rf /  ", &ctx());
        assert!(out.transcript.contains("bash: rm: command not found"));
    }

    #[test]
    fn test_unlisted_lab_subcommand_is_not_found() {
        let out = dispatch("lab start", &ctx());
        assert!(out.transcript.contains("bash: lab: command not found"));
        assert_eq!(out.control, None);
    }

    #[test]
    fn test_empty_line_prints_prompt() {
        assert_eq!(dispatch("   ", &ctx()).transcript, "\r\nstudent@lab:~$ ");
    }

    #[test]
    fn test_commands_are_case_sensitive() {
        assert!(dispatch("LS", &ctx()).transcript.contains("command not found"));
    }

    #[test]
    fn test_date_uses_context_clock() {
        let out = dispatch("date", &ctx());
        assert!(out.transcript.contains("Tue Mar  5 09:07:01 UTC 2024"));
    }

    #[test]
    fn test_lab_status_rounds_remaining_up() {
        let out = dispatch("lab status", &ctx());
        assert!(out.transcript.contains("Lab Status: Active\r\n"));
        assert!(out.transcript.contains("Session Time Remaining: 58 minutes\r\n"));
    }

    #[test]
    fn test_uname_variants_match() {
        assert_eq!(
            dispatch("uname", &ctx()).transcript,
            dispatch("uname -a", &ctx()).transcript
        );
    }

    #[test]
    fn test_exit_and_lab_end_terminate() {
        for line in ["exit", "lab end"] {
            let out = dispatch(line, &ctx());
            assert_eq!(out.control, Some(Control::Terminate));
            assert_eq!(out.transcript, "\r\nlogout\r\n");
        }
    }
}
