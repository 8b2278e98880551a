//! The interactive loop.
//!
//! Orchestrates the whole session: read a line, try to run it as a shell
//! command, and on failure hand it to the translator and ask for a
//! single-key confirmation before running the proposal. Strictly sequential;
//! one user action is in flight at a time.
//!
//! A failed iteration never ends the session. Errors are reported and the
//! loop returns to the prompt; only `exit`/`quit`, EOF, and an interrupt
//! leave it.

use crate::executor::{Executor, ProcessRunner};
use crate::raw_input::{KeyPress, RawKeyReader};
use crate::translator::CommandTranslator;
use anyhow::Result;
use crossterm::style::Stylize;
use std::io::{BufRead, Write};
use tracing::{error, info};

enum LoopAction {
    Continue,
    Exit,
}

/// Interactive shell wrapper session.
pub struct Repl<P: ProcessRunner, T: CommandTranslator, K: RawKeyReader> {
    executor: Executor<P>,
    translator: T,
    keys: K,
}

impl<P: ProcessRunner, T: CommandTranslator, K: RawKeyReader> Repl<P, T, K> {
    pub fn new(executor: Executor<P>, translator: T, keys: K) -> Self {
        Self {
            executor,
            translator,
            keys,
        }
    }

    /// Runs the session against the real terminal until the user leaves.
    pub async fn run(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut out = std::io::stdout();
        let mut err = std::io::stderr();
        self.run_with_io(&mut input, &mut out, &mut err).await
    }

    /// Runs the session with injected I/O (for testing).
    pub async fn run_with_io<R: BufRead, W1: Write, W2: Write>(
        &mut self,
        input: &mut R,
        out: &mut W1,
        err: &mut W2,
    ) -> Result<()> {
        writeln!(
            out,
            "{}",
            "Welcome to nlsh (Windows/Linux/macOS supported).".green()
        )?;
        writeln!(
            out,
            "{}",
            "Type a shell command or plain language. 'exit' or 'quit' to leave.".cyan()
        )?;

        loop {
            writeln!(out)?;
            write!(out, "{} >>> ", current_dir_display())?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                // EOF on stdin ends the session like 'exit' does.
                break;
            }
            let line = line.trim();

            if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            match self.run_iteration(line, out, err).await {
                Ok(LoopAction::Continue) => {}
                Ok(LoopAction::Exit) => break,
                Err(e) => {
                    error!("Iteration failed: {:#}", e);
                    writeln!(err, "{}", format!("Unexpected error: {:#}", e).red())?;
                }
            }
        }

        Ok(())
    }

    /// One prompt's worth of work: execute, fall back, confirm.
    async fn run_iteration<W1: Write, W2: Write>(
        &mut self,
        line: &str,
        out: &mut W1,
        err: &mut W2,
    ) -> Result<LoopAction> {
        if self.executor.execute_with_io(line, out, err) {
            return Ok(LoopAction::Continue);
        }

        writeln!(
            out,
            "{}",
            "Non-standard command, trying AI translation...".cyan()
        )?;

        let cwd = std::env::current_dir()?;
        let proposed = match self.translator.translate(line, &cwd).await {
            Ok(command) => command,
            Err(e) => {
                // Translation failure is not fatal; back to the prompt.
                writeln!(err, "{}", format!("{:#}", e).red())?;
                return Ok(LoopAction::Continue);
            }
        };

        info!("Proposing translated command: {}", proposed);
        writeln!(
            out,
            "{} {}",
            "AI suggests:".yellow(),
            proposed.clone().bold()
        )?;

        match self.keys.read_key("Run it? (y/n): ")? {
            KeyPress::Char(c) if c.eq_ignore_ascii_case(&'y') => {
                // The proposal's own outcome is not branched on; there is
                // never a second fallback.
                self.executor.execute_with_io(&proposed, out, err);
            }
            KeyPress::Interrupt => {
                writeln!(out, "{}", "Interrupt received, exiting.".blue())?;
                return Ok(LoopAction::Exit);
            }
            _ => {
                writeln!(out, "{}", "Operation cancelled.".blue())?;
            }
        }

        Ok(LoopAction::Continue)
    }
}

fn current_dir_display() -> String {
    std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformKind;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::os::unix::process::ExitStatusExt;
    use std::path::Path;
    use std::process::{ExitStatus, Output};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // =========================================================================
    // Mock implementations
    // =========================================================================

    /// Process runner that replays scripted outputs and records every line.
    struct SequenceRunner {
        outputs: Mutex<Vec<Output>>,
        lines: Mutex<Vec<String>>,
    }

    impl SequenceRunner {
        fn new(exit_codes_and_stderr: Vec<(i32, &str)>) -> Arc<Self> {
            let outputs = exit_codes_and_stderr
                .into_iter()
                .map(|(code, stderr)| Output {
                    status: ExitStatus::from_raw(code << 8),
                    stdout: vec![],
                    stderr: stderr.as_bytes().to_vec(),
                })
                .collect();
            Arc::new(Self {
                outputs: Mutex::new(outputs),
                lines: Mutex::new(vec![]),
            })
        }
    }

    impl ProcessRunner for Arc<SequenceRunner> {
        fn run(&self, _program: &str, args: &[&str]) -> Result<Output> {
            self.lines.lock().unwrap().push(args[1].to_string());
            let mut outputs = self.outputs.lock().unwrap();
            assert!(!outputs.is_empty(), "unexpected subprocess spawn");
            Ok(outputs.remove(0))
        }
    }

    /// Translator that replays a scripted result and counts invocations.
    struct ScriptedTranslator {
        result: Result<String, String>,
        calls: AtomicUsize,
    }

    impl ScriptedTranslator {
        fn proposing(command: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(command.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CommandTranslator for Arc<ScriptedTranslator> {
        async fn translate(&self, _user_text: &str, _cwd: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(command) => Ok(command.clone()),
                Err(message) => Err(anyhow!("{}", message.clone())),
            }
        }
    }

    /// Key reader that replays scripted keystrokes.
    struct ScriptedKeys(Vec<KeyPress>);

    impl RawKeyReader for ScriptedKeys {
        fn read_key(&mut self, _prompt: &str) -> Result<KeyPress> {
            assert!(!self.0.is_empty(), "unexpected confirmation prompt");
            Ok(self.0.remove(0))
        }
    }

    struct SessionOutput {
        out: String,
        err: String,
    }

    async fn run_session(
        runner: Arc<SequenceRunner>,
        translator: Arc<ScriptedTranslator>,
        keys: Vec<KeyPress>,
        input: &str,
    ) -> SessionOutput {
        let executor = Executor::with_runner(PlatformKind::Linux, runner);
        let mut repl = Repl::new(executor, translator, ScriptedKeys(keys));

        let mut cursor = Cursor::new(input.as_bytes().to_vec());
        let mut out = Vec::new();
        let mut err = Vec::new();
        repl.run_with_io(&mut cursor, &mut out, &mut err)
            .await
            .unwrap();

        SessionOutput {
            out: String::from_utf8_lossy(&out).to_string(),
            err: String::from_utf8_lossy(&err).to_string(),
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    #[tokio::test]
    async fn test_exit_and_quit_end_the_session() {
        let runner = SequenceRunner::new(vec![]);
        let translator = ScriptedTranslator::proposing("unused");

        run_session(Arc::clone(&runner), Arc::clone(&translator), vec![], "exit\n").await;
        run_session(Arc::clone(&runner), Arc::clone(&translator), vec![], "QUIT\n").await;

        assert!(runner.lines.lock().unwrap().is_empty());
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_eof_ends_the_session() {
        let runner = SequenceRunner::new(vec![]);
        let translator = ScriptedTranslator::proposing("unused");

        let session = run_session(runner, translator, vec![], "").await;

        assert!(session.out.contains("Welcome"));
    }

    #[tokio::test]
    async fn test_blank_input_touches_nothing() {
        let runner = SequenceRunner::new(vec![]);
        let translator = ScriptedTranslator::proposing("unused");

        run_session(
            Arc::clone(&runner),
            Arc::clone(&translator),
            vec![],
            "\n   \n\t\nexit\n",
        )
        .await;

        assert!(runner.lines.lock().unwrap().is_empty());
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prompt_shows_working_directory_marker() {
        let runner = SequenceRunner::new(vec![]);
        let translator = ScriptedTranslator::proposing("unused");

        let session = run_session(runner, translator, vec![], "exit\n").await;

        assert!(session.out.contains(" >>> "));
    }

    // =========================================================================
    // Execution vs. fallback ordering
    // =========================================================================

    #[tokio::test]
    async fn test_successful_command_never_invokes_translator() {
        let runner = SequenceRunner::new(vec![(0, "")]);
        let translator = ScriptedTranslator::proposing("unused");

        run_session(
            Arc::clone(&runner),
            Arc::clone(&translator),
            vec![],
            "true\nexit\n",
        )
        .await;

        assert_eq!(runner.lines.lock().unwrap().len(), 1);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_command_invokes_translator_with_user_text() {
        let runner = SequenceRunner::new(vec![(2, "ls: invalid option\n")]);
        let translator = ScriptedTranslator::failing("no credential");

        let session = run_session(
            Arc::clone(&runner),
            Arc::clone(&translator),
            vec![],
            "ls -z\nexit\n",
        )
        .await;

        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
        assert!(session.out.contains("trying AI translation"));
    }

    #[tokio::test]
    async fn test_translator_failure_skips_confirmation() {
        let runner = SequenceRunner::new(vec![(1, "")]);
        let translator = ScriptedTranslator::failing("DEEPSEEK_API_KEY is not set");

        // No scripted keys: a confirmation prompt would panic the test.
        let session = run_session(runner, translator, vec![], "make a backup folder\nexit\n").await;

        assert!(session.err.contains("DEEPSEEK_API_KEY"));
        assert!(!session.out.contains("Run it?"));
        assert!(!session.out.contains("Operation cancelled"));
    }

    // =========================================================================
    // Confirmation semantics
    // =========================================================================

    #[tokio::test]
    async fn test_lowercase_y_runs_the_proposal() {
        let runner = SequenceRunner::new(vec![(1, "not found\n"), (0, "")]);
        let translator = ScriptedTranslator::proposing("ls -la");

        run_session(
            Arc::clone(&runner),
            translator,
            vec![KeyPress::Char('y')],
            "ls -z\nexit\n",
        )
        .await;

        let lines = runner.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "ls -la");
    }

    #[tokio::test]
    async fn test_uppercase_y_also_runs_the_proposal() {
        let runner = SequenceRunner::new(vec![(1, ""), (0, "")]);
        let translator = ScriptedTranslator::proposing("ls -la");

        run_session(
            Arc::clone(&runner),
            translator,
            vec![KeyPress::Char('Y')],
            "ls -z\nexit\n",
        )
        .await;

        assert_eq!(runner.lines.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_any_other_key_cancels() {
        let runner = SequenceRunner::new(vec![(1, "")]);
        let translator = ScriptedTranslator::proposing("ls -la");

        let session = run_session(
            Arc::clone(&runner),
            translator,
            vec![KeyPress::Char('n')],
            "ls -z\nexit\n",
        )
        .await;

        assert_eq!(runner.lines.lock().unwrap().len(), 1);
        assert!(session.out.contains("Operation cancelled"));
    }

    #[tokio::test]
    async fn test_non_character_key_cancels() {
        let runner = SequenceRunner::new(vec![(1, "")]);
        let translator = ScriptedTranslator::proposing("ls -la");

        let session = run_session(
            Arc::clone(&runner),
            translator,
            vec![KeyPress::Other],
            "ls -z\nexit\n",
        )
        .await;

        assert_eq!(runner.lines.lock().unwrap().len(), 1);
        assert!(session.out.contains("Operation cancelled"));
    }

    #[tokio::test]
    async fn test_interrupt_at_confirmation_exits_cleanly() {
        let runner = SequenceRunner::new(vec![(1, "")]);
        let translator = ScriptedTranslator::proposing("ls -la");

        let session = run_session(
            Arc::clone(&runner),
            translator,
            vec![KeyPress::Interrupt],
            "ls -z\nshould never be read\n",
        )
        .await;

        assert_eq!(runner.lines.lock().unwrap().len(), 1);
        assert!(session.out.contains("Interrupt received"));
    }

    #[tokio::test]
    async fn test_proposal_failure_never_triggers_second_fallback() {
        // Both the original line and the accepted proposal fail.
        let runner = SequenceRunner::new(vec![(1, ""), (1, "still broken\n")]);
        let translator = ScriptedTranslator::proposing("ls --nope");

        run_session(
            Arc::clone(&runner),
            Arc::clone(&translator),
            vec![KeyPress::Char('y')],
            "ls -z\nexit\n",
        )
        .await;

        assert_eq!(runner.lines.lock().unwrap().len(), 2);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }
}
