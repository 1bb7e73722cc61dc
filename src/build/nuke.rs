//! Interactive confirmation before wiping a section's destination.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{debug, info};

use super::error::PipelineError;
use super::section::SectionNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NukeState {
    Idle,
    AwaitingConfirmation,
    Removing,
    Kept,
    /// Terminal: every later `confirm` aborts without asking.
    Aborted,
}

/// What the operator chose for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NukeDecision {
    Removed,
    Kept,
}

/// Asks on `output`, reads answers line by line from `input`.
pub struct NukeGate<R, W> {
    input: R,
    output: W,
    state: NukeState,
}

impl NukeGate<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompt on stderr so generated output on stdout stays clean.
    pub fn interactive() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> NukeGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            state: NukeState::Idle,
        }
    }

    pub fn state(&self) -> NukeState {
        self.state
    }

    fn enter(&mut self, next: NukeState) {
        debug!(from = ?self.state, to = ?next, "nuke gate transition");
        self.state = next;
    }

    /// Ask whether `node`'s destination may be removed, and remove it if so.
    ///
    /// Answers are matched exactly, apart from the line terminator, so a
    /// padded `" 1"` is invalid and asks again. Empty input and end of
    /// input both mean abort, reported as [`PipelineError::Aborted`].
    pub fn confirm(&mut self, node: &SectionNode) -> Result<NukeDecision, PipelineError> {
        if self.state == NukeState::Aborted {
            return Err(PipelineError::Aborted);
        }

        let destination = &node.destination_path;
        self.enter(NukeState::AwaitingConfirmation);
        self.say(&format!(
            "Section '{name}' asks for its destination to be wiped: we are about to \
             COMPLETELY REMOVE the entire '{dst}' directory tree.\n\
             Do you really want us to do it?\n\
             1. Yes, go on and remove the entire '{dst}' directory tree\n\
             2. No, abort everything and exit now\n\
             3. No, keep '{dst}' as it is and continue",
            name = node.name,
            dst = destination.display(),
        ))?;

        loop {
            self.prompt("Your answer [1/2/3] (2 is the default): ")?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(PipelineError::io(Path::new("<stdin>")))?;

            match (read, line.trim_end_matches(['\r', '\n'])) {
                (0, _) | (_, "2" | "") => {
                    self.say("Aborting and exiting...")?;
                    self.enter(NukeState::Aborted);
                    return Err(PipelineError::Aborted);
                }
                (_, "1") => {
                    self.say(&format!("Removing {} ...", destination.display()))?;
                    self.enter(NukeState::Removing);
                    remove_tree(destination)?;
                    info!(
                        section = %node.name,
                        path = %destination.display(),
                        "destination removed"
                    );
                    self.enter(NukeState::Idle);
                    return Ok(NukeDecision::Removed);
                }
                (_, "3") => {
                    self.enter(NukeState::Kept);
                    self.enter(NukeState::Idle);
                    return Ok(NukeDecision::Kept);
                }
                _ => self.say("Invalid input, choose between 1, 2 or 3")?,
            }
        }
    }

    fn say(&mut self, message: &str) -> Result<(), PipelineError> {
        writeln!(self.output, "{message}").map_err(PipelineError::io(Path::new("<prompt>")))
    }

    fn prompt(&mut self, message: &str) -> Result<(), PipelineError> {
        write!(self.output, "{message}")
            .and_then(|()| self.output.flush())
            .map_err(PipelineError::io(Path::new("<prompt>")))
    }
}

/// A tree that is already gone counts as removed.
fn remove_tree(path: &Path) -> Result<(), PipelineError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path)(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn section(dir: &TempDir) -> SectionNode {
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(dst.join("sub")).unwrap();
        std::fs::write(dst.join("sub/old.html"), "stale").unwrap();
        SectionNode::builder("parts", dst).build()
    }

    fn gate(answers: &str) -> NukeGate<Cursor<Vec<u8>>, Vec<u8>> {
        NukeGate::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_choice_1_removes_tree() {
        let dir = TempDir::new().unwrap();
        let node = section(&dir);
        let mut gate = gate("1\n");

        assert_eq!(gate.confirm(&node).unwrap(), NukeDecision::Removed);
        assert!(!node.destination_path.exists());
        assert_eq!(gate.state(), NukeState::Idle);
    }

    #[test]
    fn test_choice_1_tolerates_missing_tree() {
        let dir = TempDir::new().unwrap();
        let node = SectionNode::builder("ghost", dir.path().join("never")).build();
        assert_eq!(gate("1\n").confirm(&node).unwrap(), NukeDecision::Removed);
    }

    #[test]
    fn test_choice_2_and_empty_abort() {
        for answer in ["2\n", "\n", "2\r\n", ""] {
            let dir = TempDir::new().unwrap();
            let node = section(&dir);
            let mut gate = gate(answer);

            assert!(matches!(gate.confirm(&node), Err(PipelineError::Aborted)));
            assert_eq!(gate.state(), NukeState::Aborted);
            assert!(node.destination_path.join("sub/old.html").exists());
        }
    }

    #[test]
    fn test_aborted_is_terminal() {
        let dir = TempDir::new().unwrap();
        let node = section(&dir);
        let mut gate = gate("2\n1\n");

        assert!(gate.confirm(&node).is_err());
        assert!(matches!(gate.confirm(&node), Err(PipelineError::Aborted)));
        assert!(node.destination_path.exists());
    }

    #[test]
    fn test_choice_3_keeps_tree() {
        let dir = TempDir::new().unwrap();
        let node = section(&dir);
        let mut gate = gate("3\n");

        assert_eq!(gate.confirm(&node).unwrap(), NukeDecision::Kept);
        assert_eq!(
            std::fs::read_to_string(node.destination_path.join("sub/old.html")).unwrap(),
            "stale"
        );
        assert_eq!(gate.state(), NukeState::Idle);
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let dir = TempDir::new().unwrap();
        let node = section(&dir);
        let mut gate = gate("yes\n4\n3\n");

        assert_eq!(gate.confirm(&node).unwrap(), NukeDecision::Kept);
        assert!(node.destination_path.exists());

        let shown = String::from_utf8(gate.output.clone()).unwrap();
        assert_eq!(shown.matches("Invalid input").count(), 2);
        assert_eq!(shown.matches("Your answer").count(), 3);
        assert!(shown.contains(&node.destination_path.display().to_string()));
    }

    #[test]
    fn test_padded_answer_reprompts_without_removing() {
        let dir = TempDir::new().unwrap();
        let node = section(&dir);
        let mut gate = gate(" 1\n1 \n3\n");

        assert_eq!(gate.confirm(&node).unwrap(), NukeDecision::Kept);
        assert!(node.destination_path.join("sub/old.html").exists());

        let shown = String::from_utf8(gate.output.clone()).unwrap();
        assert_eq!(shown.matches("Invalid input").count(), 2);
    }
}
