use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use log::{debug, info};
use nix::unistd::setsid;
use crate::error::LaunchError;
use crate::model::LaunchHandle;

/// Asks the operating environment to start an entry.
pub trait Launcher {
    fn launch(&mut self, handle: &LaunchHandle) -> Result<(), LaunchError>;
}

/// Spawns the entry's argv as a detached process.
pub struct SpawnLauncher {
    terminal: Option<Vec<String>>,
}

impl SpawnLauncher {
    /// `terminal` is the command prefixed to entries with `Terminal=true`.
    pub fn new(terminal: Option<&str>) -> Self {
        Self {
            terminal: terminal.and_then(shlex::split).filter(|argv| !argv.is_empty()),
        }
    }

    fn command_line(&self, handle: &LaunchHandle) -> Vec<String> {
        match (&self.terminal, handle.terminal) {
            (Some(terminal), true) => terminal.iter().chain(&handle.argv).cloned().collect(),
            _ => handle.argv.clone(),
        }
    }
}

impl Launcher for SpawnLauncher {
    fn launch(&mut self, handle: &LaunchHandle) -> Result<(), LaunchError> {
        let argv = self.command_line(handle);
        let Some((program, args)) = argv.split_first() else {
            return Err(LaunchError::EmptyCommand);
        };

        debug!("Launching {:?} from {:?}", argv, handle.source);
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            command.pre_exec(|| setsid().map(drop).map_err(io::Error::from));
        }

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;
        info!("Launched {} (pid {})", handle.id, child.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(argv: &[&str], terminal: bool) -> LaunchHandle {
        LaunchHandle {
            id: "test.desktop".to_string(),
            argv: argv.iter().map(|s| s.to_string()).collect(),
            terminal,
            source: None,
        }
    }

    #[test]
    fn terminal_prefix_only_applies_to_terminal_entries() {
        let launcher = SpawnLauncher::new(Some("foot --title 'Launcher Run' -e"));
        assert_eq!(
            launcher.command_line(&handle(&["htop"], true)),
            ["foot", "--title", "Launcher Run", "-e", "htop"]
        );
        assert_eq!(launcher.command_line(&handle(&["firefox"], false)), ["firefox"]);
    }

    #[test]
    fn without_terminal_configured_entry_runs_directly() {
        let launcher = SpawnLauncher::new(None);
        assert_eq!(launcher.command_line(&handle(&["htop"], true)), ["htop"]);

        let blank = SpawnLauncher::new(Some("   "));
        assert_eq!(blank.command_line(&handle(&["htop"], true)), ["htop"]);
    }

    #[test]
    fn empty_argv_is_rejected() {
        let mut launcher = SpawnLauncher::new(None);
        assert!(matches!(launcher.launch(&handle(&[], false)), Err(LaunchError::EmptyCommand)));
    }

    #[test]
    fn missing_program_reports_spawn_error() {
        let mut launcher = SpawnLauncher::new(None);
        let err = launcher
            .launch(&handle(&["/nonexistent/overlay-launcher-test-binary"], false))
            .unwrap_err();
        match err {
            LaunchError::Spawn { program, .. } => assert_eq!(program, "/nonexistent/overlay-launcher-test-binary"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn existing_program_spawns() {
        let mut launcher = SpawnLauncher::new(None);
        launcher.launch(&handle(&["true"], false)).unwrap();
    }
}
