use std::path::Path;
use std::process::Command;

/// Run `command` with `dir` appended as its last argument. Failures are
/// logged; generated files stay as written.
pub fn run_formatter(command: &str, dir: &Path) -> bool {
    let mut words = command.split_whitespace();
    let Some(program) = words.next() else {
        return false;
    };

    let _span = tracing::info_span!("format", %program, dir = %dir.display()).entered();
    match Command::new(program).args(words).arg(dir).output() {
        Ok(output) if output.status.success() => {
            tracing::debug!("formatted output");
            true
        }
        Ok(output) => {
            tracing::warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "formatter failed"
            );
            false
        }
        Err(err) => {
            tracing::warn!(%err, "could not run formatter");
            false
        }
    }
}
