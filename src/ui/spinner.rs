use indicatif::{ProgressBar, ProgressStyle};
use std::{future::Future, io::IsTerminal, time::Duration};

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Spinner line that disappears when dropped.
struct SpinnerLine(Option<ProgressBar>);

impl SpinnerLine {
    /// Nothing is drawn unless stderr is a terminal.
    fn start(msg: String) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self(None);
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style.tick_chars(TICKS));
        }
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(80));
        Self(Some(pb))
    }
}

impl Drop for SpinnerLine {
    fn drop(&mut self) {
        if let Some(pb) = self.0.take() {
            pb.finish_and_clear();
        }
    }
}

/// Await `fut` with a "`msg`" spinner on stderr; the line is cleared on
/// success and on error alike.
pub async fn with_spinner_future<Fut, T, E>(msg: impl Into<String>, fut: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    let _line = SpinnerLine::start(msg.into());
    fut.await
}
