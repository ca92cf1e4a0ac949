use crate::agent::Reply;
use crate::utils::logging::PLAIN;
use dialoguer::console::style;
use std::net::SocketAddr;
use tracing::info;

pub(crate) fn print_welcome(provider: &str) {
    let sep = style("◆").blue().bold();
    let title = style("Crypto Agent").bold();
    let subtitle =
        style("Ask for a coin's price or background. Type 'exit' or 'quit' to leave.").dim();
    let backend = style(format!("market data: {provider}")).dim();

    info!(target: PLAIN, "\n{sep} {title} {sep}\n{subtitle}\n{backend}\n");
}

pub(crate) fn print_reply(reply: &Reply) {
    let label = if reply.is_answer() {
        style("Agent:").green().bold()
    } else {
        style("Agent:").yellow().bold()
    };
    info!(target: PLAIN, "{label} {reply}\n");
}

pub(crate) fn print_goodbye() {
    info!(target: PLAIN, "\n{}", style("Goodbye!").bold());
}

pub(crate) fn print_listening(addr: &SocketAddr) {
    info!(
        target: PLAIN,
        "{} {} {}",
        style("✔").green(),
        style("Serving on").bold(),
        style(format!("http://{addr}")).cyan()
    );
}
