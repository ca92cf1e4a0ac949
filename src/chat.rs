use crate::agent::{CryptoAgent, Reply};
use crate::ui::user_messages::{print_goodbye, print_reply, print_welcome};
use crate::ui::with_spinner_future;
use crate::utils::io_input::InputSource;
use anyhow::Result;
use tracing::{debug, error};

/// Interactive loop: read a line, answer it, repeat until the input ends.
///
/// Returns the number of questions handled.
pub async fn run_chat(agent: &mut CryptoAgent, mut input: impl InputSource) -> Result<usize> {
    print_welcome(agent.provider_name());

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_goodbye();
            std::process::exit(0);
        }
    });

    let mut handled = 0;
    loop {
        let Some(line) = tokio::task::block_in_place(|| input.next())? else {
            break;
        };

        match answer(agent, &line).await {
            Ok(reply) => print_reply(&reply),
            Err(err) => error!("Failed to answer: {err:#}"),
        }
        handled += 1;
    }

    debug!(handled, "chat session finished");
    print_goodbye();
    Ok(handled)
}

/// Answer a single question and print it.
pub async fn run_ask(agent: &mut CryptoAgent, question: &str) -> Result<Reply> {
    let reply = answer(agent, question).await?;
    print_reply(&reply);
    Ok(reply)
}

async fn answer(agent: &mut CryptoAgent, text: &str) -> Result<Reply> {
    with_spinner_future("Thinking...", agent.handle(text)).await
}
