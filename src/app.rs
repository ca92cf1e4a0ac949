use crate::agent::CryptoAgent;
use crate::args::{Cli, Command};
use crate::chat::{run_ask, run_chat};
use crate::config::{AgentConfig, ServeConfig};
use crate::server::serve;
use crate::utils::io_input::StdinInputSource;
use clap::Parser;

pub enum Application {
    Chat(AgentConfig),
    Ask(AgentConfig, String),
    Serve(AgentConfig, ServeConfig),
}

impl Application {
    pub async fn init() -> anyhow::Result<Application> {
        dotenvy::dotenv().ok();
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> anyhow::Result<Application> {
        let config = AgentConfig::setup(&cli.agent)?;

        let application = match cli.cmd.unwrap_or(Command::Chat) {
            Command::Chat => Application::Chat(config),
            Command::Ask(ask) => Application::Ask(config, ask.question.join(" ")),
            Command::Serve(serve_args) => {
                Application::Serve(config, ServeConfig::setup(&serve_args))
            }
        };

        Ok(application)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Chat(config) => {
                let mut agent = CryptoAgent::from_config(&config)?;
                run_chat(&mut agent, StdinInputSource).await?;
            }
            Self::Ask(config, question) => {
                let mut agent = CryptoAgent::from_config(&config)?;
                run_ask(&mut agent, &question).await?;
            }
            Self::Serve(config, serve_config) => {
                let agent = CryptoAgent::from_config(&config)?;
                serve(agent, serve_config.bind_addr).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_is_chat() {
        let cli = Cli::try_parse_from(["crypto-agent", "--provider", "mock"]).unwrap();
        assert!(matches!(
            Application::from_cli(cli).unwrap(),
            Application::Chat(_)
        ));
    }

    #[test]
    fn ask_joins_words() {
        let cli = Cli::try_parse_from(["crypto-agent", "ask", "price", "of", "SOL"]).unwrap();
        match Application::from_cli(cli).unwrap() {
            Application::Ask(_, q) => assert_eq!(q, "price of SOL"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn serve_takes_bind_address() {
        let cli =
            Cli::try_parse_from(["crypto-agent", "serve", "--bind", "127.0.0.1:9000"]).unwrap();
        match Application::from_cli(cli).unwrap() {
            Application::Serve(_, serve) => assert_eq!(serve.bind_addr.port(), 9000),
            _ => panic!("expected serve"),
        }
    }
}
