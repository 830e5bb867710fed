use crate::demo::{
    run_demo, run_eligibility_score, run_priority_score, run_stock_score, run_token, DemoArgs,
    EligibilityScoreArgs, PriorityScoreArgs, StockScoreArgs, TokenArgs,
};
use crate::server;
use bloodbank::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Blood Bank Service",
    about = "Run the blood bank service or evaluate its scoring rules from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a scoring rule without starting the service
    Score {
        #[command(subcommand)]
        command: ScoreCommand,
    },
    /// Mint a development bearer token
    Token(TokenArgs),
    /// Seed sample inventory, donors and requests and print the dashboard
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ScoreCommand {
    /// Priority score for a blood request
    Priority(PriorityScoreArgs),
    /// Whether a donor may give blood again
    Eligibility(EligibilityScoreArgs),
    /// Urgency tiers for a stock level
    Stock(StockScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score { command } => match command {
            ScoreCommand::Priority(args) => run_priority_score(args),
            ScoreCommand::Eligibility(args) => run_eligibility_score(args),
            ScoreCommand::Stock(args) => run_stock_score(args),
        },
        Command::Token(args) => run_token(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["bloodbank-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_priority_parses_dates() {
        let cli = Cli::try_parse_from([
            "bloodbank-api",
            "score",
            "priority",
            "--urgency",
            "high",
            "--required-by",
            "2025-03-10",
            "--now",
            "2025-03-01T00:00:00Z",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Score {
                command: ScoreCommand::Priority(args),
            }) => {
                assert_eq!(args.urgency, "high");
                assert_eq!(args.required_by.to_rfc3339(), "2025-03-10T00:00:00+00:00");
                assert!(args.now.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let result = Cli::try_parse_from([
            "bloodbank-api",
            "score",
            "eligibility",
            "--last-donation",
            "last tuesday",
        ]);
        assert!(result.is_err());
    }
}
