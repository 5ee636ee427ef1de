use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod count;
pub mod keys;
pub mod send;
pub mod serve;

use crate::notify::NotificationKind;

#[derive(Subcommand)]
enum Command {
    /// Run the push notification API server
    Serve {
        /// Set the server host address (overrides BEACON_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Set the server port (overrides PORT)
        #[arg(long)]
        port: Option<String>,
    },
    /// Send a notification to every subscriber
    Send {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        /// Notification type used to route clicks
        #[arg(long = "type", value_enum)]
        kind: Option<NotificationKind>,
    },
    /// Print the number of stored subscriptions
    Count {},
    /// Print the VAPID public key clients subscribe with
    PublicKey {},
    /// Generate a fresh VAPID key pair
    GenerateKeys {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Send {
            title,
            body,
            url,
            icon,
            kind,
        }) => {
            send::run(title, body, url, icon, kind).await?;
        }
        Some(Command::Count {}) => {
            count::run().await?;
        }
        Some(Command::PublicKey {}) => {
            keys::run()?;
        }
        Some(Command::GenerateKeys {}) => {
            keys::generate()?;
        }
        None => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_send_with_type() {
        let cli = Cli::try_parse_from([
            "beacon", "send", "--title", "Sale", "--body", "50% off", "--type", "pricing",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Send { title, kind, .. }) => {
                assert_eq!(title, "Sale");
                assert_eq!(kind, Some(NotificationKind::Pricing));
            }
            _ => panic!("expected send command"),
        }
    }

    #[test]
    fn it_rejects_unknown_type() {
        let result = Cli::try_parse_from([
            "beacon", "send", "--title", "t", "--body", "b", "--type", "newsletter",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn it_parses_every_kind_by_its_serde_name() {
        for kind in [
            NotificationKind::General,
            NotificationKind::Service,
            NotificationKind::Portfolio,
            NotificationKind::Contact,
            NotificationKind::Pricing,
        ] {
            let name = serde_json::to_value(kind).unwrap();
            let cli = Cli::try_parse_from([
                "beacon",
                "send",
                "--title",
                "t",
                "--body",
                "b",
                "--type",
                name.as_str().unwrap(),
            ])
            .unwrap();
            match cli.command {
                Some(Command::Send { kind: parsed, .. }) => assert_eq!(parsed, Some(kind)),
                _ => panic!("expected send command"),
            }
        }
    }

    #[test]
    fn it_parses_generate_keys() {
        let cli = Cli::try_parse_from(["beacon", "generate-keys"]).unwrap();
        assert!(matches!(cli.command, Some(Command::GenerateKeys {})));
    }
}
