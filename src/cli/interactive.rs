use crate::cli::commands::{mining_spinner, print_block, print_report, print_transaction};
use crate::node::Node;
use crate::LedgerError;
use console::{style, Emoji};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::sync::Arc;

static CHECK: Emoji<'_, '_> = Emoji("✅ ", "");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "");

const MENU: &[&str] = &[
    "Add a new transaction value",
    "Output the blockchain blocks",
    "Mine a new block",
    "Check transactions validity",
    "Create wallet",
    "Load wallet",
    "Quit",
];

/// Menu loop over a local node. The chain is re-verified after every step and
/// the loop stops on the first failure.
pub struct InteractiveConsole {
    node: Arc<Node>,
}

impl InteractiveConsole {
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        loop {
            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Please choose")
                .items(MENU)
                .default(0)
                .interact()?;

            match choice {
                0 => self.add_transaction().await?,
                1 => {
                    for block in self.node.chain().await {
                        print_block(&block);
                    }
                    println!("{}", "-".repeat(20));
                }
                2 => self.mine().await?,
                3 => {
                    if self.node.verify_open_transactions().await {
                        println!("{}All transactions are valid", CHECK);
                    } else {
                        println!("{}There are invalid transactions", CROSS);
                    }
                }
                4 => match self.node.create_wallet().await {
                    Ok(key) => println!("{}Wallet created: {}", CHECK, style(key).green()),
                    Err(e) => println!("{}Creating wallet failed: {}", CROSS, e),
                },
                5 => match self.node.load_wallet().await {
                    Ok(key) => println!("{}Wallet loaded: {}", CHECK, style(key).green()),
                    Err(e) => println!("{}Loading wallet failed: {}", CROSS, e),
                },
                _ => {
                    println!("User left!");
                    break;
                }
            }

            if !self.node.verify_chain().await {
                for block in self.node.chain().await {
                    print_block(&block);
                }
                println!("{}Invalid blockchain!", CROSS);
                break;
            }

            match self.node.balance(None).await {
                Ok((owner, balance)) => println!("Balance of {}: {:6.2}", style(owner).cyan(), balance),
                Err(LedgerError::NoWallet) => println!("No wallet loaded"),
                Err(e) => return Err(e.into()),
            }
        }

        println!("Done!!");
        Ok(())
    }

    async fn add_transaction(&self) -> anyhow::Result<()> {
        let theme = ColorfulTheme::default();
        let recipient: String = Input::with_theme(&theme)
            .with_prompt("Enter the recipient name")
            .interact_text()?;
        let amount: f64 = Input::with_theme(&theme)
            .with_prompt("Enter the transaction amount")
            .interact_text()?;

        match self.node.add_transaction(&recipient, amount).await {
            Ok((_, report)) => {
                println!("{}Added transaction!", CHECK);
                print_report(&report);
            }
            Err(e) => println!("{}Transaction failed: {}", CROSS, e),
        }

        for tx in self.node.open_transactions().await {
            print_transaction(&tx);
        }
        Ok(())
    }

    async fn mine(&self) -> anyhow::Result<()> {
        let pb = mining_spinner();
        let result = self.node.mine_block().await;
        pb.finish_and_clear();

        match result {
            Ok((block, report)) => {
                println!("{}Mined block {}", CHECK, block.index);
                print_report(&report);
            }
            Err(e) => println!("{}Mining failed: {}", CROSS, e),
        }
        Ok(())
    }
}
