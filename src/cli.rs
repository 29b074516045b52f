use clap::Parser;
use color_eyre::eyre::{Result, bail};

#[derive(Parser, Debug)]
#[command(name = "smartq", version, about = "Walk-up kiosk and display board for SmartQ queues")]
pub struct Args {
    /// Backend base URL, overriding the config file (e.g. "http://10.0.0.5:5000")
    #[arg(short, long)]
    pub server: Option<String>,

    /// Organization id to open directly
    #[arg(short, long)]
    pub org: Option<i64>,

    /// Show the "now serving" board for --org instead of the kiosk
    #[arg(short, long)]
    pub display: bool,
}

impl Args {
    /// Organization the board should show, if running as a board.
    pub fn board_org(&self) -> Result<Option<i64>> {
        match (self.display, self.org) {
            (false, _) => Ok(None),
            (true, Some(org)) => Ok(Some(org)),
            (true, None) => bail!("--display needs --org <id>"),
        }
    }
}
