// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use triplog::config::AppConfig;
use triplog::session::Session;
use triplog::{cli, commands, db, log};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    log::init_logging(matches.get_flag("verbose"));

    let config = AppConfig::load()?;
    let mut session = Session::open(db::open_or_init()?, config);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("book", sub)) => commands::books::handle(&mut session, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(&mut session, sub)?,
        Some(("rates", sub)) => commands::rates::handle(&mut session, sub)?,
        Some(("summary", sub)) => commands::summary::handle(&session, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&session, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&session)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
