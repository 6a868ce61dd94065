// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn book_ref(help: &'static str) -> Arg {
    Arg::new("book").required(true).help(help)
}

fn book_cmd() -> Command {
    Command::new("book")
        .about("Manage trip cash books")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a cash book")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("budget")
                        .long("budget")
                        .required(true)
                        .help("Budget in home currency"),
                )
                .arg(Arg::new("start").long("start").required(true).help("YYYY-MM-DD"))
                .arg(Arg::new("end").long("end").required(true).help("YYYY-MM-DD"))
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(
            Command::new("list")
                .about("List cash books")
                .arg(
                    Arg::new("active")
                        .long("active")
                        .help("Only books covering this date (YYYY-MM-DD)"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("show")
                .about("Show one cash book")
                .arg(book_ref("Book id, id prefix, or name"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("edit")
                .about("Replace fields of a cash book")
                .arg(book_ref("Book id, id prefix, or name"))
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("budget").long("budget"))
                .arg(Arg::new("start").long("start"))
                .arg(Arg::new("end").long("end"))
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a cash book and all of its expenses")
                .arg(book_ref("Book id, id prefix, or name")),
        )
}

fn expense_cmd() -> Command {
    Command::new("expense")
        .about("Record and manage expenses")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record an expense")
                .arg(Arg::new("book").long("book").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("currency")
                        .long("currency")
                        .help("Currency code; defaults to the home currency"),
                )
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("YYYY-MM-DD; defaults to today"),
                )
                .arg(Arg::new("category").long("category").required(true))
                .arg(
                    Arg::new("method")
                        .long("method")
                        .default_value("card")
                        .help("Payment method, e.g. card or cash"),
                )
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(
            Command::new("list")
                .about("List expenses of a cash book")
                .arg(Arg::new("book").long("book").required(true))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("from").long("from").help("YYYY-MM-DD"))
                .arg(Arg::new("to").long("to").help("YYYY-MM-DD"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("edit")
                .about("Replace fields of an expense")
                .arg(Arg::new("id").required(true).help("Expense id or id prefix"))
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("currency").long("currency"))
                .arg(Arg::new("date").long("date"))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("method").long("method"))
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an expense")
                .arg(Arg::new("id").required(true).help("Expense id or id prefix")),
        )
}

fn rates_cmd() -> Command {
    Command::new("rates")
        .about("Daily exchange rates")
        .subcommand_required(true)
        .subcommand(
            Command::new("fetch")
                .about("Fetch and store the rates for a day")
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("YYYY-MM-DD; defaults to today"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List stored rates")
                .arg(Arg::new("date").long("date"))
                .arg(Arg::new("code").long("code"))
                .arg(
                    Arg::new("latest")
                        .long("latest")
                        .action(ArgAction::SetTrue)
                        .help("Only the newest snapshot per currency"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .default_value("50"),
                )
                .arg(json_flag()),
        )
}

pub fn build_cli() -> Command {
    Command::new("triplog")
        .about("Trip cash books, multi-currency expenses, and daily exchange rates")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(book_cmd())
        .subcommand(expense_cmd())
        .subcommand(rates_cmd())
        .subcommand(
            Command::new("summary")
                .about("Spending of a cash book in home currency")
                .arg(book_ref("Book id, id prefix, or name"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("export")
                .about("Export data to a file")
                .subcommand_required(true)
                .subcommand(
                    Command::new("expenses")
                        .about("Export the expenses of a cash book")
                        .arg(Arg::new("book").long("book").required(true))
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv or json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check for missing rates and overspent books"))
}
