// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .required(true)
        .help("Email of the acting user")
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print JSON lines"),
    )
}

fn now_arg() -> Arg {
    Arg::new("now")
        .long("now")
        .help("Override the current time (RFC 3339 or YYYY-MM-DD); for demos and rehearsing schedules")
}

pub fn build_cli() -> Command {
    Command::new("moneta")
        .about("Personal finance tracker with recurring transactions, budget alerts, and monthly reports")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("email").long("email").required(true))
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(user_arg())
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .help("current|savings"),
                        )
                        .arg(
                            Arg::new("balance")
                                .long("balance")
                                .default_value("0")
                                .help("Opening balance"),
                        )
                        .arg(
                            Arg::new("default")
                                .long("default")
                                .action(ArgAction::SetTrue)
                                .help("Make this the default account"),
                        ),
                )
                .subcommand(json_flags(Command::new("list").arg(user_arg())))
                .subcommand(
                    Command::new("set-default").arg(user_arg()).arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Manage transactions")
                .subcommand(tx_fields(
                    Command::new("add").arg(user_arg()),
                    true,
                ))
                .subcommand(tx_fields(
                    Command::new("update").arg(user_arg()).arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                    true,
                ))
                .subcommand(
                    Command::new("delete").arg(user_arg()).arg(
                        Arg::new("ids")
                            .required(true)
                            .num_args(1..)
                            .value_parser(value_parser!(i64))
                            .help("Transaction ids to delete"),
                    ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(user_arg())
                        .arg(
                            Arg::new("account")
                                .long("account")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Manage the monthly budget")
                .subcommand(
                    Command::new("set")
                        .arg(user_arg())
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(json_flags(Command::new("show").arg(user_arg()).arg(now_arg()))),
        )
        .subcommand(
            Command::new("report").about("Reports").subcommand(json_flags(
                Command::new("monthly").arg(user_arg()).arg(now_arg()),
            )),
        )
        .subcommand(
            Command::new("jobs")
                .about("Scheduler surface")
                .subcommand(Command::new("tick").arg(now_arg()))
                .subcommand(
                    Command::new("run")
                        .arg(Arg::new("name").required(true).help(
                            "budget-check | recurring-scan | monthly-report",
                        ))
                        .arg(now_arg()),
                )
                .subcommand(Command::new("queue")),
        )
        .subcommand(Command::new("seed").about("Load demo data"))
        .subcommand(Command::new("doctor").about("Check ledger integrity"))
}

fn tx_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(
        Arg::new("account")
            .long("account")
            .required(required)
            .value_parser(value_parser!(i64)),
    )
    .arg(
        Arg::new("type")
            .long("type")
            .required(required)
            .help("income|expense"),
    )
    .arg(Arg::new("amount").long("amount").required(required))
    .arg(Arg::new("category").long("category").required(required))
    .arg(
        Arg::new("date")
            .long("date")
            .required(required)
            .help("YYYY-MM-DD"),
    )
    .arg(Arg::new("description").long("description"))
    .arg(
        Arg::new("recurring")
            .long("recurring")
            .help("daily|weekly|monthly|yearly"),
    )
    .arg(
        Arg::new("pending")
            .long("pending")
            .action(ArgAction::SetTrue)
            .help("Record as pending instead of completed"),
    )
}
