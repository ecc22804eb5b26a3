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

fn id_arg(help: &'static str) -> Arg {
    Arg::new("id").long("id").required(true).help(help)
}

/// Purchase fields. On `edit` every field is optional and omitted ones keep
/// their stored value.
fn purchase_fields(cmd: Command, creating: bool) -> Command {
    let advance = Arg::new("advance")
        .long("advance")
        .help("Advance already paid to the supplier");
    cmd.arg(Arg::new("name").long("name").required(creating))
        .arg(
            Arg::new("price")
                .long("price")
                .required(creating)
                .help("Unit price, e.g. 12.50"),
        )
        .arg(if creating {
            advance.default_value("0")
        } else {
            advance
        })
        .arg(
            Arg::new("members")
                .long("members")
                .help("Comma separated member ids (default: all active members)"),
        )
}

pub fn build_cli() -> Command {
    Command::new("tesoreria")
        .about("Treasury ledger for small associations")
        .version(clap::crate_version!())
        .arg(
            Arg::new("data_dir")
                .long("data-dir")
                .global(true)
                .help("Directory holding the database, backups and system log"),
        )
        .arg(
            Arg::new("keep_backups")
                .long("keep-backups")
                .global(true)
                .value_parser(value_parser!(usize))
                .help("Number of snapshots to keep (default 10)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("balance")
                .about("Real cash, restricted funds and available cash")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("member")
                .about("Member registry")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("surname").long("surname").required(true))
                        .arg(Arg::new("ref").long("ref").help("External reference code")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Include removed members"),
                        )
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg("Member id"))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("surname").long("surname").required(true))
                        .arg(Arg::new("ref").long("ref")),
                )
                .subcommand(Command::new("rm").arg(id_arg("Member id")))
                .subcommand(Command::new("rm-all").about("Remove every active member"))
                .subcommand(
                    Command::new("import")
                        .about("Import a roster with COGNOME/NOME columns")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(Arg::new("delimiter").long("delimiter")),
                ),
        )
        .subcommand(
            Command::new("purchase")
                .about("Collective purchases and member quotas")
                .subcommand(
                    purchase_fields(Command::new("add"), true).arg(
                        Arg::new("fund_expense")
                            .long("fund-expense")
                            .action(ArgAction::SetTrue)
                            .help("Pay directly from the cash fund, no quotas"),
                    ),
                )
                .subcommand(purchase_fields(
                    Command::new("edit").arg(id_arg("Purchase id")),
                    false,
                ))
                .subcommand(Command::new("rm").arg(id_arg("Purchase id")))
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(
                    Command::new("quotas")
                        .arg(id_arg("Purchase id"))
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("quota")
                        .about("Set quantity and amount paid of a quota")
                        .arg(id_arg("Quota id"))
                        .arg(
                            Arg::new("qty")
                                .long("qty")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("paid").long("paid").required(true)),
                )
                .subcommand(Command::new("complete").arg(id_arg("Purchase id"))),
        )
        .subcommand(
            Command::new("fund")
                .about("Manual cash fund movements")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(
                    Command::new("journal")
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .default_value("100")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("backup")
                .about("Database snapshots")
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("create"))
                .subcommand(
                    Command::new("restore")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("statement")
                .about("Reconcile a bank statement against a purchase")
                .subcommand(
                    Command::new("match")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(
                            Arg::new("purchase")
                                .long("purchase")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("delimiter").long("delimiter"))
                        .arg(
                            Arg::new("apply")
                                .long("apply")
                                .help("Confirm matches by index (comma separated) or 'all'"),
                        )
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export CSV files")
                .subcommand(
                    Command::new("members").arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("debtors")
                        .arg(
                            Arg::new("purchase")
                                .long("purchase")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("reset")
                .about("Back up, then clear purchases, quotas and fund movements")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Confirm the reset"),
                ),
        )
        .subcommand(Command::new("doctor").about("Report quotas needing attention"))
}
