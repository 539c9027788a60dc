use anyhow::Result;
use clap::{App as Cli, AppSettings, Arg, ArgMatches, SubCommand};
use focus_sync::app::{App, Command};
use focus_sync::config::Config;
use focus_sync::logger;
use log::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("DIR")
                .help("Sets a custom configuration directory")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Increases log verbosity"),
        )
        .subcommand(
            SubCommand::with_name("configure")
                .about("Stores the task store endpoint and token")
                .arg(
                    Arg::with_name("endpoint")
                        .long("endpoint")
                        .takes_value(true)
                        .required_unless("clear"),
                )
                .arg(
                    Arg::with_name("token")
                        .long("token")
                        .takes_value(true)
                        .required_unless("clear"),
                )
                .arg(
                    Arg::with_name("test")
                        .long("test")
                        .help("Checks the connection before saving"),
                )
                .arg(
                    Arg::with_name("clear")
                        .long("clear")
                        .conflicts_with_all(&["endpoint", "token", "test"])
                        .help("Forgets the stored endpoint and token"),
                ),
        )
        .subcommand(SubCommand::with_name("health").about("Checks the stored connection"))
        .subcommand(
            SubCommand::with_name("list")
                .about("Lists pending tasks")
                .arg(area_arg()),
        )
        .subcommand(
            SubCommand::with_name("add")
                .about("Adds a task")
                .arg(Arg::with_name("text").required(true).multiple(true))
                .arg(area_arg()),
        )
        .subcommand(
            SubCommand::with_name("complete")
                .about("Completes a task")
                .arg(Arg::with_name("id").required(true)),
        )
        .subcommand(
            SubCommand::with_name("delete")
                .about("Deletes a task")
                .arg(Arg::with_name("id").required(true)),
        )
        .subcommand(SubCommand::with_name("stats").about("Shows task counters"))
        .get_matches();

    logger::init(level_for(matches.occurrences_of("verbose")))?;

    let mut config = Config::new();
    config.load(matches.value_of("config"))?;

    let command = match matches.subcommand() {
        ("configure", Some(sub)) if sub.is_present("clear") => Command::Disconnect,
        ("configure", Some(sub)) => Command::Configure {
            endpoint: value(sub, "endpoint"),
            token: value(sub, "token"),
            test: sub.is_present("test"),
        },
        ("health", _) => Command::Health,
        ("list", Some(sub)) => Command::List {
            area: sub.value_of("area").map(str::to_owned),
        },
        ("add", Some(sub)) => Command::Add {
            text: sub
                .values_of("text")
                .map(|words| words.collect::<Vec<_>>().join(" "))
                .unwrap_or_default(),
            area: sub.value_of("area").map(str::to_owned),
        },
        ("complete", Some(sub)) => Command::Complete {
            id: value(sub, "id"),
        },
        ("delete", Some(sub)) => Command::Delete {
            id: value(sub, "id"),
        },
        _ => Command::Stats,
    };

    App::start(config, command).await
}

fn area_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("area")
        .short("a")
        .long("area")
        .value_name("AREA")
        .takes_value(true)
        .help("Restricts to one area, e.g. work or side_project")
}

fn value(matches: &ArgMatches, name: &str) -> String {
    matches.value_of(name).unwrap_or_default().to_owned()
}

fn level_for(occurrences: u64) -> LevelFilter {
    match occurrences {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
