use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "zapdir",
    version,
    about = "community member directory service",
    long_about = "Zapdir serves the community member table of a tabular data API as a single JSON endpoint, normalizing loosely-typed rows on the way through.\n\nExamples:\n  zapdir\n  zapdir -p 8080 --table 'Membres ZAP'\n  zapdir --dump -o records.json\n\nCredentials are read from AIRTABLE_API_KEY / AIRTABLE_BASE_ID or the config file, never from the command line."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.zapdir/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'p',
        long = "port",
        value_name = "PORT",
        help_heading = "HTTP",
        help = "Port to listen on."
    )]
    pub port: Option<u16>,

    #[arg(
        long = "api-url",
        value_name = "URL",
        help_heading = "Source",
        help = "Base URL of the tabular data API."
    )]
    pub api_url: Option<String>,

    #[arg(
        short = 'b',
        long = "base-id",
        value_name = "ID",
        help_heading = "Source",
        help = "Base identifier (overrides AIRTABLE_BASE_ID)."
    )]
    pub base_id: Option<String>,

    #[arg(
        short = 't',
        long = "table",
        value_name = "NAME",
        help_heading = "Source",
        help = "Table to read records from."
    )]
    pub table: Option<String>,

    #[arg(
        long = "view",
        value_name = "NAME",
        help_heading = "Source",
        help = "View to read records through."
    )]
    pub view: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'd',
        long = "dump",
        help_heading = "Output",
        help = "Fetch the table once and render the records instead of serving."
    )]
    pub dump: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write dumped records to a file (defaults to stdout)."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Dump format (text or json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}
