use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(port) = args.port {
        if port == 0 {
            return Err("invalid --port, expected 1-65535".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive seconds".to_string());
        }
    }
    if let Some(table) = args.table.as_deref() {
        if table.trim().is_empty() {
            return Err("invalid --table, expected a table name".to_string());
        }
    }
    if let Some(view) = args.view.as_deref() {
        if view.trim().is_empty() {
            return Err("invalid --view, expected a view name".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    if args.output.is_some() && !args.dump {
        return Err("--out requires --dump".to_string());
    }
    Ok(())
}
