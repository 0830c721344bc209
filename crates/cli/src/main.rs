use std::fs;

use anyhow::{Context, Result};
use argtext::args::{self, Binder, ParseOptions, Parsed};
use argtext::template::Grammar;
use tracing_subscriber::{EnvFilter, fmt};

const USAGE_TEMPLATE: &str = "\
Usage: {{COMMAND}} {{OPTION}} <TEMPLATE>

Compile a usage template and report its grammar.

+ -a, --args      ## command line (including argv[0]) to parse against the template
? -j, --json      ## print the compiled grammar as JSON
? -t, --tolerant  ## allow unknown options when parsing
? -H, --help      ## show this help and exit
?     --version   ## show version and exit
";

fn main() -> Result<()> {
    init_tracing();
    let argv: Vec<String> = std::env::args().collect();

    let own = Grammar::compile(USAGE_TEMPLATE).context("built-in usage template must compile")?;

    // Help and version work on the raw argv, before anything is parsed.
    if args::has_args(&argv, ["-H", "--help"]) {
        print!("{}", own.usage(command(&argv)));
        return Ok(());
    }
    if args::has_args(&argv, "--version") {
        println!("argtext {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut template_path = String::new();
    let mut args_line = String::new();
    let mut as_json = false;
    let mut tolerant = false;

    let mut binder = Binder::new(&own);
    binder.string_operand("TEMPLATE", &mut template_path, "");
    binder.string_option("-a", &mut args_line, "");
    binder.bool_option("-j", &mut as_json, false);
    binder.bool_option("-t", &mut tolerant, false);

    if let Err(err) = binder.parse(&argv, ParseOptions::default()) {
        eprintln!("{err}");
        eprint!("{}", own.usage(command(&argv)));
        std::process::exit(2);
    }

    run(&template_path, &args_line, as_json, tolerant)
}

fn command(argv: &[String]) -> &str {
    argv.first().map(String::as_str).unwrap_or("argtext")
}

fn run(template_path: &str, args_line: &str, as_json: bool, tolerant: bool) -> Result<()> {
    tracing::debug!("compiling template {template_path}");

    let source = fs::read_to_string(template_path)
        .with_context(|| format!("failed to read template `{template_path}`"))?;
    let grammar = Grammar::compile(&source)
        .with_context(|| format!("failed to compile template `{template_path}`"))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&grammar)?);
    } else {
        print_summary(&grammar);
    }

    if !args_line.is_empty() {
        let argv: Vec<String> = args_line.split_whitespace().map(str::to_string).collect();
        tracing::debug!("parsing {} argv tokens", argv.len());
        match args::parse(&grammar, &argv, ParseOptions { allow_unknown: tolerant }) {
            Ok(parsed) => print_parsed(&parsed),
            Err(err) => {
                eprintln!("{err}");
                eprint!("{}", grammar.usage(argv.first().map(String::as_str).unwrap_or("")));
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

fn print_summary(grammar: &Grammar) {
    let mut rows: Vec<(String, String)> = Vec::new();

    for name in grammar.operand_names() {
        let mut notes = vec![if grammar.required_operands().contains(name) {
            "required"
        } else {
            "optional"
        }];
        if grammar.array_operand() == Some(name.as_str()) {
            notes.push("list");
        }
        rows.push((format!("<{name}>"), format!("operand, {}", notes.join(", "))));
    }

    for option in grammar.options() {
        let mut label = option.clone();
        if let Some(alias) = grammar.alias_of(option) {
            label.push_str(", ");
            label.push_str(alias);
        }
        let mut note = if grammar.is_switch(option) {
            "switch".to_string()
        } else {
            "takes a value".to_string()
        };
        if grammar.required_options().contains(option) {
            note.push_str(", required");
        }
        rows.push((label, note));
    }

    if rows.is_empty() {
        println!("nothing declared");
        return;
    }
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;
    for (label, note) in &rows {
        println!("  {label:width$}{note}");
    }
}

fn print_parsed(parsed: &Parsed<'_>) {
    println!();
    println!("command: {}", parsed.command());
    for (index, operand) in parsed.operands().iter().enumerate() {
        println!("operand[{index}]: {operand}");
    }
    for (name, value) in parsed.options() {
        println!("option {name} = {value}");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
