mod cli;

use ch_rulebook::{
    checks::{self, CheckContext},
    compile, config, engine, output, runner,
};
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            path,
            only,
            format,
            output: output_path,
            strict,
            config: config_path,
        } => {
            let mut config = config::Config::load(config_path.as_deref()).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });

            if strict {
                config.strict.enabled = true;
            }

            let rules_dir = path.unwrap_or_else(|| config.paths.rules.clone());
            if !rules_dir.exists() {
                eprintln!("Error: rules directory does not exist: {}", rules_dir.display());
                std::process::exit(2);
            }

            let ctx = CheckContext {
                rules_dir: &rules_dir,
                skill_dir: &config.paths.skill,
                config: &config,
            };
            let report = runner::run_checks(&ctx, only.as_deref());
            let formatted = output::format_report(&report, &format);

            if let Some(out_path) = output_path {
                std::fs::write(&out_path, &formatted).unwrap_or_else(|e| {
                    eprintln!("Error writing output: {e}");
                    std::process::exit(2);
                });
                eprintln!("Output written to {}", out_path.display());
            } else {
                print!("{formatted}");
            }

            std::process::exit(if report.passed { 0 } else { 1 });
        }

        Commands::Build {
            path,
            manifest,
            output: output_path,
            upgrade,
            config: config_path,
        } => {
            let config = config::Config::load(config_path.as_deref()).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });

            let rules_dir = path.unwrap_or_else(|| config.paths.rules.clone());
            let manifest_path = manifest.unwrap_or_else(|| config.paths.manifest.clone());
            let output_path = output_path.unwrap_or_else(|| config.paths.output.clone());

            if !rules_dir.exists() {
                eprintln!("Error: rules directory does not exist: {}", rules_dir.display());
                std::process::exit(2);
            }

            if upgrade {
                match compile::bump_version(&manifest_path) {
                    Ok(version) => eprintln!("Version bumped to {version}"),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(2);
                    }
                }
            }

            // The manifest is (re-)loaded after any bump so the emitted
            // document always carries the persisted version.
            let manifest = compile::Manifest::load(&manifest_path).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });

            match compile::build_to_file(&rules_dir, &manifest, &output_path) {
                Ok(()) => {
                    eprintln!(
                        "Compiled {} (version {})",
                        output_path.display(),
                        manifest.book.version
                    );
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::CheckTools => {
            println!("{}", "Check Availability".bold().underline());
            println!();

            let all = checks::all_checks();
            for check in &all {
                let status = if check.is_available() {
                    "READY".green().bold().to_string()
                } else {
                    "NOT AVAILABLE".red().to_string()
                };

                println!(
                    "  [{status}] {name:<16} {desc}",
                    name = check.name(),
                    desc = check.description(),
                );
            }

            println!();
            let config = config::Config::load(None).unwrap_or_default();
            let engine_path = engine::ClickHouseLocal::cache_path(&config.engine);
            if engine_path.exists() {
                println!("SQL engine: cached at {}", engine_path.display());
            } else {
                println!(
                    "SQL engine: not cached (version {} will be fetched on first use)",
                    config.engine.version
                );
            }
        }

        Commands::ListCodes => {
            let codes = checks::all_codes();
            println!("{}", "Violation Codes".bold().underline());
            println!();

            let mut current_check = "";
            for code in &codes {
                if code.check != current_check {
                    if !current_check.is_empty() {
                        println!();
                    }
                    println!("  {}", code.check.bold());
                    current_check = code.check;
                }

                let severity = match code.severity {
                    "error" => "ERROR".red().bold().to_string(),
                    "warning" => " WARN".yellow().bold().to_string(),
                    "info" => " INFO".blue().to_string(),
                    _ => code.severity.to_string(),
                };

                println!(
                    "    [{severity}] {id:<36} {message}",
                    id = code.id,
                    message = code.message,
                );
            }

            println!();
            println!("  Total: {} codes", codes.len());
        }

        Commands::Explain { code } => {
            let codes = checks::all_codes();
            match codes.iter().find(|c| c.id == code) {
                Some(info) => {
                    println!("{}", info.id.bold());
                    println!();
                    println!("  Check:        {}", info.check);
                    println!("  Severity:     {}", info.severity);
                    println!("  Description:  {}", info.message);
                    println!("  Remediation:  {}", info.remediation);
                }
                None => {
                    eprintln!("Unknown code: {code}");
                    eprintln!("Use 'ch-rulebook list-codes' to see all violation codes.");
                    std::process::exit(2);
                }
            }
        }
    }
}
