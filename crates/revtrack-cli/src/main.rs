//! revtrack CLI
//!
//! Operator tool: send a one-off report and manage rules and client records
//! in the server database.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use revtrack_api::PhonehomeRequest;
use revtrack_client::HttpClient;
use revtrack_core::{RevisionRule, RuleSet};
use revtrack_store::{SqliteStore, TableNames};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "revtrack")]
#[command(about = "Revision tracking operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one phonehome report and print the resolved revision
    Report {
        /// Phonehome endpoint
        #[arg(long, default_value = "http://127.0.0.1:8080/phonehome")]
        url: String,
        /// Package name
        #[arg(long)]
        package: String,
        /// Hostname to report (defaults to this machine)
        #[arg(long)]
        hostname: Option<String>,
        /// Revision to report as applied
        #[arg(long)]
        git_hash: Option<String>,
        /// Address to report (repeatable)
        #[arg(long = "ip")]
        ips: Vec<String>,
    },
    /// Manage hostname rules
    Rules {
        #[command(flatten)]
        db: DbArgs,
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Inspect recorded clients
    Clients {
        #[command(flatten)]
        db: DbArgs,
        #[command(subcommand)]
        command: ClientsCommand,
    },
}

#[derive(Args)]
struct DbArgs {
    /// `SQLite` database file
    #[arg(long, default_value = "revtrack.db")]
    db: PathBuf,
    /// Client report table
    #[arg(long)]
    phonehome_table: Option<String>,
    /// Rule table
    #[arg(long)]
    version_table: Option<String>,
}

impl DbArgs {
    fn open(&self) -> Result<SqliteStore> {
        let defaults = TableNames::default();
        let tables = TableNames {
            phonehome: self.phonehome_table.clone().unwrap_or(defaults.phonehome),
            version: self.version_table.clone().unwrap_or(defaults.version),
        };
        Ok(SqliteStore::open(&self.db, tables)?)
    }
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Add a rule, or replace the revision and priority of an existing one
    Add {
        #[arg(long)]
        package: String,
        /// Hostname regular expression, matched anywhere in the hostname
        #[arg(long)]
        pattern: String,
        /// Target revision
        #[arg(long)]
        revision: String,
        /// Higher priorities are tried first
        #[arg(long, default_value_t = 0)]
        priority: i64,
    },
    /// List rules in match order
    List {
        #[arg(long)]
        package: Option<String>,
    },
    /// Remove a rule
    Remove {
        #[arg(long)]
        package: String,
        #[arg(long)]
        pattern: String,
    },
    /// Show which rule a hostname resolves to
    Resolve {
        #[arg(long)]
        package: String,
        #[arg(long)]
        hostname: String,
    },
}

#[derive(Subcommand)]
enum ClientsCommand {
    /// List recorded clients
    List {
        #[arg(long)]
        package: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            url,
            package,
            hostname,
            git_hash,
            ips,
        } => {
            let hostname = hostname
                .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().into_owned());
            let report = PhonehomeRequest::new(package, hostname)
                .with_git_hash(git_hash)
                .with_ip_list(ips);
            report.validate()?;

            let response = HttpClient::new(&url)?.phonehome(&report).await?;
            match response.git_hash {
                Some(revision) => println!("{revision}"),
                None => println!("no matching rule"),
            }
        }
        Commands::Rules { db, command } => {
            let store = db.open()?;
            match command {
                RulesCommand::Add {
                    package,
                    pattern,
                    revision,
                    priority,
                } => {
                    add_rule(&store, &RevisionRule::new(package, pattern, revision, priority))?;
                    println!("rule saved");
                }
                RulesCommand::List { package } => {
                    let rules = match package {
                        Some(package) => store.rules_for_package_blocking(&package)?,
                        None => store.list_rules()?,
                    };
                    print_rules(&rules);
                }
                RulesCommand::Remove { package, pattern } => {
                    if store.delete_rule(&package, &pattern)? {
                        println!("rule removed");
                    } else {
                        println!("no such rule");
                    }
                }
                RulesCommand::Resolve { package, hostname } => {
                    let rules = RuleSet::new(store.rules_for_package_blocking(&package)?);
                    match rules.resolve(&hostname) {
                        Some(rule) => println!(
                            "{} (pattern {:?}, priority {})",
                            rule.target_revision, rule.hostname_pattern, rule.match_priority
                        ),
                        None => println!("no matching rule"),
                    }
                }
            }
        }
        Commands::Clients { db, command } => {
            let store = db.open()?;
            match command {
                ClientsCommand::List { package } => {
                    for record in store.list_records(package.as_deref())? {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            record.package_name,
                            record.hostname,
                            record.git_hash,
                            record.ip_list,
                            record.last_updated_at.to_rfc3339()
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Save a rule whose pattern compiles; broken patterns never reach the store
fn add_rule(store: &SqliteStore, rule: &RevisionRule) -> Result<()> {
    rule.check_pattern()?;
    store.put_rule(rule)?;
    Ok(())
}

fn print_rules(rules: &[RevisionRule]) {
    if rules.is_empty() {
        println!("no rules");
        return;
    }
    for rule in rules {
        println!(
            "{}\t{}\t{}\t{}",
            rule.package_name, rule.match_priority, rule.hostname_pattern, rule.target_revision
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rule_rejects_invalid_pattern() {
        let store = SqliteStore::open_in_memory(TableNames::default()).unwrap();

        assert!(add_rule(&store, &RevisionRule::new("web", "(unclosed", "aaa", 1)).is_err());
        assert!(store.list_rules().unwrap().is_empty());
    }

    #[test]
    fn test_add_rule_accepts_lookaround() {
        let store = SqliteStore::open_in_memory(TableNames::default()).unwrap();

        add_rule(&store, &RevisionRule::new("web", "^(?!db)", "aaa", 1)).unwrap();
        assert_eq!(store.rules_for_package_blocking("web").unwrap().len(), 1);
    }
}
