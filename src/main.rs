use clap::Parser;
use tagweave::application::{ConfigService, InitService, NewTag, SyncService, TaxonomyService};
use tagweave::cli::{
    format_sync_report, format_tag_tree, format_tagset_list, Cli, Commands, TagCommand,
    TagsetCommand,
};
use tagweave::error::TagweaveError;
use tagweave::infrastructure::FileSystemRepository;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TAGWEAVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<(), TagweaveError> {
    match cli.command {
        Commands::Init { path } => {
            InitService::execute(&path)?;
            println!("Initialized tagweave workspace at {}", path.display());
            Ok(())
        }
        Commands::Config { key, value, list } => {
            let service = ConfigService::new(FileSystemRepository::discover()?);

            if list {
                let config = service.list()?;
                println!("author = {}", config.author);
                println!("default_color = {}", config.default_color);
                println!("created = {}", config.created.to_rfc3339());
            } else if let Some(k) = key {
                if let Some(v) = value {
                    let stored = service.set(&k, &v)?;
                    println!("Set {} = {}", k, stored);
                } else {
                    println!("{}", service.get(&k)?);
                }
            } else {
                println!("Usage: tagweave config [--list | <key> [<value>]]");
                println!("Valid keys: author, default_color, created");
            }
            Ok(())
        }
        Commands::Tagset { command } => {
            let mut service = TaxonomyService::open(FileSystemRepository::discover()?)?;
            match command {
                TagsetCommand::New { name } => {
                    let tagset = service.create_tagset(&name)?;
                    println!("Created tagset {} ({})", tagset.name(), tagset.uuid());
                }
                TagsetCommand::List => {
                    print!("{}", format_tagset_list(&service.tagsets()?));
                }
                TagsetCommand::Rename { tagset, name } => {
                    let renamed = service.rename_tagset(&tagset, &name)?;
                    println!("Renamed {} to {}", tagset, renamed.name());
                }
                TagsetCommand::Remove { tagset } => {
                    let removed = service.remove_tagset(&tagset)?;
                    println!("Removed tagset {} ({} tags)", removed.name(), removed.len());
                }
            }
            Ok(())
        }
        Commands::Tag { command } => {
            let mut service = TaxonomyService::open(FileSystemRepository::discover()?)?;
            match command {
                TagCommand::Add {
                    tagset,
                    name,
                    parent,
                    tag_type,
                    color,
                } => {
                    let definition = service.add_tag(
                        &tagset,
                        NewTag {
                            name: &name,
                            parent: parent.as_deref(),
                            tag_type: tag_type.as_deref(),
                            color: color.as_deref(),
                        },
                    )?;
                    println!("Added tag {} ({})", definition.name(), definition.uuid());
                }
                TagCommand::Remove { tagset, tag } => {
                    let removed = service.remove_tag(&tagset, &tag)?;
                    println!("Removed {} tag(s)", removed.len());
                }
                TagCommand::Color { tagset, tag, color } => {
                    if service.set_color(&tagset, &tag, &color)? {
                        println!("Changed color of {}", tag);
                    } else {
                        println!("{} already has that color", tag);
                    }
                }
            }
            Ok(())
        }
        Commands::Tree { tagset } => {
            let service = TaxonomyService::open(FileSystemRepository::discover()?)?;
            let name = service.tagset(&tagset)?.name().to_string();
            print!("{}", format_tag_tree(&name, &service.tree(&tagset)?));
            Ok(())
        }
        Commands::Export { tagset, file } => {
            let service = SyncService::open(FileSystemRepository::discover()?)?;
            let exported = service.export(&tagset, &file)?;
            println!("Exported {} to {}", exported.name(), file.display());
            Ok(())
        }
        Commands::Import { file } => {
            let service = SyncService::open(FileSystemRepository::discover()?)?;
            let imported = service.import(&file)?;
            println!("Imported tagset {} ({})", imported.name(), imported.uuid());
            Ok(())
        }
        Commands::Status { tagset, against } => {
            let service = SyncService::open(FileSystemRepository::discover()?)?;
            println!("{}", format_sync_report(&service.status(&tagset, &against)?).trim_end());
            Ok(())
        }
        Commands::Sync {
            tagset,
            from,
            dry_run,
        } => {
            let mut service = SyncService::open(FileSystemRepository::discover()?)?;
            let report = service.sync(&tagset, &from, dry_run)?;
            println!("{}", format_sync_report(&report).trim_end());
            Ok(())
        }
    }
}
