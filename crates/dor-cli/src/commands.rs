use anyhow::Context;
use colored::Colorize;

use dor_client::{IdSpec, QueryLanguage, Repository, RepositoryConfig};
use dor_types::Pid;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = RepositoryConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let repo = Repository::connect(config).context("connecting to repository")?;
    let json = matches!(cli.format, OutputFormat::Json);

    match cli.command {
        Command::Describe => cmd_describe(&repo, json).await,
        Command::Object(args) => match args.command {
            ObjectCommand::Show { pid } => cmd_object_show(&repo, &pid, json).await,
            ObjectCommand::Ingest {
                id,
                uuid,
                label,
                owner,
            } => cmd_object_ingest(&repo, id.as_deref(), uuid, label, owner).await,
            ObjectCommand::Delete { pid } => cmd_object_delete(&repo, &pid).await,
            ObjectCommand::Purge { pid } => cmd_object_purge(&repo, &pid).await,
        },
        Command::Ds(args) => match args.command {
            DsCommand::List { pid } => cmd_ds_list(&repo, &pid, json).await,
            DsCommand::Show { pid, dsid } => cmd_ds_show(&repo, &pid, &dsid, json).await,
            DsCommand::Get { pid, dsid, output } => cmd_ds_get(&repo, &pid, &dsid, output).await,
            DsCommand::Purge { pid, dsid } => cmd_ds_purge(&repo, &pid, &dsid).await,
        },
        Command::Pids(args) => cmd_pids(&repo, args).await,
        Command::Query(args) => cmd_query(&repo, args, json).await,
        Command::Validate(args) => cmd_validate(&repo, args).await,
    }
}

fn parse_pid(s: &str) -> anyhow::Result<Pid> {
    Pid::new(s).with_context(|| format!("invalid pid: {s}"))
}

async fn cmd_describe(repo: &Repository, json: bool) -> anyhow::Result<()> {
    let info = repo.describe().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    println!(
        "{} {}",
        info.name.as_deref().unwrap_or("Repository").bold(),
        info.version.cyan()
    );
    if let Some(url) = &info.base_url {
        println!("  Base URL: {url}");
    }
    if let Some(ns) = &info.pid_namespace {
        println!("  Default namespace: {}", ns.yellow());
    }
    Ok(())
}

async fn cmd_object_show(repo: &Repository, pid: &str, json: bool) -> anyhow::Result<()> {
    let object = repo.get_object(&parse_pid(pid)?).await?;
    let profile = object.profile().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }
    println!("{}  ({})", object.pid().to_string().yellow().bold(), profile.state);
    if let Some(label) = &profile.label {
        println!("  Label: {label}");
    }
    if let Some(owner) = &profile.owner {
        println!("  Owner: {owner}");
    }
    if let Some(created) = &profile.created {
        println!("  Created: {created}");
    }
    if let Some(modified) = &profile.modified {
        println!("  Modified: {modified}");
    }
    for model in &profile.models {
        println!("  Model: {}", model.cyan());
    }
    let datastreams = object.datastreams().await?;
    println!("  Datastreams: {}", datastreams.len().to_string().bold());
    for ds in datastreams {
        println!("    {}", ds.id());
    }
    Ok(())
}

async fn cmd_object_ingest(
    repo: &Repository,
    id: Option<&str>,
    uuid: bool,
    label: Option<String>,
    owner: Option<String>,
) -> anyhow::Result<()> {
    let spec = IdSpec::parse(id)?;
    let mut object = repo.construct_object(spec, uuid).await?;
    object.label = label;
    object.owner = owner;
    let persisted = repo.ingest_object(object).await?;
    println!(
        "{} Ingested {}",
        "✓".green().bold(),
        persisted.pid().to_string().yellow()
    );
    Ok(())
}

async fn cmd_object_delete(repo: &Repository, pid: &str) -> anyhow::Result<()> {
    let object = repo.get_object(&parse_pid(pid)?).await?;
    object.delete().await?;
    println!("{} {} marked deleted", "✓".green(), pid.yellow());
    Ok(())
}

async fn cmd_object_purge(repo: &Repository, pid: &str) -> anyhow::Result<()> {
    let timestamp = repo.purge_object(&parse_pid(pid)?).await?;
    println!("{} Purged {} at {}", "✓".green().bold(), pid.yellow(), timestamp);
    Ok(())
}

async fn cmd_ds_list(repo: &Repository, pid: &str, json: bool) -> anyhow::Result<()> {
    let listed = repo.api().a.list_datastreams(&parse_pid(pid)?, None).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }
    for brief in listed {
        println!(
            "{}  {}  {}",
            brief.dsid.bold(),
            brief.mime_type.as_deref().unwrap_or("-").cyan(),
            brief.label.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn cmd_ds_show(repo: &Repository, pid: &str, dsid: &str, json: bool) -> anyhow::Result<()> {
    let object = repo.get_object(&parse_pid(pid)?).await?;
    let ds = object
        .datastream(dsid)
        .await?
        .with_context(|| format!("no datastream {dsid} on {pid}"))?;
    let profile = ds.profile().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }
    println!("{}/{}  ({})", pid.yellow(), dsid.bold(), profile.state);
    println!("  Control group: {}", profile.control_group);
    if let Some(label) = &profile.label {
        println!("  Label: {label}");
    }
    if let Some(mime) = &profile.mime_type {
        println!("  MIME: {}", mime.cyan());
    }
    if let Some(size) = profile.size {
        println!("  Size: {size}");
    }
    if let Some(kind) = profile.checksum_kind {
        println!("  Checksum: {kind}");
    }
    Ok(())
}

async fn cmd_ds_get(
    repo: &Repository,
    pid: &str,
    dsid: &str,
    output: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let pid = parse_pid(pid)?;
    match output {
        Some(path) => {
            repo.api()
                .a
                .datastream_content_to_file(&pid, dsid, None, &path)
                .await?;
            println!("{} Wrote {}", "✓".green(), path.display().to_string().bold());
        }
        None => {
            let content = repo.api().a.datastream_content(&pid, dsid, None).await?;
            use std::io::Write;
            std::io::stdout().write_all(&content)?;
        }
    }
    Ok(())
}

async fn cmd_ds_purge(repo: &Repository, pid: &str, dsid: &str) -> anyhow::Result<()> {
    let object = repo.get_object(&parse_pid(pid)?).await?;
    let purged = object.purge_datastream(dsid).await?;
    println!(
        "{} Purged {} version(s) of {}/{}",
        "✓".green().bold(),
        purged.len().to_string().bold(),
        pid.yellow(),
        dsid
    );
    Ok(())
}

async fn cmd_pids(repo: &Repository, args: PidsArgs) -> anyhow::Result<()> {
    let pids = repo
        .next_identifiers(args.namespace.as_deref(), args.uuid, args.count)
        .await?;
    for pid in pids {
        println!("{pid}");
    }
    Ok(())
}

async fn cmd_query(repo: &Repository, args: QueryArgs, json: bool) -> anyhow::Result<()> {
    let language = match args.lang {
        QueryLang::Sparql => QueryLanguage::Sparql,
        QueryLang::Itql => QueryLanguage::Itql,
        QueryLang::Sql2 => QueryLanguage::Sql2,
    };
    let rows = repo.query().query(&args.query, language, args.limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for (index, row) in rows.iter().enumerate() {
        println!("{}", format!("-- row {index}").dimmed());
        for (variable, value) in row {
            match &value.uri {
                Some(uri) => println!("  {variable}: {} <{}>", value.value.yellow(), uri.dimmed()),
                None => println!("  {variable}: {}", value.value),
            }
        }
    }
    Ok(())
}

async fn cmd_validate(repo: &Repository, args: ValidateArgs) -> anyhow::Result<()> {
    let report = repo
        .api()
        .m
        .validate_object(&parse_pid(&args.pid)?, None)
        .await?;
    if report.valid {
        println!("{} {} is valid", "✓".green().bold(), args.pid.yellow());
    } else {
        println!("{} {} is invalid", "✗".red().bold(), args.pid.yellow());
        for problem in &report.problems {
            println!("  {problem}");
        }
        for (dsid, problems) in &report.datastream_problems {
            for problem in problems {
                println!("  {}: {problem}", dsid.bold());
            }
        }
        std::process::exit(1);
    }
    Ok(())
}
