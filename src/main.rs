//! tmplpress's main application entry point and orchestration logic.
//! Handles command-line argument parsing and dispatches to the resolver,
//! the manifest tools and the press engine.

use tmplpress::{
    answers::{load_answers, AnswerSet},
    cli::{get_args, Args, Command, ConfigCommand, ManifestCommand, PressArgs, TemplateType},
    config::{config_path, UserConfig},
    error::{default_error_handler, Result},
    loader::{is_remote_location, GitCli, LocalLoader, Resolver},
    logger::init_logger,
    manifest::{manifest_path, template_root_of},
    processor::{check_guard, Press},
    renderer::PlaceholderRenderer,
    scanner::{GeneratePolicy, Scanner},
    validator::validate_file,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// The user configuration is loaded once here and handed down to the
/// commands that need it.
fn run(args: Args) -> Result<()> {
    let config_file = config_path(args.config_dir.as_deref())?;
    let mut config = UserConfig::load(&config_file)?;

    match args.command {
        Command::Press(press_args) => press(&config, press_args),
        Command::Manifest(ManifestCommand::Generate { path, prune }) => {
            let path = manifest_path(path.as_deref())?;
            let template_root = template_root_of(&path);
            let policy = if prune { GeneratePolicy::Prune } else { GeneratePolicy::Additive };
            let renderer = PlaceholderRenderer::new();
            let manifest = Scanner::new(&renderer, &config.exclude_file_extensions)
                .policy(policy)
                .generate(template_root)?;
            println!(
                "Wrote {} placeholder(s) to '{}'.",
                manifest.placeholders.len(),
                path.display()
            );
            Ok(())
        }
        Command::Manifest(ManifestCommand::Validate { path }) => {
            let path = manifest_path(path.as_deref())?;
            validate_file(&path)?;
            println!("Manifest '{}' is valid.", path.display());
            Ok(())
        }
        Command::Config(ConfigCommand::Get { key }) => {
            println!("{}", config.get(&key)?);
            Ok(())
        }
        Command::Config(ConfigCommand::Set { key, value }) => {
            config.set(&key, &value)?;
            config.save(&config_file)
        }
        Command::LatestTag { location } => {
            let git = GitCli::new();
            let tag = Resolver::new(&git, &config.cache_dir).latest_tag(&location)?;
            println!("{tag}");
            Ok(())
        }
    }
}

/// Resolves the template, reads the answers and presses the output tree.
fn press(config: &UserConfig, args: PressArgs) -> Result<()> {
    let template_root = match args.tmpl_type {
        TemplateType::Dir => LocalLoader::new(&args.tmpl_path).load()?,
        TemplateType::Git => {
            if !is_remote_location(&args.tmpl_path) {
                check_guard(&args.tmpl_path, &args.out_path)?;
            }
            let git = GitCli::new();
            let snapshot = Resolver::new(&git, &config.cache_dir)
                .resolve(&args.tmpl_path, args.branch.as_deref())?;
            println!("Using template at revision {}", snapshot.revision);
            snapshot.path
        }
    };

    let answers = match &args.answer_path {
        Some(path) => load_answers(path)?,
        None => AnswerSet::new(),
    };

    let renderer = PlaceholderRenderer::new();
    let operations =
        Press::new(&renderer, config).run(&template_root, &args.out_path, &answers, args.force)?;
    for operation in &operations {
        println!("{operation}");
    }

    println!("Template pressed successfully in {}.", args.out_path.display());
    Ok(())
}
