use anyhow::{bail, Context, Result};
use cefr_grader::models::{ClassificationResult, ClassifyRequest, ErrorResponse};
use cefr_grader::services::{
    classify_request, classify_with_options, parse_provider, AppConfig, ChatModel, ClassifyOptions,
    ConfigStore, JsonFileLexicon, LexiconBuilder, LexiconStore, ProviderClient, SegmentationMode,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, info_span, warn};

const USAGE: &str = "Usage:
  cefr_classify classify <path|-> [--text <text>] [--lexicon <json>] [--mode <lookahead|pattern|pattern-semicolon>] [--strict] [--out <json_path>]
  cefr_classify request <body.json|-> [--lexicon <json>] [--mode <m>] [--strict]
  cefr_classify refresh [--words <json>] [--classified <json>] [--provider <name[:model]>] [--batch-size <n>]
  cefr_classify set-key <api_key> [--provider <name>] | set-key --delete [--provider <name>]

Options:
  --config <dir>   config directory (default: platform config dir /cefr-grader)

Notes:
  - `request` takes a JSON body {\"text\": \"...\"} and prints {\"sentences\", \"words\"} or {\"error\"}.
  - `refresh` supports the openai provider and needs OPENAI_API_KEY (or CEFR_OPENAI_API_KEY,
    or apiKeys.openai in <config dir>/config.json).";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

/// First argument after the command that is not an option or an option value.
fn positional(args: &[String]) -> Option<String> {
    const VALUED: [&str; 9] = [
        "--text", "--lexicon", "--mode", "--out", "--config", "--words", "--classified",
        "--provider", "--batch-size",
    ];
    let mut i = 2;
    while i < args.len() {
        let a = &args[i];
        if VALUED.contains(&a.as_str()) {
            i += 2;
            continue;
        }
        if a.starts_with("--") {
            i += 1;
            continue;
        }
        return Some(a.clone());
    }
    None
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin failed")?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).with_context(|| format!("read {} failed", source))
}

fn config_store(args: &[String]) -> Option<ConfigStore> {
    parse_arg_value(args, "--config")
        .map(PathBuf::from)
        .or_else(ConfigStore::default_config_dir)
        .map(ConfigStore::new)
}

fn load_config(args: &[String]) -> Result<AppConfig> {
    match config_store(args) {
        Some(store) => store.load().context("load config failed"),
        None => Ok(AppConfig::default()),
    }
}

/// Store or delete a provider key in the same config the `refresh` lookup reads.
fn run_set_key(args: &[String]) -> Result<()> {
    let Some(store) = config_store(args) else {
        bail!("no config directory available; pass --config <dir>");
    };
    let provider_arg = parse_arg_value(args, "--provider").unwrap_or_else(|| "openai".to_string());
    let spec = parse_provider(&provider_arg)
        .with_context(|| format!("invalid provider {:?}", provider_arg))?;

    if has_flag(args, "--delete") {
        store.delete_api_key(&spec.name)?;
        println!("Removed {} key from {}", spec.name, store.config_file().display());
        return Ok(());
    }
    let Some(key) = positional(args) else {
        bail!("set-key needs an API key or --delete\n\n{}", USAGE);
    };
    store.set_api_key(&spec.name, key.trim())?;
    println!("Stored {} key in {}", spec.name, store.config_file().display());
    Ok(())
}

fn classify_options(args: &[String], config: &AppConfig) -> Result<ClassifyOptions> {
    let mut options = config.classify;
    if let Some(mode) = parse_arg_value(args, "--mode") {
        options.segmentation = match SegmentationMode::parse(&mode) {
            Some(m) => m,
            None => bail!("unknown segmentation mode: {}", mode),
        };
    }
    if has_flag(args, "--strict") {
        options.strict_charset = true;
    }
    Ok(options)
}

fn lexicon_store(args: &[String], config: &AppConfig) -> LexiconStore {
    let path = parse_arg_value(args, "--lexicon")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.lexicon.classified_file.clone());
    LexiconStore::from_provider(&JsonFileLexicon::new(path))
}

fn print_result(result: &ClassificationResult, out_path: Option<String>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    match out_path {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("write {} failed", path))?;
            println!("Wrote JSON: {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_classify(args: &[String], config: &AppConfig) -> Result<()> {
    let text = match parse_arg_value(args, "--text") {
        Some(text) => text,
        None => match positional(args) {
            Some(source) => read_input(&source)?,
            None => bail!("classify needs a path, '-' or --text\n\n{}", USAGE),
        },
    };
    let options = classify_options(args, config)?;
    let store = lexicon_store(args, config);
    let level_map = store.snapshot();

    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("classify", %request_id);
    let _enter = span.enter();

    let result = classify_with_options(&text, &level_map, &options)?;
    info!(
        sentences = result.sentences.len(),
        words = result.words.len(),
        "classify.completed"
    );
    print_result(&result, parse_arg_value(args, "--out"))
}

/// Mirrors the JSON endpoint: body in, result or error payload out.
fn run_request(args: &[String], config: &AppConfig) -> Result<bool> {
    let source = positional(args).unwrap_or_else(|| "-".to_string());
    let body = read_input(&source)?;
    let options = classify_options(args, config)?;
    let store = lexicon_store(args, config);
    let level_map = store.snapshot();

    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("request", %request_id);
    let _enter = span.enter();

    let outcome = serde_json::from_str::<ClassifyRequest>(&body)
        .map_err(|e| format!("malformed request body: {}", e))
        .and_then(|req| classify_request(&req, &level_map, &options).map_err(|e| e.to_string()));

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(true)
        }
        Err(error) => {
            warn!(error = %error, "request.rejected");
            println!("{}", serde_json::to_string_pretty(&ErrorResponse { error })?);
            Ok(false)
        }
    }
}

async fn run_refresh(args: &[String], config: &AppConfig) -> Result<()> {
    let words_file = parse_arg_value(args, "--words")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.lexicon.words_file.clone());
    let classified_file = parse_arg_value(args, "--classified")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.lexicon.classified_file.clone());
    let batch_size = match parse_arg_value(args, "--batch-size") {
        Some(n) => n.parse().with_context(|| format!("invalid --batch-size {}", n))?,
        None => config.lexicon.batch_size,
    };
    let provider_arg =
        parse_arg_value(args, "--provider").unwrap_or_else(|| config.provider.spec.clone());
    let spec = parse_provider(&provider_arg)
        .with_context(|| format!("invalid provider {:?}", provider_arg))?;

    let client = match (&config.provider.base_url, &config.provider.proxy) {
        (Some(url), Some(proxy)) => ProviderClient::with_proxy(url, proxy)?,
        (Some(url), None) => ProviderClient::with_url(url),
        (None, _) => ProviderClient::new(),
    };
    let chat = ChatModel::from_spec(client, &spec, &config.api_keys)
        .with_context(|| format!("provider {} is not usable", spec.name))?;

    info!(provider = %spec.name, model = chat.model(), "refresh.start");
    let builder = LexiconBuilder::new(words_file, classified_file).with_batch_size(batch_size);
    let summary = builder.refresh(&chat).await?;

    println!(
        "Words: {}  newly classified: {}  batches: {}  failed writes: {}",
        summary.total_words, summary.newly_classified, summary.batches, summary.failed_writes
    );
    println!("Lexicon: {}", builder.classified_file().display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    cefr_grader::init_logging();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    let config = load_config(&args)?;

    match command.as_str() {
        "classify" => run_classify(&args, &config),
        "request" => {
            if !run_request(&args, &config)? {
                std::process::exit(2);
            }
            Ok(())
        }
        "refresh" => run_refresh(&args, &config).await,
        "set-key" => run_set_key(&args),
        "-h" | "--help" | "help" => {
            eprintln!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command: {}\n\n{}", other, USAGE),
    }
}
