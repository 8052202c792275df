use clap::Parser as ClapParser;
use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use serde::Serialize;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use strpsql_core::{
    HighlightConfig, SourceRange, SqlTag, SqlTokenCategory, StringSqlTagger, TextSnapshot,
};
use strpsql_lexer::PostgresLexer;

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// C# source file to highlight
    file: PathBuf,

    /// Project file to read `PostgreSqlInAString` settings from
    #[arg(long, help = "Read settings from this .csproj instead of searching for one")]
    project: Option<PathBuf>,

    /// Only highlight literals inside `strpsql-on` regions
    #[arg(long, help = "Start every file with highlighting disabled")]
    disabled_by_default: bool,

    /// Print tags as JSON instead of coloring the source
    #[arg(long)]
    json: bool,

    /// Restrict output to a range of UTF-16 code units
    #[arg(long, value_parser = parse_range, help = "Requested range, START..END")]
    range: Option<SourceRange>,
}

#[derive(Serialize)]
struct JsonTag {
    start: usize,
    length: usize,
    category: &'static str,
    escape: bool,
}

impl From<&SqlTag> for JsonTag {
    fn from(tag: &SqlTag) -> Self {
        Self {
            start: tag.range.start,
            length: tag.range.len,
            category: tag.category.name(),
            escape: tag.is_escape,
        }
    }
}

fn parse_range(arg: &str) -> Result<SourceRange, String> {
    let (start, end) = arg
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got `{arg}`"))?;
    let start: usize = start.trim().parse().map_err(|e| format!("bad start: {e}"))?;
    let end: usize = end.trim().parse().map_err(|e| format!("bad end: {e}"))?;
    if end < start {
        return Err(format!("range end {end} is before start {start}"));
    }
    Ok(SourceRange::from_bounds(start, end))
}

fn load_config(cli: &Cli) -> Result<HighlightConfig, Box<dyn std::error::Error>> {
    if cli.disabled_by_default {
        return Ok(HighlightConfig::new(false));
    }
    let config = match &cli.project {
        Some(project) => HighlightConfig::from_project_file(project)?,
        None => HighlightConfig::load_for_source(&cli.file)?,
    };
    Ok(config)
}

fn color_of(category: SqlTokenCategory) -> Color {
    match category {
        SqlTokenCategory::Comment => Color::DarkGreen,
        SqlTokenCategory::Identifier => Color::Cyan,
        SqlTokenCategory::Keyword => Color::Blue,
        SqlTokenCategory::Number => Color::Green,
        SqlTokenCategory::Operator => Color::Grey,
        SqlTokenCategory::Parameter => Color::Magenta,
        SqlTokenCategory::String => Color::DarkYellow,
        SqlTokenCategory::SystemFunction => Color::Yellow,
        SqlTokenCategory::None => Color::Reset,
    }
}

/// Echo `snapshot` with every tag colored by category.
fn write_colored(
    out: &mut impl Write,
    snapshot: &TextSnapshot,
    tags: &[SqlTag],
) -> io::Result<()> {
    let mut pos = 0;
    for tag in tags {
        if tag.range.start < pos {
            continue;
        }
        let gap = SourceRange::from_bounds(pos, tag.range.start);
        queue!(out, Print(snapshot.text(gap)))?;
        queue!(out, SetForegroundColor(color_of(tag.category)))?;
        if tag.is_escape {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        queue!(
            out,
            Print(snapshot.text(tag.range)),
            SetAttribute(Attribute::Reset),
            ResetColor
        )?;
        pos = tag.range.end();
    }
    let rest = SourceRange::from_bounds(pos, snapshot.len());
    queue!(out, Print(snapshot.text(rest)))?;
    out.flush()
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&cli.file)
        .map_err(|err| format!("error reading '{}': {err}", cli.file.display()))?;
    let config = load_config(cli)?;
    log::info!(
        "{}: enabled_by_default = {}",
        display_name(&cli.file),
        config.enabled_by_default
    );

    let snapshot = TextSnapshot::new(&source);
    let host_tags = strpsql_csharp::classify(&snapshot);
    let tagger = StringSqlTagger::new(PostgresLexer::new()).with_config(config);
    let request = cli.range.unwrap_or(snapshot.full_range());
    let report = tagger.tags_with_report(&snapshot, &host_tags, request);

    for (range, err) in &report.skipped {
        log::warn!("skipped literal at {range}: {err}");
    }
    for (range, err) in &report.recovered {
        log::info!("literal at {range} highlighted in part: {err}");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        let tags: Vec<JsonTag> = report.tags.iter().map(JsonTag::from).collect();
        serde_json::to_writer_pretty(&mut out, &tags)?;
        writeln!(out)?;
    } else {
        write_colored(&mut out, &snapshot, &report.tags)?;
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("strpsql: {err}");
        std::process::exit(1);
    }
}
