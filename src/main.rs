//! xenolexia - read ebooks and sprinkle in foreign words

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use xenolexia::{
    BookParser, Chapter, ContentMode, DictionaryTranslator, EngineConfig, Language, LanguagePair,
    ParserConfig, PdfLayout, ProficiencyLevel, Segment, TocItem, TranslationEngine,
};

#[derive(Parser)]
#[command(name = "xenolexia")]
#[command(version, about = "Ebook text extraction and foreign-word substitution", long_about = None)]
#[command(after_help = "EXAMPLES:
    xenolexia info book.epub                  Show metadata and counts
    xenolexia toc book.fb2                    Print the table of contents
    xenolexia chapter book.epub 3             Print chapter 3 (zero-based)
    xenolexia process book.epub 0 --dict en-es.tsv --from en --to es --density 0.2")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Keep source markup in EPUB/MOBI chapter content
    #[arg(long, global = true)]
    keep_markup: bool,

    /// One chapter per PDF page
    #[arg(long, global = true)]
    pdf_pages: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Show book metadata and chapter counts
    Info { file: PathBuf },

    /// Print the table of contents
    Toc { file: PathBuf },

    /// Print one chapter's text
    Chapter {
        file: PathBuf,
        #[arg(allow_negative_numbers = true)]
        index: isize,
    },

    /// Replace words of one chapter with translations from a word list
    Process {
        file: PathBuf,
        #[arg(allow_negative_numbers = true)]
        index: isize,

        /// Tab-separated word list: source<TAB>target
        #[arg(long, value_name = "TSV")]
        dict: PathBuf,

        /// Language of the book
        #[arg(long)]
        from: Language,

        /// Language to substitute in
        #[arg(long)]
        to: Language,

        /// Fraction of words to replace (clamped to 0.05..=0.5)
        #[arg(long, default_value_t = 0.1)]
        density: f64,

        #[arg(long, default_value = "beginner")]
        proficiency: ProficiencyLevel,

        /// Seed for a reproducible selection
        #[arg(long)]
        seed: Option<u64>,

        /// Keep the original capitalization
        #[arg(long)]
        match_case: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut config = ParserConfig::default();
    if cli.keep_markup {
        config = config.with_content_mode(ContentMode::Markup);
    }
    if cli.pdf_pages {
        config = config.with_pdf_layout(PdfLayout::PagePerChapter);
    }
    let parser = BookParser::with_config(config);

    match &cli.command {
        Command::Info { file } => show_info(&parser, file, cli.json),
        Command::Toc { file } => show_toc(&parser, file, cli.json),
        Command::Chapter { file, index } => {
            let chapter = parser.get_chapter(file, *index).map_err(|e| e.to_string())?;
            if cli.json {
                print_json(&chapter)
            } else {
                print_chapter(&chapter);
                Ok(())
            }
        }
        Command::Process {
            file,
            index,
            dict,
            from,
            to,
            density,
            proficiency,
            seed,
            match_case,
        } => {
            let chapter = parser.get_chapter(file, *index).map_err(|e| e.to_string())?;
            let pair = LanguagePair::new(*from, *to);

            let mut dictionary = DictionaryTranslator::new();
            dictionary
                .load_tsv_file(pair, dict)
                .map_err(|e| e.to_string())?;

            let mut engine_config = EngineConfig::default().with_match_case(*match_case);
            if let Some(seed) = seed {
                engine_config = engine_config.with_seed(*seed);
            }
            let engine = TranslationEngine::with_config(Arc::new(dictionary), engine_config);
            let processed = engine.process_chapter(&chapter, pair, *proficiency, *density);

            if cli.json {
                return print_json(&processed);
            }
            println!("# {} ({pair})", processed.chapter.title);
            println!();
            let mut text = String::with_capacity(processed.processed_content.len());
            for segment in processed.segments() {
                match segment {
                    Segment::Text(s) => text.push_str(s),
                    Segment::Foreign(word) => {
                        text.push('[');
                        text.push_str(&word.foreign_word);
                        text.push(']');
                    }
                }
            }
            println!("{text}");
            println!();
            println!("{} words replaced", processed.foreign_words.len());
            Ok(())
        }
    }
}

fn show_info(parser: &BookParser, file: &Path, json: bool) -> Result<(), String> {
    let book = parser.parse_book(file).map_err(|e| e.to_string())?;

    if json {
        #[derive(Serialize)]
        struct Info<'a> {
            metadata: &'a xenolexia::BookMetadata,
            chapters: usize,
            toc_entries: usize,
            total_word_count: usize,
        }
        return print_json(&Info {
            metadata: &book.metadata,
            chapters: book.chapters.len(),
            toc_entries: book.toc_entries().count(),
            total_word_count: book.total_word_count,
        });
    }

    let meta = &book.metadata;
    println!("File: {}", file.display());
    println!("Title: {}", meta.title);
    if let Some(ref author) = meta.author {
        println!("Author: {author}");
    }
    if let Some(ref language) = meta.language {
        println!("Language: {language}");
    }
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    if let Some(ref date) = meta.publish_date {
        println!("Published: {date}");
    }
    if let Some(ref isbn) = meta.isbn {
        println!("ISBN: {isbn}");
    }
    if !meta.subjects.is_empty() {
        println!("Subjects: {}", meta.subjects.join(", "));
    }
    if let Some(ref desc) = meta.description {
        let desc = desc.trim();
        match desc.char_indices().nth(200) {
            Some((cut, _)) => println!("Description: {}...", &desc[..cut]),
            None => println!("Description: {desc}"),
        }
    }
    println!("Chapters: {}", book.chapters.len());
    println!("TOC entries: {}", book.toc_entries().count());
    println!("Words: {}", book.total_word_count);

    Ok(())
}

fn show_toc(parser: &BookParser, file: &Path, json: bool) -> Result<(), String> {
    let toc = parser
        .get_table_of_contents(file)
        .map_err(|e| e.to_string())?;
    if json {
        return print_json(&toc);
    }
    if toc.is_empty() {
        println!("(no table of contents)");
    }
    for item in toc.iter().flat_map(TocItem::iter) {
        let target = match item.chapter_index {
            Some(index) => format!("chapter {index}"),
            None => item.href.clone(),
        };
        println!("{}{} -> {target}", "  ".repeat(item.level), item.title);
    }
    Ok(())
}

fn print_chapter(chapter: &Chapter) {
    println!("# {} ({} words)", chapter.title, chapter.word_count);
    println!();
    println!("{}", chapter.content);
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
