use clap::Parser;
use std::{
    io::{self, BufRead},
    path::PathBuf,
};
use traducir::{
    components::{
        chunker::Chunker, dictionary::Dictionary, tagger::Tagger, transfer::SyntacticTransfer,
        Component,
    },
    lang::es,
    Translator,
};

/// Translates Spanish text to English. Reads lines from stdin if no text is given.
#[derive(Parser)]
#[clap(
    version = "1.0",
    author = "Benjamin Minixhofer <bminixhofer@gmail.com>"
)]
struct Opts {
    text: Option<String>,
    #[clap(long, short)]
    tagger: PathBuf,
    #[clap(long, short)]
    dictionary: PathBuf,
    /// Uses the bundled Spanish grammar if not set.
    #[clap(long)]
    chunker: Option<PathBuf>,
    /// Uses the bundled Spanish transfer rules if not set.
    #[clap(long)]
    transfer: Option<PathBuf>,
    /// Prints the source and transferred trees.
    #[clap(long)]
    trees: bool,
}

fn print(translator: &Translator, text: &str, trees: bool) -> Result<(), traducir::Error> {
    for translation in translator.translate(text)? {
        if trees {
            println!("{}", translation.source());
            println!("{}", translation.tree());
        }
        println!("{}", translation.text());
    }

    Ok(())
}

fn main() -> Result<(), traducir::Error> {
    env_logger::init();
    let opts = Opts::parse();

    let chunker = match &opts.chunker {
        Some(path) => <Chunker as Component>::new(path)?,
        None => es::chunker(),
    };
    let transfer = match &opts.transfer {
        Some(path) => <SyntacticTransfer as Component>::new(path)?,
        None => es::syntactic_transfer(),
    };

    let translator = Translator::new(
        <Tagger as Component>::new(&opts.tagger)?,
        chunker,
        transfer,
        <Dictionary as Component>::new(&opts.dictionary)?,
    );

    match &opts.text {
        Some(text) => print(&translator, text, opts.trees)?,
        None => {
            for line in io::stdin().lock().lines() {
                print(&translator, &line?, opts.trees)?;
            }
        }
    }

    Ok(())
}
