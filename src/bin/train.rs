use clap::Parser;
use fs_err::File;
use std::{io::BufWriter, path::PathBuf};
use traducir::compile::compile;

/// Trains the tagger and writes all component binaries.
#[derive(Parser)]
#[clap(
    version = "1.0",
    author = "Benjamin Minixhofer <bminixhofer@gmail.com>"
)]
struct Opts {
    /// Directory with `corpus.tsv`, `dictionary.tsv` and optional overrides.
    #[clap(long, short)]
    build_dir: PathBuf,
    /// Directory to write `tagger.bin`, `chunker.bin`, `transfer.bin` and `dictionary.bin` to.
    #[clap(long, short)]
    out_dir: PathBuf,
}

fn main() -> Result<(), traducir::Error> {
    env_logger::init();
    let opts = Opts::parse();

    fs_err::create_dir_all(&opts.out_dir)?;
    let dest = |name: &str| -> Result<BufWriter<File>, traducir::Error> {
        Ok(BufWriter::new(File::create(
            opts.out_dir.join(format!("{}.bin", name)),
        )?))
    };

    compile(
        &opts.build_dir,
        dest("tagger")?,
        dest("chunker")?,
        dest("transfer")?,
        dest("dictionary")?,
    )
}
