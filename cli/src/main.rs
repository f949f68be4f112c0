use failure::Error;
use multitape::Transducer;
use std::fs;
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "multitape",
    about = "Multi-tape grammar generation from JSON grammar definitions."
)]
enum Opt {
    /// Enumerate every record a grammar describes, one JSON object per line
    #[structopt(name = "generate")]
    Generate {
        /// The file defining the grammar to generate from
        #[structopt(parse(from_os_str), long = "input", short = "i")]
        input_file: PathBuf,

        /// How many times a symbol may recursively re-enter itself
        #[structopt(long = "max-recursion", default_value = "4")]
        max_recursion: usize,

        /// Upper bound on generation steps
        #[structopt(long = "max-chars", default_value = "1000")]
        max_chars: usize,
    },
    /// Validate and compile a grammar without generating anything
    #[structopt(name = "check")]
    Check {
        /// The file defining the grammar to check
        #[structopt(parse(from_os_str), long = "input", short = "i")]
        input_file: PathBuf,
    },
}

fn transducer_from_file(path: &PathBuf) -> Result<Transducer, Error> {
    let contents = fs::read_to_string(path)?;
    Transducer::from_json(&contents)
}

fn run(opt: Opt) -> Result<(), Error> {
    match opt {
        Opt::Generate {
            input_file,
            max_recursion,
            max_chars,
        } => {
            let transducer = transducer_from_file(&input_file)?;
            for record in transducer.generate_with(max_recursion, max_chars)? {
                println!("{}", serde_json::to_string(&record)?);
            }
            Ok(())
        }
        Opt::Check { input_file } => transducer_from_file(&input_file).map(|_| ()),
    }
}

fn main() {
    let opt = Opt::from_args();
    match run(opt) {
        Ok(()) => {}
        Err(error) => {
            eprintln!("{}", error);
            process::exit(1);
        }
    }
}
