use std::path::PathBuf;

use optline::{CommandLine, CommandModel, ParameterSpec, Sink, Value, ValueType};

#[derive(Debug, Default)]
struct Compact {
    verbose: bool,
    recursive: bool,
    out: Option<PathBuf>,
    files: Vec<PathBuf>,
}

struct CompactSink<'a>(&'a mut Compact);

impl Sink for CompactSink<'_> {
    fn set(&mut self, spec: &ParameterSpec, value: Value) {
        match spec.field() {
            "verbose" => self.0.verbose = *value.downcast::<bool>().unwrap(),
            "recursive" => self.0.recursive = *value.downcast::<bool>().unwrap(),
            "out" => self.0.out = Some(*value.downcast::<PathBuf>().unwrap()),
            "help" => {}
            other => unreachable!("unknown field {other}"),
        }
    }

    fn push(&mut self, spec: &ParameterSpec, value: Value) {
        match spec.field() {
            "files" => self.0.files.push(*value.downcast::<PathBuf>().unwrap()),
            other => unreachable!("unknown field {other}"),
        }
    }
}

// Try: compact -rvoout a.txt b.txt
//      compact -oout -- -r -v
//      compact --help
fn main() {
    let model = CommandModel::builder("compact")
        .detailed_usage(true)
        .add(
            ParameterSpec::option("verbose", &["-v"], ValueType::scalar::<bool>())
                .about("say more while working"),
        )
        .add(
            ParameterSpec::option("recursive", &["-r"], ValueType::scalar::<bool>())
                .about("descend into directories"),
        )
        .add(
            ParameterSpec::option("out", &["-o"], ValueType::scalar::<PathBuf>())
                .about("write the result here"),
        )
        .add(
            ParameterSpec::option("help", &["-h", "--help"], ValueType::scalar::<bool>())
                .help()
                .about("show this help message and exit"),
        )
        .add(
            ParameterSpec::positional("files", ValueType::list::<PathBuf>())
                .label("FILE")
                .about("the files to process"),
        )
        .build()
        .expect("the compact model is well formed");
    let command_line = CommandLine::new(model);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let tokens: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

    let mut compact = Compact::default();
    match command_line.parse(&tokens, &mut CompactSink(&mut compact)) {
        Ok(outcome) if outcome.help_requested => command_line.print_usage(),
        Ok(_) => println!("{compact:?}"),
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}
