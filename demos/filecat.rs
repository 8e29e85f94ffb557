use std::path::PathBuf;

use optline::{CommandLine, CommandModel, ParameterSpec, Sink, Value, ValueType};

#[derive(Debug, Default)]
struct Flags {
    number: bool,
    squeeze: bool,
    show_ends: bool,
    files: Vec<PathBuf>,
}

struct FlagsSink<'a>(&'a mut Flags);

impl Sink for FlagsSink<'_> {
    fn set(&mut self, spec: &ParameterSpec, value: Value) {
        let flag = *value.downcast::<bool>().unwrap();
        match spec.field() {
            "number" => self.0.number = flag,
            "squeeze" => self.0.squeeze = flag,
            "showEnds" => self.0.show_ends = flag,
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

fn main() {
    let model = CommandModel::builder("filecat")
        .summary("Concatenate FILE(s), or standard input, to standard output.")
        .footer("A demonstration program; it does not actually read anything.")
        .add(
            ParameterSpec::option("number", &["-n", "--number"], ValueType::scalar::<bool>())
                .about("number all output lines"),
        )
        .add(
            ParameterSpec::option(
                "squeeze",
                &["-s", "--squeeze-blank"],
                ValueType::scalar::<bool>(),
            )
            .about("suppress repeated empty output lines"),
        )
        .add(
            ParameterSpec::option("showEnds", &["-E", "--show-ends"], ValueType::scalar::<bool>())
                .about("display $ at end of each line"),
        )
        .add(
            ParameterSpec::option("help", &["--help"], ValueType::scalar::<bool>())
                .help()
                .about("display this help and exit"),
        )
        .add(
            ParameterSpec::positional("files", ValueType::list::<PathBuf>())
                .label("FILE")
                .about("Files whose contents to display"),
        )
        .build()
        .expect("the filecat model is well formed");
    let command_line = CommandLine::new(model);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let tokens: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

    let mut flags = Flags::default();
    match command_line.parse(&tokens, &mut FlagsSink(&mut flags)) {
        Ok(outcome) if outcome.help_requested => command_line.print_usage(),
        Ok(_) => println!("{flags:?}"),
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}
