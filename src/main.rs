use std::{
    env,
    fs::read_to_string,
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
    time::Instant,
};

use sema::{
    errors::errors::Diagnostic,
    render_diagnostic,
    semantic::{
        compilation::{Compilation, CompilationOptions},
        symbols::assembly::Assembly,
    },
};
use tracing_subscriber::EnvFilter;

struct Arguments {
    file: PathBuf,
    max_rounds: Option<usize>,
    dependencies: Vec<PathBuf>,
}

fn parse_arguments(mut args: impl Iterator<Item = String>) -> Result<Arguments, String> {
    let mut file = None;
    let mut max_rounds = None;
    let mut dependencies = vec![];

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--max-rounds" => {
                let value = args.next().ok_or("--max-rounds expects a number")?;
                let rounds = value
                    .parse()
                    .map_err(|_| format!("invalid round count `{}`", value))?;
                max_rounds = Some(rounds);
            }
            "--dep" => {
                let path = args.next().ok_or("--dep expects a path")?;
                dependencies.push(PathBuf::from(path));
            }
            _ if file.is_none() => file = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument `{}`", arg)),
        }
    }

    Ok(Arguments {
        file: file.ok_or("usage: sema <file> [--max-rounds N] [--dep path]...")?,
        max_rounds,
        dependencies,
    })
}

enum Failure {
    /// User-facing problems were reported.
    Diagnostics,
    Internal,
    Io,
}

fn report(diagnostics: &[Diagnostic], source: &str) {
    for diagnostic in diagnostics {
        println!("{}", render_diagnostic(diagnostic, source));
    }
}

fn compile_file(
    path: &Path,
    max_rounds: Option<usize>,
    dependencies: &[Rc<Assembly>],
) -> Result<Compilation, Failure> {
    let source = read_to_string(path).map_err(|error| {
        eprintln!("failed to read {}: {}", path.display(), error);
        Failure::Io
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let assembly_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    let mut options = CompilationOptions::default().with_assembly_name(assembly_name);
    if let Some(rounds) = max_rounds {
        options = options.with_max_fixpoint_rounds(rounds);
    }
    for dependency in dependencies {
        options = options.with_dependency(Rc::clone(dependency));
    }

    let start = Instant::now();
    let mut compilation = Compilation::from_source(&source, &file_name, options).map_err(|error| {
        report(&[error], &source);
        Failure::Diagnostics
    })?;

    let valid = compilation.analyze().map_err(|error| {
        eprintln!("{}", error);
        eprintln!("-> {}", path.display());
        Failure::Internal
    })?;
    tracing::info!(file = %file_name, elapsed = ?start.elapsed(), valid, "analyzed");

    report(compilation.diagnostics().as_slice(), &source);
    if !valid {
        return Err(Failure::Diagnostics);
    }
    Ok(compilation)
}

fn run(arguments: Arguments) -> Result<(), Failure> {
    let mut assemblies: Vec<Rc<Assembly>> = vec![];

    for path in &arguments.dependencies {
        let compilation = compile_file(path, arguments.max_rounds, &assemblies)?;
        let assembly = compilation.into_assembly().ok_or(Failure::Diagnostics)?;
        assemblies.push(Rc::new(assembly));
    }

    let compilation = compile_file(&arguments.file, arguments.max_rounds, &assemblies)?;
    println!(
        "{}: ok ({} fixpoint rounds, {} symbols)",
        arguments.file.display(),
        compilation.fixpoint_rounds(),
        compilation.symbol_table().symbols().count()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let arguments = match parse_arguments(env::args().skip(1)) {
        Ok(arguments) => arguments,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    match run(arguments) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Diagnostics) => ExitCode::from(1),
        Err(Failure::Io) => ExitCode::from(2),
        Err(Failure::Internal) => ExitCode::from(101),
    }
}
