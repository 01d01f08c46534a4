//! glint-driver - thin CLI wiring for the front-end pipeline.
//!
//! ============================================================================
//! SCOPE
//! ============================================================================
//!
//! The hard engineering lives in glint-sem (name resolution, type
//! inference, constant folding, generic instantiation). This crate is
//! the thin binary that wires glint-lex -> glint-par -> glint-sem
//! together for manual testing: it is not a production compiler front
//! door, and there is no code generator or linker anywhere in this
//! workspace, see DESIGN.md.
//!
//! ```text
//! source text -> [glint-lex] -> tokens -> [glint-par] -> AST
//!             -> [glint-sem] -> resolved declarations + diagnostics
//! ```
//!
//! USAGE:
//!
//! ```text
//! glintc main.glint                 # analyze a file, print diagnostics
//! glintc --emit tokens main.glint   # print the token stream
//! glintc --emit ast main.glint      # print the parsed AST
//! glintc --emit hir main.glint      # print resolved declarations (default)
//! glintc --verbose main.glint       # trace phase boundaries on stderr
//! glintc -Werror main.glint         # treat warnings as errors
//! glintc                            # no files given: analyzes a demo program
//! ```
//!
//! Exit codes: 0 on success, 1 if any diagnostic at error level was
//! reported (or a warning was, under `-Werror`).

use std::path::PathBuf;

use glint_sem::{Declaration, SemanticAnalyzer};
use glint_util::{DefId, DefIdGenerator, FileId, FxHashMap, Handler, SourceMap};

/// A small embedded program analyzed when no input files are given, so
/// the binary demonstrates the pipeline without requiring a fixture on
/// disk.
const DEMO_PROGRAM: &str = "fn main() {\n    let total = 1 + 2;\n    out(total);\n}\n";

/// Compiler configuration, populated from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Input source files. Empty means "analyze the embedded demo".
    pub input_files: Vec<PathBuf>,
    /// Which stage's output to print.
    pub emit: EmitType,
    /// Trace phase boundaries to stderr.
    pub verbose: bool,
    /// Treat warnings as errors.
    pub warnings_as_errors: bool,
}

/// What stage's output `glintc` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitType {
    /// Lexer output.
    Tokens,
    /// Parser output.
    Ast,
    /// Resolved declarations from the semantic analyzer.
    #[default]
    Hir,
}

/// Stands in for the package-import collaborator (component C3 in the
/// analyzer's design). This driver only ever analyzes the files it
/// loads directly and never resolves an `import`, so the stub never
/// does real work; it documents the wiring point a multi-package
/// driver would fill in.
pub struct ImporterStub;

impl ImporterStub {
    /// Mirrors the contract the analyzer would call against a real
    /// importer: resolve an import path to parsed ASTs plus diagnostics.
    pub fn import_package(&self, _path: &str) -> (Vec<glint_par::Ast>, Vec<String>) {
        (Vec::new(), Vec::new())
    }
}

/// One invocation's worth of state: configuration, loaded sources, and
/// the diagnostic handler every phase reports into.
pub struct Session {
    pub config: Config,
    pub sources: SourceMap,
    pub diagnostics: Handler,
    def_ids: DefIdGenerator,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: SourceMap::new(),
            diagnostics: Handler::new(),
            def_ids: DefIdGenerator::new(),
        }
    }

    /// Runs the pipeline over the configured sources (or the embedded
    /// demo, if none were given) up through the stage named by
    /// `config.emit`.
    pub fn compile(&mut self) -> Result<CompilationResults, CompileError> {
        if self.config.verbose {
            eprintln!("configuration: {:?}", self.config);
        }

        self.read_sources()?;

        if self.sources.file_count() == 0 {
            self.sources.add_file("<demo>", DEMO_PROGRAM);
        }

        let _importer = ImporterStub;
        let results = self.run_pipeline();

        if self.diagnostics.has_errors()
            || (self.config.warnings_as_errors && self.diagnostics.warning_count() > 0)
        {
            return Err(CompileError::CompilationFailed);
        }

        Ok(results)
    }

    fn read_sources(&mut self) -> Result<(), CompileError> {
        for path in self.config.input_files.clone() {
            if self.config.verbose {
                eprintln!("reading: {}", path.display());
            }

            let content = std::fs::read_to_string(&path)
                .map_err(|e| CompileError::Io(path.clone(), e))?;

            self.sources.add_file(path.display().to_string(), content);
        }

        Ok(())
    }

    fn run_pipeline(&mut self) -> CompilationResults {
        use glint_lex::Lexer;
        use glint_par::Parser;

        let mut tokens_out = Vec::new();
        let mut asts = Vec::new();

        let file_ids: Vec<FileId> = (0..self.sources.file_count()).map(FileId::new).collect();

        for file_id in file_ids {
            let source = self.sources.get(file_id).expect("file just enumerated");

            if self.config.verbose {
                eprintln!("lexing {}", source.name());
            }

            let mut lexer = Lexer::new(source.content(), &mut self.diagnostics);
            let tokens: Vec<_> = std::iter::from_fn(|| Some(lexer.next_token()))
                .take_while(|t| *t != glint_lex::Token::Eof)
                .collect();

            if self.config.emit == EmitType::Tokens {
                tokens_out.push((file_id, tokens));
                continue;
            }

            if self.config.verbose {
                eprintln!("parsing {}", source.name());
            }

            let mut parser = Parser::new(tokens, &mut self.diagnostics);
            let ast = parser.parse();
            asts.push((file_id, ast));
        }

        if self.config.emit == EmitType::Tokens {
            return CompilationResults {
                tokens: tokens_out,
                asts: Vec::new(),
                declarations: Vec::new(),
            };
        }

        if self.config.emit == EmitType::Ast {
            return CompilationResults {
                tokens: Vec::new(),
                asts,
                declarations: Vec::new(),
            };
        }

        if self.config.verbose {
            eprintln!("analyzing");
        }

        let mut declarations = Vec::new();
        for (file_id, ast) in &asts {
            let mut analyzer = SemanticAnalyzer::new(&self.def_ids, &mut self.diagnostics);
            analyzer.collect_declarations(ast);
            for item in ast {
                if let glint_par::Item::Fn(f) = item {
                    analyzer.analyze_fn_item(f);
                }
            }
            declarations.push((*file_id, analyzer.symbols.declarations));
        }

        if self.config.verbose {
            eprintln!("analysis complete");
        }

        CompilationResults {
            tokens: Vec::new(),
            asts: Vec::new(),
            declarations,
        }
    }
}

/// Output of `Session::compile`, holding only the stage(s) that were
/// actually run.
pub struct CompilationResults {
    pub tokens: Vec<(FileId, Vec<glint_lex::Token>)>,
    pub asts: Vec<(FileId, glint_par::Ast)>,
    pub declarations: Vec<(FileId, FxHashMap<DefId, Declaration>)>,
}

/// Compile error, surfaced to `main` as `anyhow::Result` (§7a).
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("io error for {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("compilation failed")]
    CompilationFailed,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Config, CompileError> {
    let mut config = Config::default();
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" | "-v" => config.verbose = true,
            "-Werror" | "--warnings-as-errors" => config.warnings_as_errors = true,
            "--emit" => {
                let value = args
                    .next()
                    .ok_or_else(|| CompileError::InvalidArguments("--emit requires a value".into()))?;
                config.emit = match value.as_str() {
                    "tokens" => EmitType::Tokens,
                    "ast" => EmitType::Ast,
                    "hir" => EmitType::Hir,
                    other => {
                        return Err(CompileError::InvalidArguments(format!(
                            "unknown --emit kind: {other}"
                        )))
                    }
                };
            }
            other => config.input_files.push(PathBuf::from(other)),
        }
    }

    Ok(config)
}

fn print_diagnostics(sources: &SourceMap, handler: &Handler) {
    let mut diags = handler.diagnostics();
    diags.sort_by_key(|d| (d.span.file_id, d.span.start));

    for diag in &diags {
        match sources.format_span(diag.span) {
            Some(location) => eprintln!("{}: {}\n{}", diag.level, diag.message, location),
            None => eprintln!("{}: {}", diag.level, diag.message),
        }
    }
}

fn emit_output(config: &Config, results: &CompilationResults) {
    match config.emit {
        EmitType::Tokens => {
            for (_, tokens) in &results.tokens {
                println!("{:?}", tokens);
            }
        }
        EmitType::Ast => {
            for (_, ast) in &results.asts {
                println!("{:#?}", ast);
            }
        }
        EmitType::Hir => {
            for (_, decls) in &results.declarations {
                for decl in decls.values() {
                    println!("{:#?}", decl);
                }
            }
        }
    }
}

/// Entry point invoked by `src/main.rs`.
pub fn main() -> anyhow::Result<()> {
    let config = parse_args(std::env::args().skip(1))?;
    let mut session = Session::new(config);

    let result = session.compile();
    print_diagnostics(&session.sources, &session.diagnostics);

    match result {
        Ok(results) => {
            emit_output(&session.config, &results);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
