//! slc-drv - Driver for the Slate toolchain.
//!
//! ============================================================================
//! PIPELINE
//! ============================================================================
//!
//! ```text
//! Source file (.sl)
//!        |
//!        v
//!   [Scanner]  ->  lexical tokens          (slc-lex)
//!        |
//!        v
//!   [Parser]   ->  instruction list        (slc-par)
//!        |         + symbol table
//!        v
//!   [Checker]  ->  verified stack effects  (slc-sem)
//!        |
//!        v
//!   [Engine]   ->  interpretation          (slc-int)
//! ```
//!
//! The driver owns the [`SourceMap`] for the whole compilation, runs the
//! front end, and renders the single fatal diagnostic when any phase fails.
//! Exit codes: the program's own exit code on success, 1 on any toolchain
//! error.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use slc_int::Interpreter;
use slc_par::Program;
use slc_util::{diagnostic, LangError, LangResult, SourceInfo, SourceMap};

/// Driver configuration, straight from the command line
#[derive(Debug, Clone)]
pub struct Config {
    /// Main source file
    pub file: PathBuf,
    /// Extra include search directories (appended to the default list)
    pub include_dirs: Vec<PathBuf>,
    /// Program arguments for `argc`/`argv`
    pub args: Vec<String>,
}

/// One compilation: configuration plus every loaded source file
pub struct Session {
    pub config: Config,
    pub sources: SourceMap,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: SourceMap::new(),
        }
    }

    /// The ordered include search list: the source file's directory, the
    /// working directory, the user library, then any `-I` directories
    fn include_search_list(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        match self.config.file.parent() {
            Some(parent) if parent.as_os_str().is_empty() => dirs.push(PathBuf::from(".")),
            Some(parent) => dirs.push(parent.to_path_buf()),
            None => {}
        }
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd);
        }
        if let Some(home) = dirs::home_dir() {
            dirs.push(home.join(".slate").join("lib"));
        }
        dirs.extend(self.config.include_dirs.iter().cloned());
        dirs
    }

    /// Lex, parse and type check the main file
    pub fn front_end(&mut self) -> LangResult<Program> {
        let path = self.config.file.clone();
        let content = std::fs::read_to_string(&path).map_err(|err| {
            LangError::file_error(
                SourceInfo::dummy(),
                format!("could not read `{}`: {err}", path.display()),
            )
        })?;
        let file_id = self.sources.add_file(path.display().to_string(), content);
        let program = Program::parse(file_id, path, self.include_search_list(), &mut self.sources)?;
        slc_sem::check(&program)?;
        debug!("front end passed");
        Ok(program)
    }

    /// Type check only; returns the process exit code
    pub fn check(&mut self) -> i32 {
        match self.front_end() {
            Ok(_) => 0,
            Err(err) => self.report(&err),
        }
    }

    /// Type check, then interpret; returns the process exit code
    pub fn run(&mut self) -> i32 {
        let program = match self.front_end() {
            Ok(program) => program,
            Err(err) => return self.report(&err),
        };

        let stdout = io::stdout().lock();
        let mut engine = Interpreter::new(stdout);
        let mut argv = vec![self.config.file.display().to_string()];
        argv.extend(self.config.args.iter().cloned());
        engine.set_args(argv);

        match program.run(&mut engine) {
            Ok(code) => code as i32,
            Err(err) => self.report(&err),
        }
    }

    /// Render the fatal diagnostic to stderr; always returns 1
    fn report(&self, err: &LangError) -> i32 {
        let rendered = diagnostic::render(err, &self.sources);
        let _ = io::stderr().write_all(rendered.as_bytes());
        1
    }
}
