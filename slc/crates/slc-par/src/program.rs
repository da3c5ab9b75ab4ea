//! The parser: lexical tokens -> linear instruction list.
//!
//! ============================================================================
//! PIPELINE
//! ============================================================================
//!
//! ```text
//! TokenStream -> match/expand -> instruction list -> flow resolver
//!                     ^                                   |
//!                     |          include / macro          |
//!                     +----------- expansion -------------+
//! ```
//!
//! Three cooperating stages run per token, in order:
//!
//! 1. **match/expand** ([`Parser::match_token`]): a lexical token becomes
//!    zero or more resolved instruction tokens. Keywords and operators come
//!    from the closed tables, words are resolved against the symbol table
//!    (macro bodies are deep-copied in at this point), everything else stays
//!    an unresolved `Word` for the type checker to diagnose.
//! 2. **flow resolution** ([`Parser::flow_transition`]): block openers and
//!    closers are balanced on a stack and linked through instruction-list
//!    indices (`root`/`prev`/`next`/`end`).
//! 3. **include expansion** ([`Parser::expand_include`]): an `include`
//!    followed by a string literal removes both tokens again and extends the
//!    token stream with the included file.
//!
//! When a `macro`, `memory` or `proc` header region closes, the region is
//! collapsed into a symbol-table entry and spliced out of the list; splices
//! renumber positions and patch every flow index so `list[t.position] == t`
//! holds at all times.

use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::debug;

use slc_lex::{parse_int, LexKind, LexToken, Scanner, TokenStream};
use slc_util::{
    FileId, FxHashSet, Idx, IndexVec, LangError, LangResult, SourceInfo, SourceMap, Symbol,
};

use crate::engine::{Engine, Step};
use crate::op::Op;
use crate::symbols::{procedure_factory, MacroDef, MemoryDef, Procedure, SymbolDef};
use crate::tables::{keyword, operator};
use crate::token::{Binding, FlowInfo, InsnIdx, Token};
use crate::types::TypeDesc;

/// A fully parsed program: the instruction list plus its symbol table
#[derive(Debug)]
pub struct Program {
    /// Densely indexed instruction sequence; owns every token
    pub instructions: IndexVec<InsnIdx, Token>,
    /// Macros, procedures and memory regions, one namespace
    pub symbols: IndexMap<Symbol, SymbolDef>,
    /// Path of the main source file
    pub path: PathBuf,
}

impl Program {
    /// Parse the given file (already loaded into `sources`) into a program.
    ///
    /// `include_dirs` is the ordered include search list; included files are
    /// loaded into `sources` as they are reached.
    pub fn parse(
        file_id: FileId,
        path: PathBuf,
        include_dirs: Vec<PathBuf>,
        sources: &mut SourceMap,
    ) -> LangResult<Program> {
        let scanner = Scanner::new(
            sources
                .file(file_id)
                .expect("main file must be loaded before parsing"),
        );
        let mut included = FxHashSet::default();
        if let Ok(canonical) = path.canonicalize() {
            included.insert(canonical);
        }
        let parser = Parser {
            program: Program {
                instructions: IndexVec::new(),
                symbols: IndexMap::new(),
                path,
            },
            stream: TokenStream::new(scanner),
            sources,
            include_dirs,
            flow_stack: Vec::new(),
            included,
        };
        parser.run()
    }

    /// Look up a procedure by name
    pub fn procedure(&self, name: Symbol) -> Option<&Procedure> {
        match self.symbols.get(&name) {
            Some(SymbolDef::Proc(proc)) => Some(proc),
            _ => None,
        }
    }

    /// Iterate all memory definitions in declaration order
    pub fn memories(&self) -> impl Iterator<Item = &MemoryDef> {
        self.symbols.values().filter_map(|def| match def {
            SymbolDef::Memory(mem) => Some(mem),
            _ => None,
        })
    }

    /// Drive an engine over the instruction list.
    ///
    /// The engine answers each step with a relative jump; `Step::Exit`
    /// terminates with that exit code. Running off the end of the program
    /// without a top-level `exit` is an error.
    pub fn run<E: Engine>(&self, engine: &mut E) -> LangResult<i64> {
        if self.instructions.is_empty() {
            return Err(LangError::invalid_syntax(
                SourceInfo::dummy(),
                "empty program",
            ));
        }
        engine.before(self)?;
        let mut pointer: i64 = 0;
        while pointer >= 0 && (pointer as usize) < self.instructions.len() {
            let idx = InsnIdx::from_usize(pointer as usize);
            match engine.step(self, idx)? {
                Step::Skip(skip) => pointer += skip + 1,
                Step::Exit(code) => {
                    engine.close(self)?;
                    return Ok(code);
                }
            }
        }
        engine.close(self)?;
        if !engine.exited() {
            let last = self
                .instructions
                .last_idx()
                .map(|idx| self.instructions[idx].info.clone())
                .unwrap_or_else(SourceInfo::dummy);
            return Err(LangError::invalid_syntax(
                last,
                "Program was not exited properly",
            ));
        }
        Ok(0)
    }
}

struct Parser<'a> {
    program: Program,
    stream: TokenStream,
    sources: &'a mut SourceMap,
    include_dirs: Vec<PathBuf>,
    /// Indices of currently open flow openers, innermost last
    flow_stack: Vec<InsnIdx>,
    /// Canonical paths already spliced in; keeps include cycles finite
    included: FxHashSet<PathBuf>,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> LangResult<Program> {
        loop {
            let lex = self.stream.next_token()?;
            match lex.kind {
                LexKind::Eof => break,
                LexKind::NewLine => continue,
                _ => {}
            }
            for token in self.match_token(&lex)? {
                let idx = self.push(token);
                self.flow_transition(idx)?;
                self.expand_include()?;
            }
        }

        if let Some(idx) = self.program.instructions.last_idx() {
            if matches!(self.program.instructions[idx].op, Op::Include) {
                return Err(LangError::invalid_syntax(
                    self.program.instructions[idx].info.clone(),
                    "`include` requires a string",
                ));
            }
        }
        if let Some(&open) = self.flow_stack.last() {
            return Err(LangError::invalid_syntax(
                self.program.instructions[open].info.clone(),
                "is missing an `end`",
            ));
        }

        debug_assert!(self
            .program
            .instructions
            .iter_enumerated()
            .all(|(idx, token)| token.position == idx));
        debug!(
            instructions = self.program.instructions.len(),
            symbols = self.program.symbols.len(),
            "parsed {}",
            self.program.path.display()
        );
        Ok(self.program)
    }

    fn push(&mut self, mut token: Token) -> InsnIdx {
        token.position = self.program.instructions.next_idx();
        self.program.instructions.push(token)
    }

    // =========================================================================
    // MATCH / EXPAND
    // =========================================================================

    /// Resolve one lexical token into zero or more instruction tokens
    fn match_token(&mut self, lex: &LexToken) -> LangResult<Vec<Token>> {
        let info = lex.info.clone();
        Ok(match lex.kind {
            LexKind::Number => {
                let value = parse_int(&lex.text).ok_or_else(|| {
                    LangError::unknown_token(info.clone(), "is not a valid number")
                })?;
                vec![Token::new(Op::Push(value), info)]
            }
            LexKind::Char => {
                let c = lex
                    .text
                    .chars()
                    .next()
                    .expect("scanner rejects empty character literals");
                vec![Token::new(Op::Char(c as i64), info)]
            }
            LexKind::Str => vec![Token::new(Op::Str(lex.text.clone()), info)],
            LexKind::Cast => {
                let ty = TypeDesc::parse(&lex.text).ok_or_else(|| {
                    LangError::invalid_type(
                        info.clone(),
                        format!("`{}` is not a recognized type", lex.text),
                    )
                })?;
                vec![Token::new(Op::Cast(ty), info)]
            }
            LexKind::Op => {
                let op = operator(&lex.text).ok_or_else(|| {
                    LangError::unknown_token(info.clone(), "is not a recognized symbol")
                })?;
                vec![Token::new(op, info)]
            }
            LexKind::Word => {
                if let Some(op) = keyword(&lex.text) {
                    vec![Token::new(op, info)]
                } else if TypeDesc::is_base_name(&lex.text) {
                    let ty = TypeDesc::parse(&lex.text).expect("base names always parse");
                    vec![Token::new(Op::Cast(ty), info)]
                } else {
                    self.match_word(lex)
                }
            }
            LexKind::NewLine | LexKind::Eof => unreachable!("filtered by the parse loop"),
        })
    }

    /// Resolve a non-keyword word against the symbol table
    fn match_word(&self, lex: &LexToken) -> Vec<Token> {
        let name = Symbol::intern(&lex.text);
        let info = lex.info.clone();
        match self.program.symbols.get(&name) {
            Some(SymbolDef::Memory(_)) => vec![Token::new(Op::PushMemory(name), info)],
            Some(SymbolDef::Proc(_)) => vec![Token::new(Op::Call(name), info)],
            Some(SymbolDef::Macro(def)) => {
                let mut expansion = Vec::with_capacity(def.body.len() + 1);
                expansion.push(Token::new(Op::Label(name), info.clone()));
                expansion.extend(def.body.iter().map(|tok| tok.expanded_copy(&info)));
                expansion
            }
            None => vec![Token::new(Op::Word(name), info)],
        }
    }

    // =========================================================================
    // INCLUDE EXPANSION
    // =========================================================================

    /// If the last two instructions are `include "path"`, remove them and
    /// extend the token stream with the included file
    fn expand_include(&mut self) -> LangResult<()> {
        let len = self.program.instructions.len();
        if len < 2 {
            return Ok(());
        }
        let prev = InsnIdx::from_usize(len - 2);
        let last = InsnIdx::from_usize(len - 1);
        if !matches!(self.program.instructions[prev].op, Op::Include) {
            return Ok(());
        }
        let site = self.program.instructions[prev].info.clone();
        match &self.program.instructions[last].op {
            Op::Str(path) => {
                let path = path.clone();
                self.splice(len - 2, len);
                self.open_include(&path, site)
            }
            _ => Err(LangError::invalid_syntax(
                self.program.instructions[last].info.clone(),
                "`include` requires a string",
            )),
        }
    }

    /// Open the first match on the include search list
    fn open_include(&mut self, path: &str, site: SourceInfo) -> LangResult<()> {
        for dir in &self.include_dirs {
            let Ok(canonical) = dir.join(path).canonicalize() else {
                continue;
            };
            let Ok(content) = std::fs::read_to_string(&canonical) else {
                continue;
            };
            if !self.included.insert(canonical.clone()) {
                // already part of this compilation
                return Ok(());
            }
            debug!("including {}", canonical.display());
            let file_id = self
                .sources
                .add_file(canonical.display().to_string(), content);
            let file = self.sources.file(file_id).expect("file was just added");
            self.stream.extend(Scanner::with_parent(file, site));
            return Ok(());
        }
        Err(LangError::file_error(site, format!("no file `{path}`")))
    }

    // =========================================================================
    // FLOW RESOLUTION
    // =========================================================================

    fn flow_transition(&mut self, idx: InsnIdx) -> LangResult<()> {
        match self.program.instructions[idx].op {
            Op::If | Op::While | Op::Let | Op::With => {
                self.open_block(idx);
                Ok(())
            }
            Op::Macro => {
                self.reject_nested_definition(idx, "macro")?;
                self.open_block(idx);
                Ok(())
            }
            Op::Proc => {
                self.reject_nested_definition(idx, "proc")?;
                self.open_block(idx);
                Ok(())
            }
            Op::Memory => {
                self.reject_nested_definition(idx, "memory")?;
                self.open_block(idx);
                Ok(())
            }
            Op::Elif => self.link_chain(
                idx,
                &[is_if, is_elif],
                "`elif` must be preceded by `if` or `elif`",
            ),
            Op::Else => self.link_chain(
                idx,
                &[is_if, is_elif],
                "`else` must be preceded by `if` or `elif`",
            ),
            Op::In => self.link_chain(idx, &[is_proc], "`in` must be preceded by `proc`"),
            Op::Out => self.link_chain(
                idx,
                &[is_proc, is_in],
                "`out` must be preceded by `proc` or `in`",
            ),
            Op::Do => self.handle_do(idx),
            Op::End => self.handle_end(idx),
            _ => Ok(()),
        }
    }

    fn open_block(&mut self, idx: InsnIdx) {
        self.program.instructions[idx].flow = Some(Box::new(FlowInfo::rooted(idx)));
        self.flow_stack.push(idx);
    }

    /// `macro`/`proc`/`memory` definitions may not nest
    fn reject_nested_definition(&self, idx: InsnIdx, what: &str) -> LangResult<()> {
        let nested = self.flow_stack.iter().any(|&open| {
            matches!(
                self.program.instructions[open].op,
                Op::Macro | Op::Proc | Op::Memory
            )
        });
        if nested {
            return Err(LangError::invalid_syntax(
                self.program.instructions[idx].info.clone(),
                format!("nested `{what}` definition is not allowed"),
            ));
        }
        Ok(())
    }

    fn in_macro_definition(&self) -> bool {
        self.flow_stack
            .iter()
            .any(|&open| matches!(self.program.instructions[open].op, Op::Macro))
    }

    /// Pop the innermost opener, require it to satisfy `allowed`, and link
    /// `idx` as the next element of its chain
    fn link_chain(
        &mut self,
        idx: InsnIdx,
        allowed: &[fn(&Op) -> bool],
        message: &str,
    ) -> LangResult<()> {
        let Some(top) = self.flow_stack.pop() else {
            return Err(LangError::invalid_syntax(
                self.program.instructions[idx].info.clone(),
                message,
            ));
        };
        if !allowed
            .iter()
            .any(|pred| pred(&self.program.instructions[top].op))
        {
            return Err(LangError::invalid_syntax(
                self.program.instructions[top].info.clone(),
                message,
            ));
        }
        let root = self.program.instructions[top].flow().root;
        self.program.instructions[top].flow_mut().next = Some(idx);
        self.program.instructions[idx].flow = Some(Box::new(FlowInfo::chained(root, top)));
        self.flow_stack.push(idx);
        Ok(())
    }

    fn handle_do(&mut self, idx: InsnIdx) -> LangResult<()> {
        const MESSAGE: &str = "`do` must be preceded by an `if`, `elif`, `while`, `let` or `with`";
        let Some(top) = self.flow_stack.pop() else {
            return Err(LangError::invalid_syntax(
                self.program.instructions[idx].info.clone(),
                MESSAGE,
            ));
        };
        let top_op = &self.program.instructions[top].op;
        if !matches!(top_op, Op::If | Op::Elif | Op::While | Op::Let | Op::With) {
            return Err(LangError::invalid_syntax(
                self.program.instructions[idx].info.clone(),
                MESSAGE,
            ));
        }
        let binder = matches!(top_op, Op::Let | Op::With);
        let root = self.program.instructions[top].flow().root;
        self.program.instructions[idx].flow = Some(Box::new(FlowInfo::chained(root, top)));
        if binder {
            // the binder region `let a b do` ends here
            self.program.instructions[top].flow_mut().next = Some(idx);
        }
        // the opener stays open until its `end`
        self.flow_stack.push(top);
        Ok(())
    }

    fn handle_end(&mut self, idx: InsnIdx) -> LangResult<()> {
        let Some(top) = self.flow_stack.pop() else {
            return Err(LangError::invalid_syntax(
                self.program.instructions[idx].info.clone(),
                "`end` token without block start",
            ));
        };
        let root = self.program.instructions[top].flow().root;
        let mut flow = FlowInfo::chained(root, top);
        flow.end = Some(idx);
        self.program.instructions[idx].flow = Some(Box::new(flow));

        match self.program.instructions[top].op {
            Op::Macro => self.collect_macro(top, idx),
            Op::Proc | Op::In | Op::Out => {
                self.program.instructions[root].flow_mut().end = Some(idx);
                self.collect_proc(root, idx)
            }
            Op::Memory => self.collect_memory(top, idx),
            Op::Let | Op::With => {
                if self.in_macro_definition() {
                    // the region is macro-body text; it is captured raw and
                    // re-resolved at every expansion site
                    return Ok(());
                }
                self.collect_binders(top, idx)
            }
            _ => {
                // if/elif/else/while chain: walk backwards assigning
                // has_else and the shared end
                let mut has_else = false;
                let mut node = Some(idx);
                while let Some(n) = node {
                    if matches!(self.program.instructions[n].op, Op::Else) {
                        has_else = true;
                    }
                    let flow = self.program.instructions[n].flow_mut();
                    flow.has_else = has_else;
                    flow.end = Some(idx);
                    node = flow.prev;
                }
                Ok(())
            }
        }
    }

    // =========================================================================
    // PREPROCESSING CONSTRUCTORS
    // =========================================================================

    /// Validate a `macro`/`memory` region and return (name, body tokens)
    fn collect_definition(
        &self,
        top: InsnIdx,
        end: InsnIdx,
        what: &str,
    ) -> LangResult<(Symbol, SourceInfo, Vec<Token>)> {
        let start = top.index();
        let stop = end.index();
        if stop - start < 2 {
            return Err(LangError::invalid_syntax(
                self.program.instructions[top].info.clone(),
                format!("`{what}` requires a name"),
            ));
        }
        let name_tok = &self.program.instructions[InsnIdx::from_usize(start + 1)];
        let Op::Word(name) = name_tok.op else {
            return Err(LangError::invalid_syntax(
                name_tok.info.clone(),
                format!(
                    "`{what}` name must be a word not `{}`",
                    name_tok.op.spelling()
                ),
            ));
        };
        if let Some(existing) = self.program.symbols.get(&name) {
            return Err(LangError::symbol_redefined(
                name_tok.info.clone(),
                "has already been defined",
            )
            .with_cause(LangError::new(
                slc_util::ErrorKind::Reporting,
                existing.info().clone(),
                "first defined here",
            )));
        }
        let body = self.program.instructions.as_slice()[start + 2..stop].to_vec();
        Ok((name, name_tok.info.clone(), body))
    }

    fn collect_macro(&mut self, top: InsnIdx, end: InsnIdx) -> LangResult<()> {
        let (name, info, body) = self.collect_definition(top, end, "macro")?;
        debug!("macro `{name}` with {} body tokens", body.len());
        self.program
            .symbols
            .insert(name, SymbolDef::Macro(MacroDef { name, info, body }));
        self.splice(top.index(), end.index() + 1);
        Ok(())
    }

    fn collect_memory(&mut self, top: InsnIdx, end: InsnIdx) -> LangResult<()> {
        let (name, info, body) = self.collect_definition(top, end, "memory")?;
        if body.is_empty() {
            return Err(LangError::invalid_syntax(
                self.program.instructions[top].info.clone(),
                "`memory` requires a size expression",
            ));
        }
        self.program
            .symbols
            .insert(name, SymbolDef::Memory(MemoryDef { name, info, body }));
        self.splice(top.index(), end.index() + 1);
        Ok(())
    }

    /// Capture the `let`/`with` name list and splice it out
    fn collect_binders(&mut self, top: InsnIdx, _end: InsnIdx) -> LangResult<()> {
        let spelling = self.program.instructions[top].op.spelling();
        let Some(do_idx) = self.program.instructions[top].flow().next else {
            return Err(LangError::invalid_syntax(
                self.program.instructions[top].info.clone(),
                format!("`{spelling}` requires a `do`"),
            ));
        };
        let start = top.index() + 1;
        let stop = do_idx.index();
        let mut names = Vec::with_capacity(stop - start);
        for tok in &self.program.instructions.as_slice()[start..stop] {
            let Op::Word(name) = tok.op else {
                return Err(LangError::invalid_syntax(
                    tok.info.clone(),
                    format!("`{spelling}` binds words, not `{}`", tok.op.spelling()),
                ));
            };
            names.push(Binding {
                name,
                info: tok.info.clone(),
            });
        }
        if names.is_empty() {
            return Err(LangError::invalid_syntax(
                self.program.instructions[top].info.clone(),
                format!("`{spelling}` requires at least one name"),
            ));
        }
        self.program.instructions[top].flow_mut().names = names;
        self.splice(start, stop);
        Ok(())
    }

    /// Collapse a `proc` header, register the procedure, keep the body inline
    fn collect_proc(&mut self, root: InsnIdx, end: InsnIdx) -> LangResult<()> {
        let root_pos = root.index();
        let Some(in_idx) = self.program.instructions[root].flow().next else {
            return Err(LangError::invalid_syntax(
                self.program.instructions[root].info.clone(),
                "`proc` requires a name",
            ));
        };
        let out_idx = self.program.instructions[in_idx].flow().next;
        let header_end = out_idx.unwrap_or(in_idx);
        let body_start_old = header_end.index() + 1;

        let insns = self.program.instructions.as_slice();
        let args = &insns[root_pos + 1..in_idx.index()];
        let outs = match out_idx {
            Some(out) => &insns[in_idx.index() + 1..out.index()],
            None => &[][..],
        };

        let Some(name_tok) = args.first() else {
            return Err(LangError::invalid_syntax(
                self.program.instructions[root].info.clone(),
                "`proc` requires a name",
            ));
        };
        let name = match name_tok.op {
            Op::Word(name) => name,
            Op::Call(_) => {
                return Err(LangError::symbol_redefined(
                    name_tok.info.clone(),
                    "has already been defined",
                ));
            }
            ref other => {
                return Err(LangError::invalid_syntax(
                    name_tok.info.clone(),
                    format!("`proc` name must be a word not `{}`", other.spelling()),
                ));
            }
        };
        if self.program.symbols.contains_key(&name) {
            return Err(LangError::symbol_redefined(
                name_tok.info.clone(),
                "has already been defined",
            ));
        }

        let args = args[1..].to_vec();
        let outs = outs.to_vec();

        // make direct recursion resolvable without forward declarations
        for i in body_start_old..end.index() {
            let tok = &mut self.program.instructions[InsnIdx::from_usize(i)];
            if matches!(tok.op, Op::Word(w) if w == name) {
                tok.op = Op::Call(name);
            }
        }

        // drop the header (name, args, `in`, outs, `out`); the body shifts
        // down to sit directly after the opener
        let removed = body_start_old - (root_pos + 1);
        self.splice(root_pos + 1, body_start_old);
        let body_start = InsnIdx::from_usize(root_pos + 1);
        let new_end = InsnIdx::from_usize(end.index() - removed);

        // relink opener and `end` across the vanished header
        {
            let mut flow = FlowInfo::rooted(root);
            flow.end = Some(new_end);
            *self.program.instructions[root].flow_mut() = flow;
            let end_flow = self.program.instructions[new_end].flow_mut();
            end_flow.prev = Some(root);
        }

        let proc = procedure_factory(
            &self.program.instructions[root],
            name,
            &args,
            &outs,
            body_start,
            new_end,
        )?;
        debug!(
            "proc `{name}` with {} args, {} outs",
            proc.ins.len(),
            proc.outs.len()
        );
        self.program.symbols.insert(name, SymbolDef::Proc(proc));
        Ok(())
    }

    // =========================================================================
    // SPLICING
    // =========================================================================

    /// Remove `start..stop` from the instruction list, renumbering positions
    /// and shifting every flow index that pointed past the removed region.
    ///
    /// Callers are responsible for any link that pointed *into* the region
    /// (only the `proc` opener/`end` pair needs that, and `collect_proc`
    /// rebuilds both).
    fn splice(&mut self, start: usize, stop: usize) {
        if start == stop {
            return;
        }
        debug_assert!(self.flow_stack.iter().all(|open| open.index() < start));
        let removed = (stop - start) as u32;
        let shift = |idx: InsnIdx| {
            if idx.index() >= stop {
                InsnIdx(idx.0 - removed)
            } else {
                idx
            }
        };
        self.program.instructions.drain(start..stop);
        for i in start..self.program.instructions.len() {
            let tok = &mut self.program.instructions[InsnIdx::from_usize(i)];
            tok.position = InsnIdx::from_usize(i);
            if let Some(flow) = tok.flow.as_deref_mut() {
                flow.root = shift(flow.root);
                flow.prev = flow.prev.map(shift);
                flow.next = flow.next.map(shift);
                flow.end = flow.end.map(shift);
            }
        }
    }
}

fn is_if(op: &Op) -> bool {
    matches!(op, Op::If)
}

fn is_elif(op: &Op) -> bool {
    matches!(op, Op::Elif)
}

fn is_proc(op: &Op) -> bool {
    matches!(op, Op::Proc)
}

fn is_in(op: &Op) -> bool {
    matches!(op, Op::In)
}
