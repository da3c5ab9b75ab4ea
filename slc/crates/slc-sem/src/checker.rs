//! The abstract-stack walker.

use indexmap::IndexMap;
use tracing::debug;

use slc_par::{InsnIdx, MemoryDef, Op, Procedure, Program, SymbolDef, Token, TypeDesc};
use slc_util::{ErrorKind, FxHashMap, LangError, LangResult, SourceInfo, Symbol};

/// One abstract stack slot: the originating token's location and its type
#[derive(Clone, Debug)]
pub struct Entry {
    pub info: SourceInfo,
    pub ty: TypeDesc,
}

impl Entry {
    fn new(info: &SourceInfo, ty: TypeDesc) -> Self {
        Self {
            info: info.clone(),
            ty,
        }
    }
}

/// Type check a parsed program.
///
/// Verifies every memory declaration body, then walks the instruction list
/// simulating stack effects. Returns the first violation as a fatal error.
pub fn check(program: &Program) -> LangResult<()> {
    for def in program.memories() {
        Checker::check_memory(program, def)?;
    }
    let mut checker = Checker::new(program);
    for idx in program.instructions.indices() {
        checker.step(&program.instructions[idx])?;
    }
    checker.finish()
}

/// The abstract interpreter state
pub struct Checker<'a> {
    program: &'a Program,
    /// The simulated operand stack
    stack: Vec<Entry>,
    /// Snapshot of `stack` at each unmatched opener, compared at closers
    block_stack: Vec<Vec<Entry>>,
    /// Snapshot of the entry stack at `if`/`while`/`proc`, for branch resets
    block_origin_stack: Vec<Vec<Entry>>,
    /// Scoped name bindings from `let`/`with`/proc arguments
    locals: Vec<FxHashMap<Symbol, Entry>>,
    /// Procedures seen so far, in declaration order
    procedures: IndexMap<Symbol, &'a Procedure>,
    /// Proc opener index -> procedure, for `proc`/`end` handling
    proc_by_opener: FxHashMap<InsnIdx, &'a Procedure>,
}

impl<'a> Checker<'a> {
    pub fn new(program: &'a Program) -> Self {
        let proc_by_opener = program
            .symbols
            .values()
            .filter_map(|def| match def {
                SymbolDef::Proc(proc) => Some((proc.opener, proc)),
                _ => None,
            })
            .collect();
        Self {
            program,
            stack: Vec::new(),
            block_stack: Vec::new(),
            block_origin_stack: Vec::new(),
            locals: Vec::new(),
            procedures: IndexMap::new(),
            proc_by_opener,
        }
    }

    /// Verify a `memory` body: a compile-time expression yielding one `int`
    fn check_memory(program: &Program, def: &MemoryDef) -> LangResult<()> {
        let mut checker = Checker::new(program);
        for token in &def.body {
            if !is_size_expression_op(&token.op) {
                return Err(LangError::invalid_syntax(
                    token.info.clone(),
                    format!(
                        "`{}` is not allowed in a memory size expression",
                        token.op.spelling()
                    ),
                ));
            }
            checker.step(token)?;
        }
        match checker.stack.as_slice() {
            [entry] if entry.ty.matches(&TypeDesc::Int) => Ok(()),
            _ => Err(LangError::invalid_type(
                def.info.clone(),
                "memory size must evaluate to a single `int`",
            )),
        }
    }

    /// Final condition: the stack must be empty at the end of the program
    pub fn finish(mut self) -> LangResult<()> {
        if let Some(top) = self.stack.pop() {
            let rest = self.stack.len();
            let message = if rest == 0 {
                format!("unhandled data on stack ({})", top.ty)
            } else {
                format!("unhandled data on stack ({}) ({rest} more)", top.ty)
            };
            return Err(LangError::new(ErrorKind::StackNotEmpty, top.info, message));
        }
        debug!("type check passed");
        Ok(())
    }

    // =========================================================================
    // PRIMITIVE CHECKS
    // =========================================================================

    fn check_length(&self, n: usize, token: &Token) -> LangResult<()> {
        if self.stack.len() < n {
            return Err(LangError::not_enough_tokens(
                token.info.clone(),
                format!("not enough arguments for `{}`", token.op.spelling()),
            ));
        }
        Ok(())
    }

    /// Pop one value and require it to match `expected` (`any` matches all)
    fn type_check(&mut self, expected: &TypeDesc, token: &Token) -> LangResult<Entry> {
        let entry = self
            .stack
            .pop()
            .expect("check_length always precedes type_check");
        if matches!(expected, TypeDesc::Any) {
            return Ok(entry);
        }
        if !entry.ty.matches(expected) {
            return Err(LangError::reporting(
                entry.info.clone(),
                format!("`{}` must be `{expected}`", entry.ty),
                LangError::invalid_type(
                    token.info.clone(),
                    format!("invalid type for `{}`", token.op.spelling()),
                ),
            ));
        }
        Ok(entry)
    }

    /// Pop a list of values, in order (first element of `types` is the top)
    fn check(&mut self, types: &[TypeDesc], token: &Token) -> LangResult<Vec<Entry>> {
        self.check_length(types.len(), token)?;
        types.iter().map(|ty| self.type_check(ty, token)).collect()
    }

    /// Pop `length` values of one common type
    fn check_same(&mut self, length: usize, token: &Token) -> LangResult<TypeDesc> {
        self.check_length(length, token)?;
        let first = self.stack.pop().expect("length checked");
        for _ in 1..length {
            let other = self.stack.pop().expect("length checked");
            if !other.ty.matches(&first.ty) {
                return Err(LangError::reporting(
                    other.info,
                    format!("`{}` must be equal to `{}`", other.ty, first.ty),
                    LangError::reporting(
                        first.info,
                        format!("`{}` and", first.ty),
                        LangError::invalid_type(
                            token.info.clone(),
                            format!("invalid type for `{}`", token.op.spelling()),
                        ),
                    ),
                ));
            }
        }
        Ok(first.ty)
    }

    /// Pop one case worth of values and return the index of the unique case
    /// whose types matched, plus the actual popped types (top first)
    fn check_comb(
        &mut self,
        cases: &[&[TypeDesc]],
        token: &Token,
    ) -> LangResult<(usize, Vec<TypeDesc>)> {
        debug_assert!(!cases.is_empty());
        let length = cases[0].len();
        debug_assert!(cases.iter().all(|case| case.len() == length));

        self.check_length(length, token)?;
        let mut valid = vec![true; cases.len()];
        let mut popped = Vec::with_capacity(length);
        for slot in 0..length {
            let entry = self.stack.pop().expect("length checked");
            let mut hit = false;
            let mut next = valid.clone();
            for (case_idx, case) in cases.iter().enumerate() {
                if !valid[case_idx] {
                    continue;
                }
                if case[slot].matches(&entry.ty) {
                    hit = true;
                } else {
                    next[case_idx] = false;
                }
            }
            if !hit {
                let mut choices: Vec<String> = cases
                    .iter()
                    .enumerate()
                    .filter(|(case_idx, _)| valid[*case_idx])
                    .map(|(_, case)| format!("`{}`", case[slot]))
                    .collect();
                choices.dedup();
                return Err(LangError::invalid_type(
                    entry.info,
                    format!("`{}` expected to be {}", entry.ty, choices.join(" or ")),
                )
                .with_cause(LangError::invalid_type(
                    token.info.clone(),
                    format!("invalid type for `{}`", token.op.spelling()),
                )));
            }
            valid = next;
            popped.push(entry.ty);
        }
        let case = valid
            .iter()
            .position(|&v| v)
            .expect("at least one case survived every slot");
        Ok((case, popped))
    }

    /// Compare two stacks for branch reconciliation
    fn cmp_stack(&self, current: &[Entry], prev: &[Entry], block: LangError) -> LangResult<()> {
        if current.len() > prev.len() {
            let extra = current.last().expect("longer than prev");
            return Err(
                LangError::new(ErrorKind::AddedToken, extra.info.clone(), "was added")
                    .with_cause(block),
            );
        }
        if current.len() < prev.len() {
            let missing = prev.last().expect("longer than current");
            return Err(LangError::new(
                ErrorKind::MissingToken,
                missing.info.clone(),
                "is missing",
            )
            .with_cause(block));
        }
        for (before, after) in prev.iter().zip(current.iter()) {
            if !before.ty.matches(&after.ty) {
                return Err(LangError::reporting(
                    after.info.clone(),
                    format!("`{}` became `{}`", before.ty, after.ty),
                    LangError::reporting(before.info.clone(), "got changed by", block),
                ));
            }
        }
        Ok(())
    }

    fn block_error(&self, kind: ErrorKind, info: &SourceInfo) -> LangError {
        LangError::new(kind, info.clone(), "")
    }

    // =========================================================================
    // THE WALK
    // =========================================================================

    /// Apply one token's stack effect
    pub fn step(&mut self, token: &Token) -> LangResult<()> {
        use TypeDesc::{Any, Bool, Char, Int};
        let any_ptr = || Any.ptr_to();

        match &token.op {
            // ---- literals ----
            Op::Push(_) => self.stack.push(Entry::new(&token.info, Int)),
            Op::Bool(_) => self.stack.push(Entry::new(&token.info, Bool)),
            Op::Char(_) => self.stack.push(Entry::new(&token.info, Char)),
            Op::Str(_) => {
                self.stack.push(Entry::new(&token.info, Int));
                self.stack.push(Entry::new(&token.info, Char.ptr_to()));
            }
            Op::PushMemory(_) => self.stack.push(Entry::new(&token.info, any_ptr())),
            Op::Label(_) => {}

            // ---- stack intrinsics ----
            Op::Drop => {
                self.check(&[Any], token)?;
            }
            Op::Dup => {
                self.check_length(1, token)?;
                let top = self.stack.last().expect("length checked").ty.clone();
                self.stack.push(Entry::new(&token.info, top));
            }
            Op::Dup2 => {
                self.check_length(2, token)?;
                let a = self.stack[self.stack.len() - 1].ty.clone();
                let b = self.stack[self.stack.len() - 2].ty.clone();
                self.stack.push(Entry::new(&token.info, b));
                self.stack.push(Entry::new(&token.info, a));
            }
            Op::Swap => {
                self.check_length(2, token)?;
                let a = self.stack.pop().expect("length checked");
                let b = self.stack.pop().expect("length checked");
                self.stack.push(a);
                self.stack.push(b);
            }
            Op::Swap2 => {
                self.check_length(4, token)?;
                let a = self.stack.pop().expect("length checked");
                let b = self.stack.pop().expect("length checked");
                let c = self.stack.pop().expect("length checked");
                let d = self.stack.pop().expect("length checked");
                self.stack.push(b);
                self.stack.push(a);
                self.stack.push(d);
                self.stack.push(c);
            }
            Op::Over => {
                self.check_length(2, token)?;
                let under = self.stack[self.stack.len() - 2].clone();
                self.stack.push(under);
            }
            Op::Rot => {
                self.check_length(3, token)?;
                let a = self.stack.pop().expect("length checked");
                let b = self.stack.pop().expect("length checked");
                let c = self.stack.pop().expect("length checked");
                self.stack.push(b);
                self.stack.push(a);
                self.stack.push(c);
            }
            Op::Rrot => {
                self.check_length(3, token)?;
                let a = self.stack.pop().expect("length checked");
                let b = self.stack.pop().expect("length checked");
                let c = self.stack.pop().expect("length checked");
                self.stack.push(a);
                self.stack.push(c);
                self.stack.push(b);
            }
            Op::Argc => self.stack.push(Entry::new(&token.info, Int)),
            Op::Argv => self.stack.push(Entry::new(&token.info, any_ptr())),

            // ---- arithmetic / bitwise ----
            Op::Plus => {
                let (case, popped) = self.check_comb(
                    &[
                        &[Int, Int],
                        &[Int, any_ptr()],
                        &[any_ptr(), Int],
                        &[Char, Char],
                    ],
                    token,
                )?;
                let result = match case {
                    0 => Int,
                    1 => popped[1].clone(),
                    2 => popped[0].clone(),
                    _ => Char,
                };
                self.stack.push(Entry::new(&token.info, result));
            }
            Op::Minus => {
                let (case, _) = self.check_comb(
                    &[
                        &[Int, Int],
                        &[Int, any_ptr()],
                        &[any_ptr(), any_ptr()],
                        &[Char, Char],
                    ],
                    token,
                )?;
                let result = match case {
                    0 => Int,
                    1 => any_ptr(),
                    2 => Int,
                    _ => Char,
                };
                self.stack.push(Entry::new(&token.info, result));
            }
            Op::Mul | Op::Div | Op::Mod | Op::Blsh | Op::Brsh => {
                self.check(&[Int, Int], token)?;
                self.stack.push(Entry::new(&token.info, Int));
            }
            Op::DivMod => {
                self.check(&[Int, Int], token)?;
                self.stack.push(Entry::new(&token.info, Int));
                self.stack.push(Entry::new(&token.info, Int));
            }
            Op::Increment | Op::Decrement => {
                let (_, popped) = self.check_comb(&[&[Int], &[any_ptr()], &[Char]], token)?;
                self.stack.push(Entry::new(&token.info, popped[0].clone()));
            }
            Op::Band | Op::Bor | Op::Bxor => {
                let (case, _) =
                    self.check_comb(&[&[Int, Int], &[Char, Char], &[Bool, Bool]], token)?;
                let result = match case {
                    0 => Int,
                    1 => Char,
                    _ => Bool,
                };
                self.stack.push(Entry::new(&token.info, result));
            }

            // ---- comparisons ----
            Op::Eq | Op::Ne | Op::Gt | Op::Ge | Op::Lt | Op::Le => {
                self.check_same(2, token)?;
                self.stack.push(Entry::new(&token.info, Bool));
            }

            // ---- memory ----
            Op::Load | Op::Load16 | Op::Load32 | Op::Load64 => {
                let popped = self.check(&[any_ptr()], token)?;
                let Some(pointee) = popped[0].ty.deref() else {
                    return Err(LangError::invalid_type(
                        token.info.clone(),
                        format!("cannot dereference `{}`", popped[0].ty),
                    ));
                };
                self.stack.push(Entry::new(&token.info, pointee));
            }
            Op::Store => {
                self.check(&[any_ptr(), Char], token)?;
            }
            Op::Store16 | Op::Store32 | Op::Store64 => {
                self.check(&[any_ptr(), Int], token)?;
            }

            // ---- i/o & control ----
            Op::Dump | Op::Udump | Op::Cdump => {
                self.check(&[Any], token)?;
            }
            Op::Hexdump => {
                self.check(&[Int], token)?;
            }
            Op::Exit => {
                self.check(&[Int], token)?;
            }

            // ---- syscalls ----
            Op::Syscall
            | Op::Syscall1
            | Op::Syscall2
            | Op::Syscall3
            | Op::Syscall4
            | Op::Syscall5
            | Op::Syscall6
            | Op::RSyscall1
            | Op::RSyscall2
            | Op::RSyscall3
            | Op::RSyscall4
            | Op::RSyscall5
            | Op::RSyscall6 => {
                let (arity, reversed) = token.op.syscall_arity().expect("matched a syscall");
                let mut types = vec![Any; arity + 1];
                let number_slot = if reversed { arity } else { 0 };
                types[number_slot] = Int;
                self.check(&types, token)?;
                self.stack.push(Entry::new(&token.info, Int));
            }

            // ---- flow ----
            Op::If => {
                self.block_stack.push(self.stack.clone());
                self.block_origin_stack.push(self.stack.clone());
            }
            Op::While => {
                self.block_origin_stack.push(self.stack.clone());
                self.block_stack.push(self.stack.clone());
            }
            Op::Elif => {
                let flow = token.flow();
                let prev_snapshot = self
                    .block_stack
                    .pop()
                    .expect("parser links every elif to an open if");
                let prev_idx = flow.prev.expect("elif always has a predecessor");
                let prev_tok = &self.program.instructions[prev_idx];
                match prev_tok.op {
                    Op::If if !flow.has_else => {
                        self.cmp_stack(
                            &self.stack,
                            &prev_snapshot,
                            self.block_error(ErrorKind::IfException, &prev_tok.info),
                        )?;
                    }
                    Op::Elif => {
                        self.cmp_stack(
                            &self.stack,
                            &prev_snapshot,
                            self.block_error(ErrorKind::ElifException, &prev_tok.info),
                        )?;
                    }
                    _ => {}
                }
                self.block_stack.push(self.stack.clone());
                self.stack = self
                    .block_origin_stack
                    .last()
                    .expect("origin pushed at the if")
                    .clone();
            }
            Op::Else => {
                let flow = token.flow();
                let prev_snapshot = self
                    .block_stack
                    .pop()
                    .expect("parser links every else to an open if");
                let prev_idx = flow.prev.expect("else always has a predecessor");
                let prev_tok = &self.program.instructions[prev_idx];
                if matches!(prev_tok.op, Op::Elif) {
                    self.cmp_stack(
                        &self.stack,
                        &prev_snapshot,
                        self.block_error(ErrorKind::ElseException, &prev_tok.info),
                    )?;
                }
                self.block_stack.push(self.stack.clone());
                self.stack = self
                    .block_origin_stack
                    .last()
                    .expect("origin pushed at the if")
                    .clone();
            }
            Op::Do => {
                let root = token.flow().root;
                let root_op = &self.program.instructions[root].op;
                if matches!(root_op, Op::Let | Op::With) {
                    // binder regions carry no condition
                } else {
                    self.check(&[Bool], token)?;
                    if matches!(root_op, Op::While) {
                        let snapshot = self
                            .block_stack
                            .last()
                            .expect("snapshot pushed at the while");
                        if snapshot.len() != self.stack.len() {
                            let info = self
                                .stack
                                .last()
                                .map(|entry| entry.info.clone())
                                .unwrap_or_else(|| token.info.clone());
                            return Err(LangError::new(
                                ErrorKind::WhileException,
                                info,
                                "the condition between `while` and `do` must push exactly one `bool`",
                            ));
                        }
                    }
                }
            }
            Op::End => {
                let root = token.flow().root;
                match self.program.instructions[root].op {
                    Op::Let | Op::With => {
                        self.locals.pop();
                    }
                    Op::Proc => {
                        let _branch = self
                            .block_stack
                            .pop()
                            .expect("snapshot pushed at the proc");
                        let origin = self
                            .block_origin_stack
                            .pop()
                            .expect("origin pushed at the proc");
                        self.locals.pop();
                        let proc = *self
                            .proc_by_opener
                            .get(&root)
                            .expect("every proc opener is registered");
                        // the body leaves the declared outs with the last one
                        // on top, so they pop in reverse declaration order
                        let expected: Vec<TypeDesc> =
                            proc.outs.iter().rev().map(|out| out.ty.clone()).collect();
                        self.check(&expected, token)?;
                        if let Some(extra) = self.stack.pop() {
                            let rest = self.stack.len();
                            let message = if rest == 0 {
                                format!("unhandled data on stack inside procedure ({})", extra.ty)
                            } else {
                                format!(
                                    "unhandled data on stack inside procedure ({}) ({rest} more)",
                                    extra.ty
                                )
                            };
                            return Err(LangError::new(
                                ErrorKind::ProcedureError,
                                extra.info,
                                message,
                            )
                            .with_cause(self.block_error(
                                ErrorKind::Reporting,
                                &proc.info,
                            )));
                        }
                        self.stack = origin;
                    }
                    Op::While => {
                        let prev_snapshot =
                            self.block_stack.pop().expect("snapshot pushed at the while");
                        self.block_origin_stack
                            .pop()
                            .expect("origin pushed at the while");
                        self.cmp_stack(
                            &self.stack,
                            &prev_snapshot,
                            self.block_error(ErrorKind::WhileException, &token.info),
                        )?;
                        self.stack = prev_snapshot;
                    }
                    Op::If => {
                        let prev_snapshot =
                            self.block_stack.pop().expect("snapshot pushed at the if");
                        self.block_origin_stack
                            .pop()
                            .expect("origin pushed at the if");
                        self.cmp_stack(
                            &self.stack,
                            &prev_snapshot,
                            self.block_error(ErrorKind::IfException, &token.info),
                        )?;
                    }
                    ref other => unreachable!("`end` rooted at `{}`", other.spelling()),
                }
            }
            Op::Let => {
                let names = &token.flow().names;
                self.check(&vec![Int; names.len()], token)?;
                let mut frame = FxHashMap::default();
                for binding in names {
                    frame.insert(binding.name, Entry::new(&binding.info, any_ptr()));
                }
                self.locals.push(frame);
            }
            Op::With => {
                let names = token.flow().names.clone();
                self.check_length(names.len(), token)?;
                let mut frame = FxHashMap::default();
                for binding in &names {
                    let entry = self.stack.pop().expect("length checked");
                    frame.insert(binding.name, entry);
                }
                self.locals.push(frame);
            }

            // ---- words, casts, procedures ----
            Op::Word(name) => {
                let local = self
                    .locals
                    .iter()
                    .rev()
                    .find_map(|frame| frame.get(name))
                    .cloned();
                if let Some(entry) = local {
                    self.stack.push(entry);
                } else if let Some(proc) = self.procedures.get(name).copied() {
                    self.apply_call(proc, token)?;
                } else {
                    return Err(LangError::unknown_token(token.info.clone(), "unknown word"));
                }
            }
            Op::Cast(ty) => {
                self.check_length(1, token)?;
                let entry = self.stack.pop().expect("length checked");
                self.stack.push(Entry {
                    info: entry.info,
                    ty: ty.clone(),
                });
            }
            Op::Proc => {
                let proc = *self
                    .proc_by_opener
                    .get(&token.position)
                    .expect("every proc opener is registered");
                self.procedures.insert(proc.name, proc);
                self.block_origin_stack.push(self.stack.clone());
                self.block_stack.push(Vec::new());
                // the body starts from a fresh stack seeded with the
                // anonymous arguments, first declared on top
                let mut body_stack = Vec::new();
                for arg in proc.ins.iter().rev() {
                    if arg.name.is_none() {
                        body_stack.push(Entry::new(&arg.info, arg.ty.clone()));
                    }
                }
                self.stack = body_stack;
                let mut frame = FxHashMap::default();
                for arg in &proc.ins {
                    if let Some(binding) = &arg.name {
                        frame.insert(binding.name, Entry::new(&binding.info, arg.ty.clone()));
                    }
                }
                self.locals.push(frame);
            }
            Op::Call(name) => {
                let Some(proc) = self.procedures.get(name).copied() else {
                    return Err(LangError::unknown_token(token.info.clone(), "unknown word"));
                };
                self.apply_call(proc, token)?;
            }

            // consumed during parsing; never reach the checker
            Op::Macro | Op::In | Op::Out | Op::Memory | Op::Include => {
                unreachable!("`{}` is consumed during parsing", token.op.spelling())
            }
        }
        Ok(())
    }

    /// Pop a procedure's argument types and push its outputs
    fn apply_call(&mut self, proc: &Procedure, token: &Token) -> LangResult<()> {
        let args: Vec<TypeDesc> = proc.ins.iter().map(|arg| arg.ty.clone()).collect();
        self.check(&args, token)?;
        for out in &proc.outs {
            self.stack.push(Entry::new(&out.info, out.ty.clone()));
        }
        Ok(())
    }
}

/// Ops permitted inside a `memory` size expression
fn is_size_expression_op(op: &Op) -> bool {
    matches!(
        op,
        Op::Push(_)
            | Op::Char(_)
            | Op::PushMemory(_)
            | Op::Cast(_)
            | Op::Drop
            | Op::Dup
            | Op::Dup2
            | Op::Swap
            | Op::Swap2
            | Op::Over
            | Op::Rot
            | Op::Rrot
            | Op::Plus
            | Op::Minus
            | Op::Mul
            | Op::Div
            | Op::Mod
            | Op::DivMod
            | Op::Increment
            | Op::Decrement
            | Op::Blsh
            | Op::Brsh
            | Op::Band
            | Op::Bor
            | Op::Bxor
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use slc_util::SourceMap;
    use std::path::PathBuf;

    fn parse(source: &str) -> Program {
        let mut sources = SourceMap::new();
        let file_id = sources.add_file("test.sl", source);
        Program::parse(file_id, PathBuf::from("test.sl"), Vec::new(), &mut sources)
            .expect("test source must parse")
    }

    fn check_source(source: &str) -> LangResult<()> {
        check(&parse(source))
    }

    fn check_err(source: &str) -> LangError {
        check_source(source).expect_err("source must be rejected")
    }

    #[test]
    fn test_arithmetic_program() {
        assert!(check_source("35 35 + 1 - dump 0 exit").is_ok());
    }

    #[test]
    fn test_stack_not_empty() {
        let err = check_err("1 2 +");
        assert_eq!(err.kind, ErrorKind::StackNotEmpty);
    }

    #[test]
    fn test_underflow() {
        let err = check_err("dup 0 exit");
        assert_eq!(err.kind, ErrorKind::NotEnoughTokens);
    }

    #[test]
    fn test_plus_overloads() {
        assert!(check_source("memory buf 8 end buf 1 + drop 0 exit").is_ok());
        assert!(check_source("1 'a' 'b' + drop drop 0 exit").is_ok());
        let err = check_err("true 1 + drop 0 exit");
        assert!(err.has_kind(ErrorKind::InvalidType));
    }

    #[test]
    fn test_minus_pointer_difference() {
        assert!(check_source("memory buf 8 end buf buf - dump 0 exit").is_ok());
    }

    #[test]
    fn test_comparison_requires_same_types() {
        assert!(check_source("if 1 2 > do end 0 exit").is_ok());
        let err = check_err("1 'a' > drop 0 exit");
        assert!(err.has_kind(ErrorKind::InvalidType));
    }

    #[test]
    fn test_bitwise_overloads() {
        assert!(check_source("true false band drop 0 exit").is_ok());
        assert!(check_source("1 2 bor drop 0 exit").is_ok());
        assert!(check_source("'a' 'b' bxor drop 0 exit").is_ok());
    }

    #[test]
    fn test_if_branches_must_agree() {
        let err = check_err("if 1 2 > do 1 else end drop 0 exit");
        assert!(err.kind == ErrorKind::MissingToken || err.kind == ErrorKind::AddedToken);
        assert!(err.has_kind(ErrorKind::IfException) || err.has_kind(ErrorKind::ElseException));
    }

    #[test]
    fn test_if_without_do_is_rejected() {
        let err = check_err("if 1 end 0 exit");
        assert_eq!(err.kind, ErrorKind::AddedToken);
        assert!(err.has_kind(ErrorKind::IfException));
    }

    #[test]
    fn test_if_chain_accepts_matching_branches() {
        assert!(
            check_source("if 1 2 > do 1 dump elif 2 3 > do 2 dump else 3 dump end 0 exit").is_ok()
        );
    }

    #[test]
    fn test_if_without_else_must_preserve_stack() {
        assert!(check_source("5 if dup 0 > do 1 - end dump 0 exit").is_ok());
    }

    #[test]
    fn test_while_loop() {
        assert!(check_source("0 while dup 3 < do dup dump 1 + end drop 0 exit").is_ok());
    }

    #[test]
    fn test_while_condition_must_push_single_bool() {
        let err = check_err("0 while dup dup 3 < do drop end drop 0 exit");
        assert_eq!(err.kind, ErrorKind::WhileException);
    }

    #[test]
    fn test_while_body_must_restore_stack() {
        let err = check_err("0 while dup 3 < do dup end drop 0 exit");
        assert!(err.has_kind(ErrorKind::WhileException));
    }

    #[test]
    fn test_proc_square() {
        assert!(check_source("proc square int in int out dup * end 5 square dump 0 exit").is_ok());
    }

    #[test]
    fn test_proc_named_args() {
        assert!(
            check_source("proc add2 a int b int in int out a b + end 1 2 add2 dump 0 exit")
                .is_ok()
        );
    }

    #[test]
    fn test_proc_leftover_is_rejected() {
        let err = check_err("proc bad int in int out dup dup * end 5 bad dump 0 exit");
        assert_eq!(err.kind, ErrorKind::ProcedureError);
    }

    #[test]
    fn test_proc_recursion() {
        // the recursive call leaves nothing; the surrounding branch drops a
        // value only on one side, so the branches disagree
        assert!(check_source(
            "proc countdown n int in n if n 0 > do n 1 - countdown drop end drop end \
             3 countdown 0 exit"
        )
        .is_err());
        // recursion is fine when the effects balance
        assert!(check_source(
            "proc fac n int in int out if n 1 > do n 1 - fac n * else 1 end end \
             5 fac dump 0 exit"
        )
        .is_ok());
    }

    #[test]
    fn test_string_pushes_length_and_pointer() {
        assert!(check_source("\"hey\" drop drop 0 exit").is_ok());
        assert!(check_source("\"hey\" @ cdump drop 0 exit").is_ok());
    }

    #[test]
    fn test_load_derefs() {
        // a cast to `int*` makes the value loadable as `int`
        assert!(check_source("0 int* @ dump 0 exit").is_ok());
        // loading through a value that is only `any` has no pointee type
        let err = check_err("argv @64 @ drop 0 exit");
        assert_eq!(err.kind, ErrorKind::InvalidType);
    }

    #[test]
    fn test_store_widths() {
        assert!(check_source("memory buf 8 end 'x' buf ! 0 exit").is_ok());
        assert!(check_source("memory buf 8 end 42 buf !64 0 exit").is_ok());
        let err = check_err("memory buf 8 end 42 buf ! 0 exit");
        assert!(err.has_kind(ErrorKind::InvalidType));
    }

    #[test]
    fn test_let_binds_pointers() {
        assert!(check_source("1 2 let a b do a drop b drop end 0 exit").is_ok());
        let err = check_err("true let a do a drop end 0 exit");
        assert!(err.has_kind(ErrorKind::InvalidType));
    }

    #[test]
    fn test_with_binds_actual_types() {
        assert!(check_source("true 1 with a b do a drop if b do end end 0 exit").is_ok());
    }

    #[test]
    fn test_unknown_word() {
        let err = check_err("mystery 0 exit");
        assert_eq!(err.kind, ErrorKind::UnknownToken);
    }

    #[test]
    fn test_memory_body_must_be_int() {
        assert!(check_source("memory buf 1024 end 0 exit").is_ok());
        assert!(check_source("memory buf 8 8 * end 0 exit").is_ok());
        let err = check_err("memory buf 'a' end 0 exit");
        assert_eq!(err.kind, ErrorKind::InvalidType);
    }

    #[test]
    fn test_memory_body_rejects_flow() {
        let err = check_err("memory buf \"x\" drop drop 8 end 0 exit");
        assert_eq!(err.kind, ErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_cast_changes_top() {
        assert!(check_source("0 int* @16 dump 0 exit").is_ok());
    }

    #[test]
    fn test_syscalls() {
        assert!(check_source("1 1 1 syscall2 drop 0 exit").is_ok());
        assert!(check_source("1 1 1 rsyscall2 drop 0 exit").is_ok());
        let err = check_err("true syscall drop 0 exit");
        assert!(err.has_kind(ErrorKind::InvalidType));
    }

    #[test]
    fn test_exit_consumes_code() {
        let err = check_err("exit");
        assert_eq!(err.kind, ErrorKind::NotEnoughTokens);
    }
}
