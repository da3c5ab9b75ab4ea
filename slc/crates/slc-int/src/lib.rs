//! slc-int - The tree-walking interpreter engine.
//!
//! ============================================================================
//! EXECUTION MODEL
//! ============================================================================
//!
//! The interpreter implements the [`Engine`] contract over the fully parsed,
//! type-checked program. Values are 64-bit integers on one operand stack;
//! pointers are offsets into a single flat byte arena that holds, in order:
//!
//! - a small null guard (so no allocation ever has address 0),
//! - every `memory` declaration (sizes constant-folded in [`Engine::before`]),
//! - the bytes of every string literal,
//! - the program arguments and the `argv` pointer table.
//!
//! Control flow needs no lookahead: `do` pops its condition and jumps along
//! the flow links resolved by the parser, `end` of a `while` jumps back to
//! its opener, and procedure calls push a return pointer and jump into the
//! body that still sits inline in the instruction list.
//!
//! Output (`dump` and friends, plus `write` to fd 1) goes to a caller
//! supplied writer so tests can capture it. Syscalls `read`, `write` and
//! `exit` are implemented against the host; any other number returns
//! `-38` (`ENOSYS`).

use std::io::{self, Read, Write};

use tracing::debug;

use slc_par::{Engine, InsnIdx, Op, Procedure, Program, Step, Token};
use slc_util::{FxHashMap, Idx, LangError, LangResult, Symbol};

/// Result of a syscall dispatch
enum SysResult {
    Value(i64),
    Exit(i64),
}

/// The interpreter engine
pub struct Interpreter<W: Write> {
    out: W,
    /// Operand stack
    stack: Vec<i64>,
    /// Flat data memory; all pointers index into this
    arena: Vec<u8>,
    /// Memory region name -> base address
    memories: FxHashMap<Symbol, i64>,
    /// String literal instruction index -> (length, address)
    strings: FxHashMap<u32, (i64, i64)>,
    /// Scoped name bindings, innermost last
    locals: Vec<FxHashMap<Symbol, i64>>,
    /// Return pointers of active procedure calls
    call_stack: Vec<InsnIdx>,
    /// Program arguments for `argc`/`argv`
    args: Vec<String>,
    argv_ptr: i64,
    exited: bool,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stack: Vec::new(),
            arena: Vec::new(),
            memories: FxHashMap::default(),
            strings: FxHashMap::default(),
            locals: Vec::new(),
            call_stack: Vec::new(),
            args: Vec::new(),
            argv_ptr: 0,
            exited: false,
        }
    }

    /// Set the program arguments visible through `argc`/`argv`
    pub fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }

    fn pop(&mut self) -> i64 {
        self.stack
            .pop()
            .expect("the type checker guarantees stack depth")
    }

    fn push(&mut self, value: i64) {
        self.stack.push(value);
    }

    /// Append bytes to the arena at 8-byte alignment, returning their address
    fn alloc(&mut self, bytes: &[u8]) -> i64 {
        while self.arena.len() % 8 != 0 {
            self.arena.push(0);
        }
        let addr = self.arena.len() as i64;
        self.arena.extend_from_slice(bytes);
        addr
    }

    /// Validate an `addr..addr + len` arena range
    fn range(&self, addr: i64, len: usize) -> Option<usize> {
        usize::try_from(addr)
            .ok()
            .filter(|&start| start.checked_add(len).is_some_and(|end| end <= self.arena.len()))
    }

    fn load(&self, token: &Token, addr: i64, width: usize) -> LangResult<i64> {
        let start = self.range(addr, width).ok_or_else(|| {
            LangError::runtime(token.info.clone(), format!("invalid read at address {addr}"))
        })?;
        let mut bytes = [0u8; 8];
        bytes[..width].copy_from_slice(&self.arena[start..start + width]);
        Ok(i64::from_le_bytes(bytes))
    }

    fn store(&mut self, token: &Token, addr: i64, value: i64, width: usize) -> LangResult<()> {
        let start = self.range(addr, width).ok_or_else(|| {
            LangError::runtime(
                token.info.clone(),
                format!("invalid write at address {addr}"),
            )
        })?;
        self.arena[start..start + width].copy_from_slice(&value.to_le_bytes()[..width]);
        Ok(())
    }

    /// Constant-fold one `memory` size expression
    fn eval_size(&self, body: &[Token]) -> LangResult<i64> {
        let mut stack: Vec<i64> = Vec::new();
        for token in body {
            match &token.op {
                Op::Push(v) => stack.push(*v),
                Op::Char(c) => stack.push(*c),
                Op::PushMemory(name) => stack.push(self.memories[name]),
                Op::Cast(_) => {}
                Op::Drop => {
                    stack.pop();
                }
                Op::Dup => {
                    let top = *stack.last().expect("checked size expression");
                    stack.push(top);
                }
                Op::Dup2 => {
                    let a = stack[stack.len() - 1];
                    let b = stack[stack.len() - 2];
                    stack.push(b);
                    stack.push(a);
                }
                Op::Swap => {
                    let len = stack.len();
                    stack.swap(len - 1, len - 2);
                }
                Op::Increment => *stack.last_mut().expect("checked size expression") += 1,
                Op::Decrement => *stack.last_mut().expect("checked size expression") -= 1,
                _ => {
                    let b = stack.pop().expect("checked size expression");
                    let a = stack.pop().expect("checked size expression");
                    let value = binary_arith(&token.op, a, b).ok_or_else(|| {
                        LangError::runtime(token.info.clone(), "division by zero in memory size")
                    })?;
                    stack.push(value);
                }
            }
        }
        Ok(stack.pop().expect("checked size expression"))
    }

    fn dispatch_syscall(&mut self, token: &Token, number: i64, args: &[i64]) -> LangResult<SysResult> {
        let arg = |i: usize| args.get(i).copied().unwrap_or(0);
        Ok(match number {
            // read(fd, buf, count)
            0 => {
                if arg(0) != 0 {
                    return Ok(SysResult::Value(-9)); // EBADF
                }
                let (buf, count) = (arg(1), arg(2).max(0) as usize);
                let Some(start) = self.range(buf, count) else {
                    return Ok(SysResult::Value(-14)); // EFAULT
                };
                let read = io::stdin()
                    .read(&mut self.arena[start..start + count])
                    .map_err(|e| {
                        LangError::runtime(token.info.clone(), format!("read failed: {e}"))
                    })?;
                SysResult::Value(read as i64)
            }
            // write(fd, buf, count)
            1 => {
                let (fd, buf, count) = (arg(0), arg(1), arg(2).max(0) as usize);
                let Some(start) = self.range(buf, count) else {
                    return Ok(SysResult::Value(-14)); // EFAULT
                };
                let bytes = &self.arena[start..start + count];
                let result = match fd {
                    1 => self.out.write_all(bytes),
                    2 => io::stderr().write_all(bytes),
                    _ => return Ok(SysResult::Value(-9)), // EBADF
                };
                result.map_err(|e| {
                    LangError::runtime(token.info.clone(), format!("write failed: {e}"))
                })?;
                SysResult::Value(count as i64)
            }
            // exit(code)
            60 => {
                self.exited = true;
                SysResult::Exit(arg(0))
            }
            _ => SysResult::Value(-38), // ENOSYS
        })
    }

    /// Relative jump from `idx` to `target`
    fn jump(idx: InsnIdx, target: InsnIdx) -> Step {
        Step::Skip(target.index() as i64 - idx.index() as i64 - 1)
    }

    /// Bind call arguments and jump into a procedure body
    fn enter_proc(&mut self, proc: &Procedure, idx: InsnIdx) -> Step {
        let mut frame = FxHashMap::default();
        let mut anonymous = Vec::new();
        for arg in &proc.ins {
            let value = self.pop();
            match &arg.name {
                Some(binding) => {
                    frame.insert(binding.name, value);
                }
                None => anonymous.push(value),
            }
        }
        for value in anonymous.into_iter().rev() {
            self.push(value);
        }
        self.locals.push(frame);
        self.call_stack.push(InsnIdx(idx.0 + 1));
        Self::jump(idx, proc.body_start)
    }
}

impl<W: Write> Engine for Interpreter<W> {
    fn before(&mut self, program: &Program) -> LangResult<()> {
        // null guard: address 0 is never handed out
        self.arena.resize(8, 0);

        for def in program.memories() {
            let size = self.eval_size(&def.body)?;
            let size = usize::try_from(size).map_err(|_| {
                LangError::runtime(
                    def.info.clone(),
                    format!("memory size must not be negative, got {size}"),
                )
            })?;
            let base = self.alloc(&vec![0u8; size]);
            self.memories.insert(def.name, base);
        }

        for (idx, token) in program.instructions.iter_enumerated() {
            if let Op::Str(text) = &token.op {
                let addr = self.alloc(text.as_bytes());
                self.strings.insert(idx.0, (text.len() as i64, addr));
            }
        }

        let mut pointers = Vec::with_capacity(self.args.len() + 1);
        let args = std::mem::take(&mut self.args);
        for arg in &args {
            let mut bytes = arg.clone().into_bytes();
            bytes.push(0);
            pointers.push(self.alloc(&bytes));
        }
        self.args = args;
        pointers.push(0);
        let table: Vec<u8> = pointers
            .iter()
            .flat_map(|p| p.to_le_bytes())
            .collect();
        self.argv_ptr = self.alloc(&table);

        debug!(
            arena = self.arena.len(),
            memories = self.memories.len(),
            "interpreter initialised"
        );
        Ok(())
    }

    fn step(&mut self, program: &Program, idx: InsnIdx) -> LangResult<Step> {
        let token = &program.instructions[idx];
        match &token.op {
            // ---- literals ----
            Op::Push(v) => self.push(*v),
            Op::Char(c) => self.push(*c),
            Op::Bool(b) => self.push(*b as i64),
            Op::Str(_) => {
                let (len, addr) = self.strings[&idx.0];
                self.push(len);
                self.push(addr);
            }
            Op::PushMemory(name) => {
                let base = self.memories[name];
                self.push(base);
            }
            Op::Word(name) => {
                let value = self
                    .locals
                    .iter()
                    .rev()
                    .find_map(|frame| frame.get(name))
                    .copied()
                    .expect("the type checker resolves every word");
                self.push(value);
            }

            // ---- stack intrinsics ----
            Op::Drop => {
                self.pop();
            }
            Op::Dup => {
                let a = self.pop();
                self.push(a);
                self.push(a);
            }
            Op::Dup2 => {
                let a = self.pop();
                let b = self.pop();
                self.push(b);
                self.push(a);
                self.push(b);
                self.push(a);
            }
            Op::Swap => {
                let a = self.pop();
                let b = self.pop();
                self.push(a);
                self.push(b);
            }
            Op::Swap2 => {
                let a = self.pop();
                let b = self.pop();
                let c = self.pop();
                let d = self.pop();
                self.push(b);
                self.push(a);
                self.push(d);
                self.push(c);
            }
            Op::Over => {
                let a = self.pop();
                let b = self.pop();
                self.push(b);
                self.push(a);
                self.push(b);
            }
            Op::Rot => {
                let a = self.pop();
                let b = self.pop();
                let c = self.pop();
                self.push(b);
                self.push(a);
                self.push(c);
            }
            Op::Rrot => {
                let a = self.pop();
                let b = self.pop();
                let c = self.pop();
                self.push(a);
                self.push(c);
                self.push(b);
            }
            Op::Argc => self.push(self.args.len() as i64),
            Op::Argv => self.push(self.argv_ptr),

            // ---- arithmetic / bitwise ----
            Op::Plus
            | Op::Minus
            | Op::Mul
            | Op::Div
            | Op::Mod
            | Op::Blsh
            | Op::Brsh
            | Op::Band
            | Op::Bor
            | Op::Bxor => {
                let b = self.pop();
                let a = self.pop();
                let value = binary_arith(&token.op, a, b).ok_or_else(|| {
                    LangError::runtime(token.info.clone(), "division by zero")
                })?;
                self.push(value);
            }
            Op::DivMod => {
                let b = self.pop();
                let a = self.pop();
                if b == 0 {
                    return Err(LangError::runtime(token.info.clone(), "division by zero"));
                }
                self.push(a.wrapping_div(b));
                self.push(a.wrapping_rem(b));
            }
            Op::Increment => {
                let a = self.pop();
                self.push(a.wrapping_add(1));
            }
            Op::Decrement => {
                let a = self.pop();
                self.push(a.wrapping_sub(1));
            }

            // ---- comparisons ----
            Op::Eq | Op::Ne | Op::Gt | Op::Ge | Op::Lt | Op::Le => {
                let b = self.pop();
                let a = self.pop();
                let value = match token.op {
                    Op::Eq => a == b,
                    Op::Ne => a != b,
                    Op::Gt => a > b,
                    Op::Ge => a >= b,
                    Op::Lt => a < b,
                    _ => a <= b,
                };
                self.push(value as i64);
            }

            // ---- memory ----
            Op::Load => {
                let addr = self.pop();
                let value = self.load(token, addr, 1)?;
                self.push(value);
            }
            Op::Load16 => {
                let addr = self.pop();
                let value = self.load(token, addr, 2)?;
                self.push(value);
            }
            Op::Load32 => {
                let addr = self.pop();
                let value = self.load(token, addr, 4)?;
                self.push(value);
            }
            Op::Load64 => {
                let addr = self.pop();
                let value = self.load(token, addr, 8)?;
                self.push(value);
            }
            Op::Store => {
                let addr = self.pop();
                let value = self.pop();
                self.store(token, addr, value, 1)?;
            }
            Op::Store16 => {
                let addr = self.pop();
                let value = self.pop();
                self.store(token, addr, value, 2)?;
            }
            Op::Store32 => {
                let addr = self.pop();
                let value = self.pop();
                self.store(token, addr, value, 4)?;
            }
            Op::Store64 => {
                let addr = self.pop();
                let value = self.pop();
                self.store(token, addr, value, 8)?;
            }

            // ---- i/o & control ----
            Op::Dump => {
                let v = self.pop();
                writeln!(self.out, "{v}")
                    .map_err(|e| LangError::runtime(token.info.clone(), e.to_string()))?;
            }
            Op::Udump => {
                let v = self.pop() as u64;
                writeln!(self.out, "{v}")
                    .map_err(|e| LangError::runtime(token.info.clone(), e.to_string()))?;
            }
            Op::Cdump => {
                let v = self.pop();
                self.out
                    .write_all(&[v as u8])
                    .map_err(|e| LangError::runtime(token.info.clone(), e.to_string()))?;
            }
            Op::Hexdump => {
                let v = self.pop();
                writeln!(self.out, "0x{v:x}")
                    .map_err(|e| LangError::runtime(token.info.clone(), e.to_string()))?;
            }
            Op::Exit => {
                let code = self.pop();
                self.exited = true;
                return Ok(Step::Exit(code));
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
                let (number, args) = if reversed {
                    let mut popped = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        popped.push(self.pop());
                    }
                    popped.reverse();
                    (self.pop(), popped)
                } else {
                    let number = self.pop();
                    let mut popped = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        popped.push(self.pop());
                    }
                    (number, popped)
                };
                match self.dispatch_syscall(token, number, &args)? {
                    SysResult::Value(v) => self.push(v),
                    SysResult::Exit(code) => return Ok(Step::Exit(code)),
                }
            }

            // ---- flow ----
            Op::If | Op::While | Op::Label(_) | Op::Cast(_) => {}
            Op::Do => {
                let flow = token.flow();
                let root_op = &program.instructions[flow.root].op;
                match root_op {
                    Op::Let | Op::With => {}
                    _ => {
                        let condition = self.pop() != 0;
                        if !condition {
                            let opener = flow.prev.expect("do links to its opener");
                            let opener_flow = program.instructions[opener].flow();
                            let chain_end =
                                opener_flow.end.expect("resolved blocks know their end");
                            let target = if matches!(root_op, Op::While) {
                                // leave the loop: land just past its end
                                InsnIdx(chain_end.0 + 1)
                            } else {
                                match opener_flow.next {
                                    // land just past the elif/else, on the
                                    // next condition or branch body
                                    Some(next) => InsnIdx(next.0 + 1),
                                    None => chain_end,
                                }
                            };
                            return Ok(Self::jump(idx, target));
                        }
                    }
                }
            }
            Op::Elif | Op::Else => {
                // falling into the next branch marker: this branch is done
                let target = token.flow().end.expect("resolved blocks know their end");
                return Ok(Self::jump(idx, target));
            }
            Op::End => {
                let flow = token.flow();
                match program.instructions[flow.root].op {
                    Op::While => return Ok(Self::jump(idx, flow.root)),
                    Op::Let | Op::With => {
                        self.locals.pop();
                    }
                    Op::Proc => {
                        self.locals.pop();
                        let ret = self
                            .call_stack
                            .pop()
                            .expect("proc end is only reached through a call");
                        return Ok(Self::jump(idx, ret));
                    }
                    _ => {}
                }
            }
            Op::Let | Op::With => {
                let names = &token.flow().names;
                let mut frame = FxHashMap::default();
                for binding in names {
                    let value = self.pop();
                    frame.insert(binding.name, value);
                }
                self.locals.push(frame);
            }
            Op::Proc => {
                // definitions are skipped inline; the body runs via `call`
                let end = token.flow().end.expect("proc knows its end");
                return Ok(Self::jump(idx, InsnIdx(end.0 + 1)));
            }
            Op::Call(name) => {
                let proc = program
                    .procedure(*name)
                    .expect("calls are resolved during parsing");
                return Ok(self.enter_proc(proc, idx));
            }

            // consumed during parsing; never reach an engine
            Op::Macro | Op::In | Op::Out | Op::Memory | Op::Include => {
                unreachable!("`{}` is consumed during parsing", token.op.spelling())
            }
        }
        Ok(Step::Skip(0))
    }

    fn close(&mut self, _program: &Program) -> LangResult<()> {
        self.out
            .flush()
            .map_err(|e| LangError::runtime(slc_util::SourceInfo::dummy(), e.to_string()))
    }

    fn exited(&self) -> bool {
        self.exited
    }
}

/// Two-operand arithmetic; `None` on division by zero
fn binary_arith(op: &Op, a: i64, b: i64) -> Option<i64> {
    Some(match op {
        Op::Plus => a.wrapping_add(b),
        Op::Minus => a.wrapping_sub(b),
        Op::Mul => a.wrapping_mul(b),
        Op::Div => {
            if b == 0 {
                return None;
            }
            a.wrapping_div(b)
        }
        Op::Mod => {
            if b == 0 {
                return None;
            }
            a.wrapping_rem(b)
        }
        Op::Blsh => a.wrapping_shl(b as u32),
        Op::Brsh => a.wrapping_shr(b as u32),
        Op::Band => a & b,
        Op::Bor => a | b,
        Op::Bxor => a ^ b,
        _ => unreachable!("not a binary arithmetic op"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use slc_util::SourceMap;
    use std::path::PathBuf;

    /// Parse, type check and interpret; returns (stdout, exit code)
    fn run(source: &str) -> (String, i64) {
        run_with_args(source, Vec::new())
    }

    fn run_with_args(source: &str, args: Vec<String>) -> (String, i64) {
        let mut sources = SourceMap::new();
        let file_id = sources.add_file("test.sl", source);
        let program =
            Program::parse(file_id, PathBuf::from("test.sl"), Vec::new(), &mut sources)
                .expect("test source must parse");
        slc_sem::check(&program).expect("test source must type check");
        let mut engine = Interpreter::new(Vec::new());
        engine.set_args(args);
        let code = program.run(&mut engine).expect("test source must run");
        (String::from_utf8(engine.out).unwrap(), code)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("35 35 + 1 - dump 0 exit"), ("69\n".into(), 0));
        assert_eq!(run("1 2 + dump 0 exit"), ("3\n".into(), 0));
        assert_eq!(run("7 2 / dump 7 2 % dump 0 exit"), ("3\n1\n".into(), 0));
        assert_eq!(run("7 2 /% dump dump 0 exit"), ("1\n3\n".into(), 0));
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(run("41 1 + exit").1, 42);
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            run("if 1 2 > do 10 dump else 20 dump end 0 exit"),
            ("20\n".into(), 0)
        );
        assert_eq!(
            run("if 2 1 > do 10 dump else 20 dump end 0 exit"),
            ("10\n".into(), 0)
        );
    }

    #[test]
    fn test_elif_chain() {
        let source = "proc pick n int in \
                      if n 1 == do 111 dump elif n 2 == do 222 dump else 999 dump end \
                      end \
                      1 pick 2 pick 3 pick 0 exit";
        assert_eq!(run(source).0, "111\n222\n999\n");
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run("0 while dup 3 < do dup dump 1 + end drop 0 exit"),
            ("0\n1\n2\n".into(), 0)
        );
    }

    #[test]
    fn test_proc_square() {
        assert_eq!(
            run("proc square int in int out dup * end 5 square dump 0 exit"),
            ("25\n".into(), 0)
        );
    }

    #[test]
    fn test_proc_named_args() {
        // the first declared argument is popped first
        assert_eq!(
            run("proc pair a int b int in a dump b dump end 1 2 pair 0 exit"),
            ("2\n1\n".into(), 0)
        );
    }

    #[test]
    fn test_proc_recursion() {
        assert_eq!(
            run("proc fac n int in int out if n 1 > do n 1 - fac n * else 1 end end \
                 5 fac dump 0 exit"),
            ("120\n".into(), 0)
        );
    }

    #[test]
    fn test_macro_expansion_runs() {
        assert_eq!(run("macro six 1 5 + end six dump 0 exit"), ("6\n".into(), 0));
    }

    #[test]
    fn test_memory_store_load() {
        assert_eq!(
            run("memory cell 8 end 1337 cell !64 cell @64 dump 0 exit"),
            ("1337\n".into(), 0)
        );
        assert_eq!(
            run("memory buf 4 end 'x' buf ! buf @ cdump 0 exit"),
            ("x".into(), 0)
        );
    }

    #[test]
    fn test_memory_sizes_fold() {
        // an 8x8 byte grid: the last row starts at offset 56
        assert_eq!(
            run("memory grid 8 8 * end 7 grid 56 + !64 grid 56 + @64 dump 0 exit"),
            ("7\n".into(), 0)
        );
    }

    #[test]
    fn test_string_write_syscall() {
        // write(fd, buf, count): `syscall3` pops the number first, then
        // fd, buf and count from the top down
        assert_eq!(
            run("\"hi\\n\" 1 1 syscall3 drop 0 exit"),
            ("hi\n".into(), 0)
        );
        // the reversed variant takes the number below its arguments
        assert_eq!(
            run("1 1 \"hi\\n\" swap rsyscall3 drop 0 exit"),
            ("hi\n".into(), 0)
        );
    }

    #[test]
    fn test_unknown_syscall_is_enosys() {
        assert_eq!(run("9999 syscall dump 0 exit"), ("-38\n".into(), 0));
    }

    #[test]
    fn test_let_and_with() {
        // `let` binds ints as pointers; pointing it at a real region makes
        // the bound name dereferenceable
        assert_eq!(
            run("memory cell 8 end cell int let a do a @64 dump end 0 exit"),
            ("0\n".into(), 0)
        );
        assert_eq!(
            run("1 2 with a b do a dump b dump end 0 exit"),
            ("2\n1\n".into(), 0)
        );
    }

    #[test]
    fn test_dumps() {
        assert_eq!(run("-1 udump 0 exit").0, format!("{}\n", u64::MAX));
        assert_eq!(run("255 hexdump 0 exit").0, "0xff\n");
        assert_eq!(run("'A' cdump 0 exit").0, "A");
    }

    #[test]
    fn test_argc_argv() {
        let (out, code) = run_with_args(
            "argc dump argv @64 drop 0 exit",
            vec!["prog".into(), "x".into()],
        );
        assert_eq!(out, "2\n");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_not_exited_is_an_error() {
        let mut sources = SourceMap::new();
        let file_id = sources.add_file("test.sl", "1 drop");
        let program =
            Program::parse(file_id, PathBuf::from("test.sl"), Vec::new(), &mut sources).unwrap();
        let mut engine = Interpreter::new(Vec::new());
        let err = program.run(&mut engine).unwrap_err();
        assert_eq!(err.kind, slc_util::ErrorKind::InvalidSyntax);
        assert!(err.message.contains("not exited properly"));
    }

    #[test]
    fn test_division_by_zero() {
        let mut sources = SourceMap::new();
        let file_id = sources.add_file("test.sl", "1 0 / dump 0 exit");
        let program =
            Program::parse(file_id, PathBuf::from("test.sl"), Vec::new(), &mut sources).unwrap();
        let mut engine = Interpreter::new(Vec::new());
        let err = program.run(&mut engine).unwrap_err();
        assert_eq!(err.kind, slc_util::ErrorKind::RuntimeError);
    }
}
