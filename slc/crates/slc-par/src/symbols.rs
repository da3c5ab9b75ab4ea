//! Symbol-table entries: macros, procedures, memory regions.
//!
//! All three kinds share one namespace. Macro and memory bodies are raw
//! token lists lifted out of the instruction list when their region closes;
//! procedures keep their body inline in the instruction list and record the
//! index range.

use slc_util::{LangError, LangResult, SourceInfo, Symbol};

use crate::op::Op;
use crate::token::{Binding, InsnIdx, Token};
use crate::types::TypeDesc;

/// One entry of the program symbol table
#[derive(Clone, Debug)]
pub enum SymbolDef {
    Macro(MacroDef),
    Proc(Procedure),
    Memory(MemoryDef),
}

impl SymbolDef {
    /// The defining location, for redefinition diagnostics
    pub fn info(&self) -> &SourceInfo {
        match self {
            SymbolDef::Macro(m) => &m.info,
            SymbolDef::Proc(p) => &p.info,
            SymbolDef::Memory(m) => &m.info,
        }
    }
}

/// A named token sequence, spliced in wherever the name appears
#[derive(Clone, Debug)]
pub struct MacroDef {
    pub name: Symbol,
    pub info: SourceInfo,
    pub body: Vec<Token>,
}

/// A named byte region; the body is a compile-time expression for its size
#[derive(Clone, Debug)]
pub struct MemoryDef {
    pub name: Symbol,
    pub info: SourceInfo,
    pub body: Vec<Token>,
}

/// One procedure argument: named arguments bind as locals inside the body,
/// anonymous ones are stack inputs at body entry
#[derive(Clone, Debug)]
pub struct ProcArg {
    pub name: Option<Binding>,
    pub ty: TypeDesc,
    pub info: SourceInfo,
}

/// One declared procedure output
#[derive(Clone, Debug)]
pub struct ProcOut {
    pub ty: TypeDesc,
    pub info: SourceInfo,
}

/// A fully resolved procedure
#[derive(Clone, Debug)]
pub struct Procedure {
    pub name: Symbol,
    /// Location of the `proc` opener
    pub info: SourceInfo,
    pub ins: Vec<ProcArg>,
    pub outs: Vec<ProcOut>,
    /// Index of the `proc` opener in the instruction list
    pub opener: InsnIdx,
    /// Body range (first body token .. the closing `end`, exclusive)
    pub body_start: InsnIdx,
    /// The closing `end`
    pub end: InsnIdx,
}

/// Validate and assemble a procedure from its header regions.
///
/// `args` is the region between the name and `in`: a mix of `word CAST`
/// pairs (named arguments) and bare `CAST`s (anonymous stack inputs).
/// `outs` is the region between `in` and `out`: `CAST`s only.
pub fn procedure_factory(
    opener: &Token,
    name: Symbol,
    args: &[Token],
    outs: &[Token],
    body_start: InsnIdx,
    end: InsnIdx,
) -> LangResult<Procedure> {
    let mut ins = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(tok) = iter.next() {
        match &tok.op {
            Op::Cast(ty) => ins.push(ProcArg {
                name: None,
                ty: ty.clone(),
                info: tok.info.clone(),
            }),
            Op::Word(arg_name) => {
                let Some(Op::Cast(ty)) = iter.peek().map(|t| &t.op) else {
                    return Err(LangError::invalid_syntax(
                        tok.info.clone(),
                        "invalid procedure argument syntax: a named argument needs a type",
                    ));
                };
                ins.push(ProcArg {
                    name: Some(Binding {
                        name: *arg_name,
                        info: tok.info.clone(),
                    }),
                    ty: ty.clone(),
                    info: tok.info.clone(),
                });
                iter.next();
            }
            _ => {
                return Err(LangError::invalid_syntax(
                    tok.info.clone(),
                    "invalid procedure argument syntax",
                ));
            }
        }
    }

    let mut out_types = Vec::new();
    for tok in outs {
        let Op::Cast(ty) = &tok.op else {
            return Err(LangError::invalid_syntax(
                tok.info.clone(),
                "invalid procedure return syntax",
            ));
        };
        out_types.push(ProcOut {
            ty: ty.clone(),
            info: tok.info.clone(),
        });
    }

    Ok(Procedure {
        name,
        info: opener.info.clone(),
        ins,
        outs: out_types,
        opener: opener.position,
        body_start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use slc_util::Span;

    fn tok(op: Op) -> Token {
        Token::new(op, SourceInfo::new(Span::DUMMY))
    }

    #[test]
    fn test_named_and_anonymous_args() {
        let opener = tok(Op::Proc);
        let args = vec![
            tok(Op::Word(Symbol::intern("n"))),
            tok(Op::Cast(TypeDesc::Int)),
            tok(Op::Cast(TypeDesc::Char.ptr_to())),
        ];
        let outs = vec![tok(Op::Cast(TypeDesc::Int))];
        let proc = procedure_factory(
            &opener,
            Symbol::intern("f"),
            &args,
            &outs,
            InsnIdx(1),
            InsnIdx(3),
        )
        .unwrap();
        assert_eq!(proc.ins.len(), 2);
        assert!(proc.ins[0].name.is_some());
        assert_eq!(proc.ins[0].ty, TypeDesc::Int);
        assert!(proc.ins[1].name.is_none());
        assert_eq!(proc.outs.len(), 1);
    }

    #[test]
    fn test_named_arg_without_type() {
        let opener = tok(Op::Proc);
        let args = vec![tok(Op::Word(Symbol::intern("n")))];
        let err = procedure_factory(&opener, Symbol::intern("f"), &args, &[], InsnIdx(1), InsnIdx(2))
            .unwrap_err();
        assert_eq!(err.kind, slc_util::ErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_bad_out_region() {
        let opener = tok(Op::Proc);
        let outs = vec![tok(Op::Push(1))];
        let err = procedure_factory(&opener, Symbol::intern("f"), &[], &outs, InsnIdx(1), InsnIdx(2))
            .unwrap_err();
        assert_eq!(err.kind, slc_util::ErrorKind::InvalidSyntax);
    }
}
