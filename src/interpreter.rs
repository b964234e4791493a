//! The PostScript interpreter core.
//!
//! A stack VM specialized for reading font programs. One [`Interpreter`]
//! instance corresponds to one PostScript execution environment: an operand
//! stack, a dictionary stack whose bottom three frames (`systemdict`, a
//! global dict, `userdict`) are permanent, an execution stack of active
//! scanners, and the resource registry that `definefont`/`defineresource`
//! populate.
//!
//! Token dispatch follows the Red Book: executable names resolve through the
//! dictionary stack top-to-bottom; `{ ... }` is a *scanning* mode that
//! accumulates tokens on the operand stack and wraps them into a procedure
//! at the matching `}`. Errors carry one of the standard kinds and are
//! routed through `errordict` before they become fatal.

use std::io::Read;

use crate::cmap::{self, CMapInfo};
use crate::encoding;
use crate::error::{ErrorKind, Error, Interrupted, OpResult, PostScriptError, Result, ps_error};
use crate::object::{Name, Object, PsArray, PsDict, PsString};
use crate::operators;
use crate::scanner::{DscComment, Scanner};

/// Operand stack depth limit.
pub const MAX_OPERAND_STACK: usize = 500;
/// Dictionary stack depth limit.
pub const MAX_DICT_STACK: usize = 20;
/// The three permanent bottom frames of the dictionary stack.
pub const MIN_DICT_STACK: usize = 3;
/// Nesting limit for procedure execution.
const MAX_EXEC_DEPTH: usize = 250;
/// Resolution limit for name-to-name definition chains.
const MAX_NAME_CHAIN: usize = 64;

/// A PostScript interpreter specialized for font programs.
///
/// The operand and dictionary stacks are public: callers that drive the
/// interpreter (the Type 1 builder, the CMap reader, tests) inspect them
/// directly after execution.
pub struct Interpreter {
    /// The operand stack, bottom first. Depth is capped at 500.
    pub operand_stack: Vec<Object>,
    /// The dictionary stack, bottom first: systemdict, globaldict, userdict,
    /// then whatever the program `begin`s.
    pub dict_stack: Vec<PsDict>,
    /// Captured `%%Key: value` comments from all executed input.
    pub dsc_comments: Vec<DscComment>,
    /// Execution budget: number of executed objects before a fatal
    /// `limitcheck`. Defaults to 1,000,000.
    pub max_ops: u64,
    /// When set, `execute` rejects input that does not start with `%!`.
    pub check_start: bool,

    exec_stack: Vec<Scanner>,
    proc_marks: Vec<usize>,
    resources: PsDict,
    errordict: PsDict,
    internal_dict: PsDict,
    exec_depth: usize,
    ops_used: u64,
    pub(crate) cmap_scratch: Option<CMapInfo>,
}

impl Interpreter {
    /// Create an interpreter with a preloaded `systemdict`, the standard
    /// resource categories (`Font`, `CMap`, `ProcSet` with `CIDInit`), and
    /// `StandardEncoding`.
    pub fn new() -> Self {
        let systemdict = PsDict::with_capacity(256);
        let globaldict = PsDict::with_capacity(16);
        let userdict = PsDict::with_capacity(64);
        let errordict = PsDict::with_capacity(32);
        let internal_dict = PsDict::with_capacity(16);
        let resources = PsDict::with_capacity(8);

        let font_directory = PsDict::with_capacity(16);
        let cmap_directory = PsDict::with_capacity(16);
        let procset_directory = PsDict::with_capacity(8);
        procset_directory.insert(Name::new("CIDInit"), Object::Dict(cmap::cidinit_procset()));
        resources.insert(Name::new("Font"), Object::Dict(font_directory.clone()));
        resources.insert(Name::new("CMap"), Object::Dict(cmap_directory));
        resources.insert(Name::new("ProcSet"), Object::Dict(procset_directory));

        operators::install(&systemdict);
        systemdict.insert(Name::new("true"), Object::Boolean(true));
        systemdict.insert(Name::new("false"), Object::Boolean(false));
        systemdict.insert(Name::new("null"), Object::Null);
        systemdict.insert(Name::new("systemdict"), Object::Dict(systemdict.clone()));
        systemdict.insert(Name::new("globaldict"), Object::Dict(globaldict.clone()));
        systemdict.insert(Name::new("userdict"), Object::Dict(userdict.clone()));
        systemdict.insert(Name::new("errordict"), Object::Dict(errordict.clone()));
        systemdict.insert(Name::new("FontDirectory"), Object::Dict(font_directory));
        systemdict.insert(Name::new("StandardEncoding"), encoding::standard_encoding_object());

        Interpreter {
            operand_stack: Vec::new(),
            dict_stack: vec![systemdict, globaldict, userdict],
            dsc_comments: Vec::new(),
            max_ops: 1_000_000,
            check_start: false,
            exec_stack: Vec::new(),
            proc_marks: Vec::new(),
            resources,
            errordict,
            internal_dict,
            exec_depth: 0,
            ops_used: 0,
            cmap_scratch: None,
        }
    }

    // ------------------------------------------------------------------
    // Public entry points
    // ------------------------------------------------------------------

    /// Execute a PostScript program from a reader.
    pub fn execute<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.execute_bytes(data)
    }

    /// Execute a PostScript program from an in-memory buffer.
    pub fn execute_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        if self.check_start && !data.starts_with(b"%!") {
            return Err(Error::Interpreter(PostScriptError::new(
                ErrorKind::SyntaxError,
                "input does not start with %!",
            )));
        }
        self.exec_stack.push(Scanner::new(data));
        let outcome = self.run_current_scanner();
        let mut scanner = self.exec_stack.pop().expect("scanner still active");
        self.dsc_comments.append(&mut scanner.take_dsc_comments());
        let unterminated = !self.proc_marks.is_empty();
        self.proc_marks.clear();
        match outcome {
            Ok(()) if unterminated => Err(Error::Interpreter(PostScriptError::new(
                ErrorKind::SyntaxError,
                "end of input inside { ... }",
            ))),
            Ok(()) => Ok(()),
            // `stop` that reaches the top level ends execution cleanly.
            Err(Interrupted::Stop) => Ok(()),
            Err(Interrupted::Exit) => Err(Error::Interpreter(PostScriptError::new(
                ErrorKind::InvalidExit,
                "exit outside of a loop",
            ))),
            Err(Interrupted::Error(e)) => Err(Error::Interpreter(e)),
        }
    }

    /// Execute a PostScript program given as text.
    pub fn execute_string(&mut self, program: &str) -> Result<()> {
        self.execute_bytes(program.as_bytes().to_vec())
    }

    /// The `Font` resource category (`FontDirectory`).
    pub fn font_directory(&self) -> PsDict {
        self.resource_category("Font").expect("Font category")
    }

    /// The `CMap` resource category.
    pub fn cmap_directory(&self) -> PsDict {
        self.resource_category("CMap").expect("CMap category")
    }

    /// Look up a resource category dictionary by name.
    pub fn resource_category(&self, category: &str) -> Option<PsDict> {
        match self.resources.get(category) {
            Some(Object::Dict(d)) => Some(d),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Execution engine
    // ------------------------------------------------------------------

    /// Pump tokens out of the innermost scanner until end of input.
    fn run_current_scanner(&mut self) -> std::result::Result<(), Interrupted> {
        loop {
            let token = {
                let scanner = self.exec_stack.last_mut().expect("active scanner");
                scanner.next_token()
            };
            match token {
                Err(e) => self.handle_interrupt(Interrupted::Error(e))?,
                Ok(None) => return Ok(()),
                Ok(Some(obj)) => match self.execute_token(obj) {
                    Ok(()) => {}
                    Err(int) => self.handle_interrupt(int)?,
                },
            }
        }
    }

    /// Route an interrupt through `errordict`; sentinels and unhandled
    /// errors propagate to the caller.
    fn handle_interrupt(&mut self, int: Interrupted) -> std::result::Result<(), Interrupted> {
        let err = match int {
            Interrupted::Error(e) => e,
            sentinel => return Err(sentinel),
        };
        // A blown execution budget is always fatal; routing it through a
        // user handler would let the program keep running.
        if self.ops_used > self.max_ops {
            return Err(Interrupted::Error(err));
        }
        match self.errordict.get(err.kind.name()) {
            Some(Object::Procedure(handler)) => {
                log::debug!("errordict handler invoked for {}", err.kind);
                match self.run_procedure(&handler) {
                    Ok(()) => Ok(()),
                    Err(Interrupted::Stop) => Ok(()),
                    Err(other) => Err(other),
                }
            }
            _ => Err(Interrupted::Error(err)),
        }
    }

    /// Execute one token delivered by the scanner.
    fn execute_token(&mut self, obj: Object) -> OpResult {
        self.count_op()?;
        if !self.proc_marks.is_empty() {
            // Inside { ... }: tokens accumulate instead of executing.
            if let Object::Operator(name) = &obj {
                match name.as_str() {
                    "{" => {
                        self.proc_marks.push(self.operand_stack.len());
                        return Ok(());
                    }
                    "}" => {
                        let start = self.proc_marks.pop().expect("open procedure");
                        let elems = self.operand_stack.split_off(start);
                        return self.push(Object::Procedure(PsArray::new(elems)));
                    }
                    _ => {}
                }
            }
            return self.push(obj);
        }
        match obj {
            Object::Operator(name) => match name.as_str() {
                "{" => {
                    self.proc_marks.push(self.operand_stack.len());
                    Ok(())
                }
                "}" => Err(ps_error(ErrorKind::SyntaxError, "unmatched }")),
                _ => self.execute_name(&name),
            },
            other => self.push(other),
        }
    }

    /// Execute one object from a procedure body (or via `exec`).
    pub(crate) fn execute_object(&mut self, obj: Object) -> OpResult {
        self.count_op()?;
        match obj {
            Object::Operator(name) => self.execute_name(&name),
            Object::Builtin(b) => b.call(self),
            // Composite executable objects encountered as data are pushed;
            // only `exec` and the control operators invoke them.
            other => self.push(other),
        }
    }

    /// Resolve and execute an executable name.
    fn execute_name(&mut self, name: &Name) -> OpResult {
        let mut key = name.clone();
        for _ in 0..MAX_NAME_CHAIN {
            match self.lookup(key.as_str()) {
                None => {
                    return Err(ps_error(
                        ErrorKind::Undefined,
                        format!("undefined: {}", key),
                    ))
                }
                Some(Object::Builtin(b)) => return b.call(self),
                Some(Object::Procedure(p)) => return self.run_procedure(&p),
                Some(Object::Operator(next)) => key = next,
                Some(other) => return self.push(other),
            }
        }
        Err(ps_error(
            ErrorKind::ExecStackOverflow,
            format!("name resolution chain too deep: {}", name),
        ))
    }

    /// Execute every element of a procedure in order.
    pub(crate) fn run_procedure(&mut self, proc: &PsArray) -> OpResult {
        if self.exec_depth >= MAX_EXEC_DEPTH {
            return Err(ps_error(
                ErrorKind::ExecStackOverflow,
                "procedure nesting too deep",
            ));
        }
        self.exec_depth += 1;
        let mut result = Ok(());
        for i in 0..proc.len() {
            let obj = proc.get(i).expect("procedure element");
            result = self.execute_object(obj);
            if result.is_err() {
                break;
            }
        }
        self.exec_depth -= 1;
        result
    }

    /// Charge one executed object against the budget.
    pub(crate) fn count_op(&mut self) -> OpResult {
        self.ops_used += 1;
        if self.ops_used > self.max_ops {
            return Err(ps_error(
                ErrorKind::LimitCheck,
                format!("execution budget of {} operations exhausted", self.max_ops),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stack and dictionary plumbing for operators
    // ------------------------------------------------------------------

    /// Push with the 500-deep operand stack limit.
    pub(crate) fn push(&mut self, obj: Object) -> OpResult {
        if self.operand_stack.len() >= MAX_OPERAND_STACK {
            return Err(ps_error(ErrorKind::StackOverflow, "operand stack overflow"));
        }
        self.operand_stack.push(obj);
        Ok(())
    }

    /// Pop any object.
    pub(crate) fn pop_any(&mut self, op: &str) -> std::result::Result<Object, Interrupted> {
        self.operand_stack
            .pop()
            .ok_or_else(|| ps_error(ErrorKind::StackUnderflow, format!("{}: operand stack empty", op)))
    }

    /// Pop an integer.
    pub(crate) fn pop_integer(&mut self, op: &str) -> std::result::Result<i64, Interrupted> {
        match self.pop_any(op)? {
            Object::Integer(i) => Ok(i),
            other => Err(self.type_error(op, "integer", &other)),
        }
    }

    /// Pop a number, promoting Integer to Real.
    pub(crate) fn pop_number(&mut self, op: &str) -> std::result::Result<f64, Interrupted> {
        let obj = self.pop_any(op)?;
        obj.as_number().ok_or_else(|| self.type_error(op, "number", &obj))
    }

    /// Pop a boolean.
    pub(crate) fn pop_bool(&mut self, op: &str) -> std::result::Result<bool, Interrupted> {
        match self.pop_any(op)? {
            Object::Boolean(b) => Ok(b),
            other => Err(self.type_error(op, "boolean", &other)),
        }
    }

    /// Pop a string.
    pub(crate) fn pop_string(&mut self, op: &str) -> std::result::Result<PsString, Interrupted> {
        match self.pop_any(op)? {
            Object::String(s) => Ok(s),
            other => Err(self.type_error(op, "string", &other)),
        }
    }

    /// Pop an array or procedure view.
    pub(crate) fn pop_array(&mut self, op: &str) -> std::result::Result<PsArray, Interrupted> {
        match self.pop_any(op)? {
            Object::Array(a) | Object::Procedure(a) => Ok(a),
            other => Err(self.type_error(op, "array", &other)),
        }
    }

    /// Pop a procedure.
    pub(crate) fn pop_procedure(&mut self, op: &str) -> std::result::Result<PsArray, Interrupted> {
        match self.pop_any(op)? {
            Object::Procedure(p) => Ok(p),
            other => Err(self.type_error(op, "procedure", &other)),
        }
    }

    /// Pop a dictionary.
    pub(crate) fn pop_dict(&mut self, op: &str) -> std::result::Result<PsDict, Interrupted> {
        match self.pop_any(op)? {
            Object::Dict(d) => Ok(d),
            other => Err(self.type_error(op, "dict", &other)),
        }
    }

    /// Pop a dictionary key: a name, executable name, or string.
    pub(crate) fn pop_key(&mut self, op: &str) -> std::result::Result<Name, Interrupted> {
        match self.pop_any(op)? {
            Object::Name(n) | Object::Operator(n) => Ok(n),
            Object::String(s) => Ok(Name::new(s.to_utf8_lossy())),
            other => Err(self.type_error(op, "name", &other)),
        }
    }

    /// Build a `typecheck` interrupt for a mismatched operand.
    pub(crate) fn type_error(&self, op: &str, expected: &str, got: &Object) -> Interrupted {
        ps_error(
            ErrorKind::TypeCheck,
            format!("{}: expected {}, got {}", op, expected, got.type_name()),
        )
    }

    /// Look a key up across the dictionary stack, top to bottom.
    pub(crate) fn lookup(&self, key: &str) -> Option<Object> {
        for dict in self.dict_stack.iter().rev() {
            if let Some(obj) = dict.get(key) {
                return Some(obj);
            }
        }
        None
    }

    /// The dictionary on top of the dictionary stack.
    pub(crate) fn current_dict(&self) -> PsDict {
        self.dict_stack.last().expect("dict stack floor").clone()
    }

    /// `errordict`, the dictionary consulted for error handlers. Shared
    /// with executing programs through systemdict.
    pub fn errordict(&self) -> PsDict {
        self.errordict.clone()
    }

    /// The passcode-protected internal dictionary.
    pub(crate) fn internal_dict(&self) -> PsDict {
        self.internal_dict.clone()
    }

    /// The category registry behind `defineresource`/`findresource`.
    pub(crate) fn resources(&self) -> PsDict {
        self.resources.clone()
    }

    /// The scanner currently feeding the interpreter.
    pub(crate) fn current_scanner(&mut self) -> std::result::Result<&mut Scanner, Interrupted> {
        self.exec_stack
            .last_mut()
            .ok_or_else(|| ps_error(ErrorKind::IoError, "no input file is active"))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
