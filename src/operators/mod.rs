//! The built-in operator set.
//!
//! Each submodule implements one family of operators from the Red Book
//! subset this interpreter supports. Every operator is a plain function
//! `fn(&mut Interpreter) -> OpResult` installed into `systemdict` under its
//! PostScript name; the interpreter invokes it when an executable name
//! resolves to the corresponding [`Builtin`](crate::object::Builtin).

use crate::error::OpResult;
use crate::interpreter::Interpreter;
use crate::object::{Builtin, Name, Object, PsDict};

mod arith;
mod composite;
mod control;
mod dict;
mod file;
mod logic;
mod misc;
pub(crate) mod stack;
mod typeops;
mod resource;

/// Install every built-in operator into `systemdict`.
pub(crate) fn install(systemdict: &PsDict) {
    type Entry = (&'static str, fn(&mut Interpreter) -> OpResult);
    const OPERATORS: &[Entry] = &[
        // Operand stack
        ("dup", stack::dup),
        ("pop", stack::pop),
        ("exch", stack::exch),
        ("copy", stack::copy),
        ("index", stack::index),
        ("roll", stack::roll),
        ("mark", stack::mark),
        ("cleartomark", stack::cleartomark),
        ("counttomark", stack::counttomark),
        ("count", stack::count),
        ("clear", stack::clear),
        // Arithmetic
        ("abs", arith::abs),
        ("add", arith::add),
        ("sub", arith::sub),
        ("mul", arith::mul),
        ("div", arith::div),
        ("idiv", arith::idiv),
        ("mod", arith::mod_),
        ("neg", arith::neg),
        ("ceiling", arith::ceiling),
        ("floor", arith::floor),
        ("round", arith::round),
        ("truncate", arith::truncate),
        ("sqrt", arith::sqrt),
        ("exp", arith::exp),
        ("ln", arith::ln),
        ("log", arith::log),
        ("sin", arith::sin),
        ("cos", arith::cos),
        ("atan", arith::atan),
        // Bitwise, logical and relational
        ("and", logic::and),
        ("or", logic::or),
        ("xor", logic::xor),
        ("not", logic::not),
        ("bitshift", logic::bitshift),
        ("eq", logic::eq),
        ("ne", logic::ne),
        ("lt", logic::lt),
        ("le", logic::le),
        ("gt", logic::gt),
        ("ge", logic::ge),
        // Types and conversion
        ("type", typeops::type_),
        ("cvi", typeops::cvi),
        ("cvr", typeops::cvr),
        ("cvx", typeops::cvx),
        ("cvn", typeops::cvn),
        ("cvs", typeops::cvs),
        // Composite objects
        ("array", composite::array),
        ("string", composite::string),
        ("length", composite::length),
        ("get", composite::get),
        ("put", composite::put),
        ("getinterval", composite::getinterval),
        ("putinterval", composite::putinterval),
        ("forall", composite::forall),
        ("aload", composite::aload),
        ("astore", composite::astore),
        ("[", stack::mark),
        ("]", composite::endarray),
        ("<<", stack::mark),
        (">>", composite::enddict),
        // Dictionaries
        ("dict", dict::dict),
        ("begin", dict::begin),
        ("end", dict::end),
        ("def", dict::def),
        ("known", dict::known),
        ("load", dict::load),
        ("where", dict::where_),
        ("currentdict", dict::currentdict),
        ("maxlength", dict::maxlength),
        // Control flow
        ("exec", control::exec),
        ("if", control::if_),
        ("ifelse", control::ifelse),
        ("for", control::for_),
        ("repeat", control::repeat),
        ("loop", control::loop_),
        ("exit", control::exit),
        ("stop", control::stop),
        // Resources and fonts
        ("findfont", resource::findfont),
        ("definefont", resource::definefont),
        ("findresource", resource::findresource),
        ("defineresource", resource::defineresource),
        // Files
        ("currentfile", file::currentfile),
        ("closefile", file::closefile),
        ("eexec", file::eexec),
        ("readstring", file::readstring),
        // Miscellany
        ("bind", misc::bind),
        ("executeonly", misc::executeonly),
        ("noaccess", misc::noaccess),
        ("readonly", misc::readonly),
        ("matrix", misc::matrix),
        ("internaldict", misc::internaldict),
        ("save", misc::save),
        ("restore", misc::restore),
    ];
    for (name, func) in OPERATORS {
        systemdict.insert(Name::new(*name), Object::Builtin(Builtin::new(name, *func)));
    }
}
