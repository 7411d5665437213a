//! Operators, calls, errors, argument checks, and chunk loading.

use apidemo_foundation::{Error, LuaType, Result};
use apidemo_host::LuaState;

use super::{Args, Ret};

// =============================================================================
// Operators
// =============================================================================

pub(super) fn concat(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.concat(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn equal(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.equal(args.int(0)?, args.int(1)?)?))
}

pub(super) fn less_than(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.less_than(args.int(0)?, args.int(1)?)?))
}

pub(super) fn raw_equal(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.raw_equal(args.int(0)?, args.int(1)?)))
}

// =============================================================================
// Calls
// =============================================================================

pub(super) fn call(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.call(args.int(0)?, args.int(1)?)?;
    Ok(Ret::None)
}

pub(super) fn pcall(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.pcall(args.int(0)?, args.int(1)?, args.int(2)?)?))
}

pub(super) fn call_meta(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.call_meta(args.int(0)?, args.str(1)?)?))
}

// =============================================================================
// Errors and checks
// =============================================================================

/// Always fails with the value on top of the stack, which stays there.
pub(super) fn error(state: &mut LuaState, _: &Args) -> Result<Ret> {
    Err(state.error())
}

pub(super) fn aux_error(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Err(state.aux_error(args.str(0)?))
}

pub(super) fn arg_error(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Err(state.arg_error(args.int(0)?, args.str(1)?))
}

pub(super) fn check_any(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.check_any(args.int(0)?)?;
    Ok(Ret::None)
}

/// `luaL_checkint` and `luaL_checkinteger`.
pub(super) fn check_integer(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.check_integer(args.int(0)?)?))
}

pub(super) fn check_number(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Number(state.check_number(args.int(0)?)?))
}

pub(super) fn check_string(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Str(Some(state.check_string(args.int(0)?)?)))
}

pub(super) fn check_type(state: &mut LuaState, args: &Args) -> Result<Ret> {
    let narg = args.int(0)?;
    let code = args.int(1)?;
    let expected = LuaType::from_code(code)
        .ok_or_else(|| Error::runtime(format!("invalid type code {code}")))?;
    state.check_type(narg, expected)?;
    Ok(Ret::None)
}

// =============================================================================
// Loading
// =============================================================================

pub(super) fn do_file(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.do_file(args.str(0)?)?))
}

pub(super) fn do_string(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.do_string(args.str(0)?)?))
}

pub(super) fn load_file(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.load_file(args.str(0)?)))
}

pub(super) fn load_string(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.load_string(args.str(0)?)))
}
