//! Pushing, moving, and reading stack values.

use std::rc::Rc;

use apidemo_foundation::Result;
use apidemo_host::LuaState;

use super::{Args, Ret};

// =============================================================================
// Push
// =============================================================================

pub(super) fn push_boolean(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.push_boolean(args.int(0)? != 0);
    Ok(Ret::None)
}

pub(super) fn push_integer(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.push_integer(args.int(0)?);
    Ok(Ret::None)
}

pub(super) fn push_lstring(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.push_lstring(args.str(0)?, args.int(1)?);
    Ok(Ret::None)
}

pub(super) fn push_nil(state: &mut LuaState, _: &Args) -> Result<Ret> {
    state.push_nil();
    Ok(Ret::None)
}

pub(super) fn push_number(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.push_number(args.number(0)?);
    Ok(Ret::None)
}

pub(super) fn push_string(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.push_string(args.str(0)?);
    Ok(Ret::None)
}

pub(super) fn push_thread(state: &mut LuaState, _: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.push_thread()))
}

// =============================================================================
// Stack
// =============================================================================

pub(super) fn checkstack(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.checkstack(args.int(0)?)))
}

pub(super) fn gettop(state: &mut LuaState, _: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.gettop()))
}

pub(super) fn insert(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.insert(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn pop(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.pop(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn pushvalue(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.pushvalue(args.int(0)?);
    Ok(Ret::None)
}

pub(super) fn remove(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.remove(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn replace(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.replace(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn settop(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.settop(args.int(0)?)?;
    Ok(Ret::None)
}

// =============================================================================
// Predicates
// =============================================================================

pub(super) fn is_boolean(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_boolean(args.int(0)?)))
}

pub(super) fn is_function(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_function(args.int(0)?)))
}

pub(super) fn is_nil(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_nil(args.int(0)?)))
}

pub(super) fn is_none(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_none(args.int(0)?)))
}

pub(super) fn is_none_or_nil(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_none_or_nil(args.int(0)?)))
}

pub(super) fn is_number(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_number(args.int(0)?)))
}

pub(super) fn is_string(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_string(args.int(0)?)))
}

pub(super) fn is_table(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_table(args.int(0)?)))
}

pub(super) fn is_thread(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_thread(args.int(0)?)))
}

pub(super) fn is_userdata(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.is_userdata(args.int(0)?)))
}

// =============================================================================
// Conversions
// =============================================================================

pub(super) fn to_boolean(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.to_boolean(args.int(0)?)))
}

pub(super) fn to_integer(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.to_integer(args.int(0)?)))
}

pub(super) fn to_number(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Number(state.to_number(args.int(0)?)))
}

/// `lua_tostring` and `lua_tolstring`; the length out-parameter is dropped.
pub(super) fn to_string(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Str(state.to_lstring(args.int(0)?)))
}

pub(super) fn type_code(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.type_of(args.int(0)?).code()))
}

pub(super) fn typename(_: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Str(LuaState::typename(args.int(0)?).map(Rc::from)))
}

pub(super) fn type_name_at(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Str(Some(Rc::from(state.type_name_at(args.int(0)?)))))
}

// =============================================================================
// Optional arguments
// =============================================================================

pub(super) fn opt_integer(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Int(state.opt_integer(args.int(0)?, args.int(1)?)?))
}

pub(super) fn opt_number(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::Number(state.opt_number(args.int(0)?, args.number(1)?)?))
}

pub(super) fn opt_string(state: &mut LuaState, args: &Args) -> Result<Ret> {
    let narg = args.int(0)?;
    Ok(Ret::Str(Some(state.opt_string(narg, args.str(1)?)?)))
}
